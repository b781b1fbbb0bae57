//! Serial line reader.
//!
//! A background thread opens the scanner's port, reads `x,y,z[,name]` lines
//! and forwards them through a [`ScanSink`]. It never touches UI state. When
//! the port goes away it reports the disconnect and retries; when the UI has
//! dropped the receiver it exits.

use std::io::{self, BufRead, BufReader};
use std::thread::JoinHandle;

use crate::config::SerialConfig;
use crate::data::sample::ScanLine;
use crate::error::{Result, ScanError};
use crate::sink::ScanSink;

/// Why [`SerialLineReader::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEnd {
    /// The UI side of the channel is gone; the thread should exit.
    ReceiverGone,
    /// The link failed; the thread may reconnect.
    Disconnected(String),
}

/// Reads newline-delimited scan lines from any byte source.
pub struct SerialLineReader<R> {
    reader: R,
    port: String,
    skipped: u64,
}

impl<R: BufRead> SerialLineReader<R> {
    pub fn new<S: Into<String>>(reader: R, port: S) -> Self {
        Self {
            reader,
            port: port.into(),
            skipped: 0,
        }
    }

    /// Number of malformed lines dropped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Forward lines until the source ends, fails, or the receiver is dropped.
    ///
    /// Read timeouts are not failures: the scanner is silent between scans.
    pub fn run(&mut self, sink: &ScanSink) -> ReadEnd {
        let mut buf = Vec::with_capacity(64);
        loop {
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    return ReadEnd::Disconnected(format!("{}: end of stream", self.port));
                }
                Ok(_) => {
                    let at_eof = buf.last() != Some(&b'\n');
                    if !self.forward(&buf, sink) {
                        return ReadEnd::ReceiverGone;
                    }
                    buf.clear();
                    if at_eof {
                        return ReadEnd::Disconnected(format!("{}: end of stream", self.port));
                    }
                }
                // Partial bytes stay in `buf` and are completed by the next read.
                Err(e) if is_transient(&e) => continue,
                Err(e) => return ReadEnd::Disconnected(format!("{}: {e}", self.port)),
            }
        }
    }

    /// Returns `false` when the receiver is gone.
    fn forward(&mut self, raw: &[u8], sink: &ScanSink) -> bool {
        let text = String::from_utf8_lossy(raw);
        match ScanLine::parse(&text) {
            Some(line) => sink.send_line(line).is_ok(),
            None => {
                if !text.trim().is_empty() {
                    self.skipped += 1;
                    tracing::debug!(port = %self.port, line = %text.trim(), skipped = self.skipped, "malformed line skipped");
                }
                true
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Ports to try, in order, without duplicates.
pub fn candidate_ports(config: &SerialConfig, discovered: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let all = config
        .port
        .iter()
        .cloned()
        .chain(SerialConfig::FALLBACK_PORTS.iter().map(|s| s.to_string()))
        .chain(discovered.iter().cloned());
    for p in all {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

/// Open the first candidate port that works.
pub fn open_port(config: &SerialConfig) -> Result<(String, Box<dyn serialport::SerialPort>)> {
    let discovered: Vec<String> = match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            tracing::debug!("port enumeration failed: {e}");
            Vec::new()
        }
    };
    let candidates = candidate_ports(config, &discovered);
    for name in &candidates {
        match serialport::new(name.as_str(), config.baud_rate)
            .timeout(config.read_timeout())
            .open()
        {
            Ok(port) => {
                tracing::info!(port = %name, baud = config.baud_rate, "serial port opened");
                return Ok((name.clone(), port));
            }
            Err(source) => {
                let err = ScanError::Serial {
                    port: name.clone(),
                    source,
                };
                if config.port.as_deref() == Some(name.as_str()) {
                    tracing::warn!("{err}");
                } else {
                    tracing::trace!("{err}");
                }
            }
        }
    }
    Err(ScanError::NoSerialPort {
        tried: candidates.join(", "),
    })
}

/// Start the reader thread. It lives until the receiver is dropped.
pub fn spawn_reader(config: SerialConfig, sink: ScanSink) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("serial-reader".to_string())
        .spawn(move || reader_loop(&config, &sink))
}

fn reader_loop(config: &SerialConfig, sink: &ScanSink) {
    let mut reported_missing = false;
    loop {
        match open_port(config) {
            Ok((name, port)) => {
                reported_missing = false;
                if sink.connected(name.as_str()).is_err() {
                    return;
                }
                let mut reader = SerialLineReader::new(BufReader::new(port), name);
                match reader.run(sink) {
                    ReadEnd::ReceiverGone => return,
                    ReadEnd::Disconnected(reason) => {
                        tracing::warn!(%reason, "serial link lost");
                        if sink.disconnected(reason).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                if !reported_missing {
                    tracing::warn!("{e}");
                    reported_missing = true;
                    if sink.disconnected(e.to_string()).is_err() {
                        return;
                    }
                }
            }
        }
        std::thread::sleep(config.reconnect_interval());
    }
}
