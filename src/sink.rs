//! Channel between the serial reader thread and the UI thread.
//!
//! The reader only ever sends; the UI drains the receiver at the start of
//! each frame and is the only place that touches scan state.

use std::sync::mpsc::{Receiver, SendError, Sender};

use crate::data::sample::ScanLine;

/// Messages sent from the reader thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanCommand {
    /// A port was opened.
    Connected { port: String },
    /// One parsed line.
    Line(ScanLine),
    /// The port was lost or could not be opened.
    Disconnected { reason: String },
}

/// Sending half, owned by the reader thread.
#[derive(Clone)]
pub struct ScanSink {
    tx: Sender<ScanCommand>,
}

impl ScanSink {
    pub fn send_line(&self, line: ScanLine) -> Result<(), SendError<ScanCommand>> {
        self.tx.send(ScanCommand::Line(line))
    }

    pub fn connected<S: Into<String>>(&self, port: S) -> Result<(), SendError<ScanCommand>> {
        self.tx.send(ScanCommand::Connected { port: port.into() })
    }

    pub fn disconnected<S: Into<String>>(&self, reason: S) -> Result<(), SendError<ScanCommand>> {
        self.tx.send(ScanCommand::Disconnected {
            reason: reason.into(),
        })
    }
}

/// Create a new channel pair: `(ScanSink, Receiver<ScanCommand>)`.
pub fn channel_scan() -> (ScanSink, Receiver<ScanCommand>) {
    let (tx, rx) = std::sync::mpsc::channel();
    (ScanSink { tx }, rx)
}
