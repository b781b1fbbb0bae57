//! Scan lifecycle state machine.
//!
//! [`ScanStateController`] is the only owner of the [`ScanBuffer`]. The UI
//! thread feeds it samples drained from the reader channel and operator
//! actions; it records what happened as [`ScanOutcome`]s which the app
//! takes once per frame and acts on (persisting, snapshots, status text).

use std::time::Instant;

use crate::config::ScanPolicy;
use crate::data::extent::ScanExtent;
use crate::data::sample::{Sample, ScanLine};
use crate::data::scan_buffer::ScanBuffer;
use crate::persistence::LoadedScan;

/// Where the viewer is in the scan lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// No scan running; the last finished scan (if any) stays on screen.
    #[default]
    Idle,
    /// Between a start marker and an end marker.
    Active,
    /// Live updates suspended while a loaded file is shown.
    Paused,
}

/// Enabled state of the two operator controls, derived from [`ScanState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonAvailability {
    pub load_raw: bool,
    pub resume_live: bool,
}

impl ButtonAvailability {
    pub fn for_state(state: ScanState) -> Self {
        let enabled = state != ScanState::Active;
        Self {
            load_raw: enabled,
            resume_live: enabled,
        }
    }
}

/// A scan handed over for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedScan {
    pub name: String,
    pub samples: Vec<Sample>,
}

/// Something the app has to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Started { name: String },
    /// End marker reached; persist data and snapshot.
    Completed(FinishedScan),
    /// Scan cut short; persist whatever arrived.
    Aborted { scan: FinishedScan, reason: String },
    /// Display cleared and back to live mode.
    ResumedLive,
    /// A saved scan is on screen.
    Loaded { name: String },
}

/// What the renderer should draw.
pub enum DisplaySource<'a> {
    Live {
        name: Option<&'a str>,
        samples: &'a [Sample],
        extent: i32,
    },
    Loaded(&'a LoadedScan),
}

pub struct ScanStateController {
    state: ScanState,
    buffer: ScanBuffer,
    extent: ScanExtent,
    policy: ScanPolicy,
    scan_name: Option<String>,
    /// Whether `scan_name` came from the scanner rather than the clock.
    named_by_scanner: bool,
    /// Last clock-generated name and how often it has been reused.
    last_stamp: Option<(String, u32)>,
    loaded: Option<LoadedScan>,
    last_sample_at: Option<Instant>,
    ignored: u64,
    outcomes: Vec<ScanOutcome>,
    redraw: bool,
}

impl ScanStateController {
    pub fn new(policy: ScanPolicy) -> Self {
        Self {
            state: ScanState::Idle,
            buffer: ScanBuffer::with_tolerance(policy.end_tolerance),
            extent: ScanExtent::new(&policy),
            policy,
            scan_name: None,
            named_by_scanner: false,
            last_stamp: None,
            loaded: None,
            last_sample_at: None,
            ignored: 0,
            outcomes: Vec::new(),
            redraw: true,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn availability(&self) -> ButtonAvailability {
        ButtonAvailability::for_state(self.state)
    }

    pub fn is_live_paused(&self) -> bool {
        self.state == ScanState::Paused
    }

    pub fn buffer(&self) -> &ScanBuffer {
        &self.buffer
    }

    pub fn extent(&self) -> i32 {
        self.extent.size()
    }

    pub fn scan_name(&self) -> Option<&str> {
        self.scan_name.as_deref()
    }

    pub fn loaded(&self) -> Option<&LoadedScan> {
        self.loaded.as_ref()
    }

    pub fn display_source(&self) -> DisplaySource<'_> {
        match (&self.loaded, self.state) {
            (Some(scan), ScanState::Paused) => DisplaySource::Loaded(scan),
            _ => DisplaySource::Live {
                name: self.scan_name.as_deref(),
                samples: self.buffer.samples(),
                extent: self.extent.size(),
            },
        }
    }

    /// Outcomes recorded since the last call.
    pub fn take_outcomes(&mut self) -> Vec<ScanOutcome> {
        std::mem::take(&mut self.outcomes)
    }

    /// Whether a finished or aborted scan is waiting in the outcomes.
    ///
    /// The app stops feeding lines until it has taken the outcomes, so the
    /// snapshot of a finished scan is drawn before the next scan resets
    /// the buffer.
    pub fn has_finished_scan(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, ScanOutcome::Completed(_) | ScanOutcome::Aborted { .. }))
    }

    /// Whether something changed that needs a redraw; clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw, false)
    }

    // ── Reader input ─────────────────────────────────────────────────────────

    pub fn on_line(&mut self, line: ScanLine, now: Instant) {
        let ScanLine { sample, name } = line;

        if sample.is_start_marker() {
            if self.state == ScanState::Paused {
                tracing::info!("start marker while viewing a loaded scan; resuming live");
                self.resume_live();
            } else if self.state == ScanState::Active {
                self.abort("new start marker before end of scan");
            }
            self.last_sample_at = Some(now);
            self.start_scan(name);
            return;
        }

        if self.state != ScanState::Active {
            self.ignored += 1;
            tracing::debug!(state = ?self.state, x = sample.x, y = sample.y, ignored = self.ignored, "sample outside a scan ignored");
            return;
        }

        self.last_sample_at = Some(now);
        if let (false, Some(name)) = (self.named_by_scanner, name) {
            tracing::info!(%name, "scan named by scanner");
            self.scan_name = Some(name);
            self.named_by_scanner = true;
        }

        self.buffer.append(sample);
        self.redraw = true;

        if self.is_end_marker(&sample) {
            self.extent.settle(sample.x);
            self.finish();
        } else {
            self.extent.observe(sample.x, sample.y);
        }
    }

    /// The serial link failed or went away.
    pub fn on_link_error(&mut self, reason: &str) {
        if self.state == ScanState::Active {
            self.abort(reason);
        }
    }

    /// Abort an active scan that has been silent for longer than the policy allows.
    pub fn check_timeout(&mut self, now: Instant) {
        if self.state != ScanState::Active {
            return;
        }
        let Some(last) = self.last_sample_at else {
            return;
        };
        let timeout = self.policy.data_timeout();
        if now.saturating_duration_since(last) >= timeout {
            self.abort(&format!("no data for {:.1}s", timeout.as_secs_f64()));
        }
    }

    // ── Operator actions ─────────────────────────────────────────────────────

    /// Clear everything and go back to live mode.
    pub fn resume_live(&mut self) {
        if self.state == ScanState::Active {
            self.abort("resumed live during scan");
        }
        self.buffer.reset();
        self.extent.reset();
        self.scan_name = None;
        self.loaded = None;
        self.state = ScanState::Idle;
        self.redraw = true;
        self.outcomes.push(ScanOutcome::ResumedLive);
    }

    /// Show a saved scan. Refused while a scan is running.
    pub fn load_raw(&mut self, scan: LoadedScan) -> bool {
        if self.state == ScanState::Active {
            tracing::warn!(name = %scan.name, "load refused during active scan");
            return false;
        }
        let name = scan.name.clone();
        self.loaded = Some(scan);
        self.state = ScanState::Paused;
        self.redraw = true;
        self.outcomes.push(ScanOutcome::Loaded { name });
        true
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    fn start_scan(&mut self, name: Option<String>) {
        self.named_by_scanner = name.is_some();
        let name = match name {
            Some(name) => name,
            None => self.timestamp_name(),
        };
        tracing::info!(%name, "scan started");
        self.buffer.reset();
        self.extent.reset();
        self.loaded = None;
        self.scan_name = Some(name.clone());
        self.state = ScanState::Active;
        self.redraw = true;
        self.outcomes.push(ScanOutcome::Started { name });
    }

    /// `%Y%m%d_%H%M%S`, suffixed `_2`, `_3`, ... when several scans start
    /// within the same second, so their files do not overwrite each other.
    fn timestamp_name(&mut self) -> String {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        if let Some((last, repeats)) = &mut self.last_stamp {
            if *last == stamp {
                *repeats += 1;
                return format!("{stamp}_{}", *repeats + 1);
            }
        }
        self.last_stamp = Some((stamp.clone(), 0));
        stamp
    }

    /// A diagonal point at the far corner of a scan that has enough data.
    fn is_end_marker(&self, s: &Sample) -> bool {
        let tolerance = self.buffer.end_tolerance();
        self.buffer.detect_end(s.x, s.y)
            && self.buffer.len() > self.policy.min_end_samples
            && self.extent.is_far_corner(s.x, tolerance)
    }

    fn finish(&mut self) {
        let scan = self.take_scan();
        tracing::info!(name = %scan.name, samples = scan.samples.len(), "scan completed");
        self.state = ScanState::Idle;
        self.redraw = true;
        self.outcomes.push(ScanOutcome::Completed(scan));
    }

    fn abort(&mut self, reason: &str) {
        let scan = self.take_scan();
        tracing::warn!(name = %scan.name, samples = scan.samples.len(), reason, "scan aborted");
        self.state = ScanState::Idle;
        self.redraw = true;
        self.outcomes.push(ScanOutcome::Aborted {
            scan,
            reason: reason.to_string(),
        });
    }

    fn take_scan(&self) -> FinishedScan {
        FinishedScan {
            name: self.scan_name.clone().unwrap_or_default(),
            samples: self.buffer.snapshot(),
        }
    }
}
