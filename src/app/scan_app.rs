//! The eframe application: drains the reader channel, drives the scan state
//! machine and lays out the view and controls.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use eframe::egui;

use crate::config::ScanConfig;
use crate::data::scan_buffer::z_bounds;
use crate::data::scan_state::{FinishedScan, ScanOutcome, ScanStateController};
use crate::data::z_range::ZRange;
use crate::panels::{ControlAction, ControlsPanel, ScanView, StatusLine};
use crate::persistence::{load_raw_scan, save_raw_scan, save_snapshot, snapshot_path};
use crate::render::load_reference_image;
use crate::sink::ScanCommand;

/// Upper bound on lines handled per frame so a flood cannot stall the UI.
const MAX_LINES_PER_FRAME: usize = 5_000;

pub struct ScanApp {
    rx: Receiver<ScanCommand>,
    link_open: bool,
    controller: ScanStateController,
    z_range: ZRange,
    view: ScanView,
    controls: ControlsPanel,
    status: StatusLine,
    raw_dir: PathBuf,
    mismatch_threshold: u32,
}

impl ScanApp {
    pub fn new(rx: Receiver<ScanCommand>, config: &ScanConfig) -> Self {
        let reference = load_reference_image(config.display.reference_image.as_deref());
        Self {
            rx,
            link_open: true,
            controller: ScanStateController::new(config.policy.clone()),
            z_range: ZRange::new(config.display.default_z_range),
            view: ScanView::new(config.display.grid_size, reference),
            controls: ControlsPanel::new(config.display.default_z_range),
            status: StatusLine {
                link: "Waiting for serial port…".to_string(),
                message: None,
            },
            raw_dir: config.raw_dir(),
            mismatch_threshold: config.policy.mismatch_threshold,
        }
    }

    pub fn controller(&self) -> &ScanStateController {
        &self.controller
    }

    /// Feed queued reader commands to the controller.
    ///
    /// Stops early once a scan has finished or been aborted, so the frame
    /// that captures its snapshot still shows it. Returns the number of
    /// commands handled.
    pub fn drain_reader(&mut self) -> usize {
        let mut handled = 0;
        while self.link_open && handled < MAX_LINES_PER_FRAME && !self.controller.has_finished_scan() {
            let command = match self.rx.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!("serial reader thread has exited");
                    self.status.link = "Serial reader stopped".to_string();
                    self.controller.on_link_error("serial reader stopped");
                    self.link_open = false;
                    break;
                }
            };
            handled += 1;
            match command {
                ScanCommand::Line(line) => self.controller.on_line(line, Instant::now()),
                ScanCommand::Connected { port } => {
                    self.status.link = format!("Connected: {port}");
                }
                ScanCommand::Disconnected { reason } => {
                    self.status.link = format!("Disconnected: {reason}");
                    self.controller.on_link_error(&reason);
                }
            }
        }
        handled
    }

    /// Act on what the controller recorded: persist finished scans, reset
    /// or fit the Z range, update the status line.
    ///
    /// Returns the snapshot paths of the scans saved this frame.
    pub fn process_outcomes(&mut self) -> Vec<PathBuf> {
        let mut snapshots = Vec::new();
        for outcome in self.controller.take_outcomes() {
            match outcome {
                ScanOutcome::Started { name } => {
                    self.z_range.reset();
                    self.status.info(format!("Scanning {name}"));
                }
                ScanOutcome::Completed(scan) => {
                    snapshots.extend(self.persist(&scan));
                    self.status.info(format!("Scan {} complete ({} samples)", scan.name, scan.samples.len()));
                }
                ScanOutcome::Aborted { scan, reason } => {
                    snapshots.extend(self.persist(&scan));
                    self.status.error(format!("Scan {} aborted: {reason}", scan.name));
                }
                ScanOutcome::ResumedLive => {
                    self.z_range.reset();
                    self.view.clear();
                    self.status.info("Live mode");
                }
                ScanOutcome::Loaded { name } => {
                    if let Some((lo, hi)) = self.controller.loaded().and_then(|s| z_bounds(&s.samples)) {
                        self.z_range.fit(lo, hi);
                    }
                    self.status.info(format!("Showing {name}"));
                }
            }
        }
        snapshots
    }

    /// Write the raw CSV. Returns where its snapshot goes.
    fn persist(&mut self, scan: &FinishedScan) -> Option<PathBuf> {
        if scan.samples.is_empty() {
            return None;
        }
        match save_raw_scan(&self.raw_dir, &scan.name, &scan.samples) {
            Ok(_) => Some(snapshot_path(&self.raw_dir, &scan.name)),
            Err(e) => {
                tracing::error!(name = %scan.name, "saving raw scan failed: {e}");
                self.status.error(format!("Could not save {}: {e}", scan.name));
                None
            }
        }
    }

    fn load_raw_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_directory(&self.raw_dir)
            .add_filter("Raw scan", &["csv"])
            .pick_file()
        else {
            return;
        };
        match load_raw_scan(&path, self.mismatch_threshold) {
            Ok(scan) => {
                if !self.controller.load_raw(scan) {
                    self.status.error("Cannot load while a scan is running");
                }
            }
            Err(e) => {
                tracing::error!(path = %path.display(), "loading raw scan failed: {e}");
                self.status.error(format!("Load failed: {e}"));
            }
        }
    }

    fn apply_actions(&mut self, ctx: &egui::Context, actions: Vec<ControlAction>) {
        for action in actions {
            match action {
                ControlAction::LoadRaw => self.load_raw_dialog(),
                ControlAction::ResumeLive => self.controller.resume_live(),
                ControlAction::SaveSnapshot => {
                    let name = self
                        .controller
                        .scan_name()
                        .map(str::to_string)
                        .or_else(|| self.controller.loaded().map(|s| s.name.clone()))
                        .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
                    request_snapshot(ctx, snapshot_path(&self.raw_dir, &name));
                }
                ControlAction::LockZ { lo, hi } => {
                    self.z_range.lock(lo, hi);
                    self.force_refresh(ctx);
                }
                ControlAction::UnlockZ => {
                    self.z_range.unlock();
                    self.force_refresh(ctx);
                }
            }
        }
    }

    fn force_refresh(&mut self, ctx: &egui::Context) {
        self.view.refresh(ctx, self.controller.display_source(), &mut self.z_range);
    }

    /// Save every screenshot that arrived this frame to the path it was
    /// requested for.
    fn handle_screenshots(&mut self, ctx: &egui::Context) {
        let shots: Vec<_> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Screenshot { image, user_data, .. } => {
                        let path = user_data.data.as_ref()?.downcast_ref::<PathBuf>()?;
                        Some((path.clone(), image.clone()))
                    }
                    _ => None,
                })
                .collect()
        });
        for (path, image) in shots {
            match save_snapshot(&path, &image) {
                Ok(()) => self.status.info(format!("Snapshot saved to {}", path.display())),
                Err(e) => {
                    tracing::error!(path = %path.display(), "saving snapshot failed: {e}");
                    self.status.error(format!("Snapshot failed: {e}"));
                }
            }
        }
    }
}

/// Capture the window at the end of this frame; the image comes back
/// tagged with `path`.
fn request_snapshot(ctx: &egui::Context, path: PathBuf) {
    ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::new(path)));
}

impl eframe::App for ScanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_screenshots(ctx);

        self.drain_reader();
        self.controller.check_timeout(Instant::now());
        let snapshots = self.process_outcomes();

        if self.controller.take_redraw() {
            self.force_refresh(ctx);
        }

        let state = self.controller.state();
        let availability = self.controller.availability();
        let mut actions = Vec::new();
        egui::SidePanel::right("controls")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                actions = self.controls.render_panel(ui, state, availability, &self.status);
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.view.show(ui, &self.z_range);
        });

        // The view was refreshed above, so the capture shows the finished scan.
        for path in snapshots {
            request_snapshot(ctx, path);
        }
        self.apply_actions(ctx, actions);

        ctx.request_repaint_after(Duration::from_millis(50));
    }
}
