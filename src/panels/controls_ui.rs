//! Right-hand control strip: Load Raw Data, Resume Live, Z-range lock, status.

use egui::{Color32, Ui};
use egui_phosphor::regular::{ARROW_CLOCKWISE, CAMERA, FOLDER_OPEN, LOCK};

use crate::data::scan_state::{ButtonAvailability, ScanState};

/// What the operator asked for this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    LoadRaw,
    ResumeLive,
    SaveSnapshot,
    LockZ { lo: f64, hi: f64 },
    UnlockZ,
}

/// Connection/status text shown under the buttons.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    pub link: String,
    pub message: Option<(String, bool)>,
}

impl StatusLine {
    pub fn info<S: Into<String>>(&mut self, text: S) {
        self.message = Some((text.into(), false));
    }

    pub fn error<S: Into<String>>(&mut self, text: S) {
        self.message = Some((text.into(), true));
    }
}

pub struct ControlsPanel {
    lock_lo: f64,
    lock_hi: f64,
    locked: bool,
}

impl ControlsPanel {
    pub const LOAD_RAW_LABEL: &'static str = "Load Raw Data";
    pub const RESUME_LIVE_LABEL: &'static str = "Resume Live";

    pub fn new(default_z: [f64; 2]) -> Self {
        Self {
            lock_lo: default_z[0],
            lock_hi: default_z[1],
            locked: false,
        }
    }

    pub fn render_panel(
        &mut self,
        ui: &mut Ui,
        state: ScanState,
        availability: ButtonAvailability,
        status: &StatusLine,
    ) -> Vec<ControlAction> {
        let mut actions = Vec::new();
        let button_size = egui::vec2(ui.available_width(), 36.0);

        ui.heading("System Controls");
        ui.separator();

        let load = egui::Button::new(format!("{FOLDER_OPEN} {}", Self::LOAD_RAW_LABEL)).min_size(button_size);
        if ui.add_enabled(availability.load_raw, load).clicked() {
            actions.push(ControlAction::LoadRaw);
        }
        let resume = egui::Button::new(format!("{ARROW_CLOCKWISE} {}", Self::RESUME_LIVE_LABEL)).min_size(button_size);
        if ui.add_enabled(availability.resume_live, resume).clicked() {
            actions.push(ControlAction::ResumeLive);
        }
        if ui
            .add(egui::Button::new(format!("{CAMERA} Save Snapshot")).min_size(button_size))
            .clicked()
        {
            actions.push(ControlAction::SaveSnapshot);
        }

        ui.separator();
        ui.add_enabled_ui(state != ScanState::Active, |ui| {
            if ui.checkbox(&mut self.locked, format!("{LOCK} Lock Z range")).changed() {
                actions.push(if self.locked {
                    ControlAction::LockZ {
                        lo: self.lock_lo,
                        hi: self.lock_hi,
                    }
                } else {
                    ControlAction::UnlockZ
                });
            }
            ui.add_enabled_ui(self.locked, |ui| {
                let mut changed = false;
                ui.horizontal(|ui| {
                    ui.label("Z min");
                    changed |= ui.add(egui::DragValue::new(&mut self.lock_lo).speed(0.001)).changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Z max");
                    changed |= ui.add(egui::DragValue::new(&mut self.lock_hi).speed(0.001)).changed();
                });
                if changed && self.locked {
                    actions.push(ControlAction::LockZ {
                        lo: self.lock_lo,
                        hi: self.lock_hi,
                    });
                }
            });
        });

        ui.separator();
        ui.label(format!("State: {}", state_label(state)));
        ui.label(&status.link);
        if let Some((text, is_error)) = &status.message {
            let color = if *is_error { Color32::LIGHT_RED } else { ui.visuals().text_color() };
            ui.colored_label(color, text);
        }

        actions
    }
}

fn state_label(state: ScanState) -> &'static str {
    match state {
        ScanState::Idle => "idle",
        ScanState::Active => "scanning",
        ScanState::Paused => "viewing loaded scan",
    }
}
