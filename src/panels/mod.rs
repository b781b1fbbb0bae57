pub mod controls_ui;
pub mod scan_view;

pub use controls_ui::{ControlAction, ControlsPanel, StatusLine};
pub use scan_view::ScanView;
