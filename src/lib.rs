//! scanplot crate root: re-exports and module wiring.
//!
//! A live viewer for a serial particle scanner built on egui/eframe:
//! - `serial`: background reader that turns port lines into [`ScanLine`]s
//! - `sink`: channel between the reader thread and the UI
//! - `data`: samples, the scan buffer and the scan lifecycle state machine
//! - `render`: heat-map rasterisation, colormap and the 3D projection
//! - `persistence`: `raw_*.csv` files and PNG snapshots
//! - `panels` / `app`: the egui UI and [`run_scanplot`]

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod panels;
pub mod persistence;
pub mod render;
pub mod serial;
pub mod sink;

pub use app::{run_scanplot, ScanApp};
pub use config::{DisplayConfig, ScanConfig, ScanPolicy, SerialConfig};
pub use data::sample::{Sample, ScanLine};
pub use data::scan_state::{ScanOutcome, ScanState, ScanStateController};
pub use error::{Result, ScanError};
pub use sink::{channel_scan, ScanCommand, ScanSink};
