//! Configuration for the scan viewer.
//!
//! Every field has a default so a partial JSON file is enough; command-line
//! flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

// ─────────────────────────────────────────────────────────────────────────────
// Serial link
// ─────────────────────────────────────────────────────────────────────────────

/// Serial link settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Preferred port. Tried before the built-in candidates.
    pub port: Option<String>,
    /// Baud rate of the scanner.
    pub baud_rate: u32,
    /// Read timeout of a single `read_line`, in milliseconds.
    pub read_timeout_ms: u64,
    /// Pause between reconnect attempts, in milliseconds.
    pub reconnect_interval_ms: u64,
}

impl SerialConfig {
    /// Ports tried when the preferred port is missing or fails.
    pub const FALLBACK_PORTS: [&'static str; 4] =
        ["/dev/ttyUSB0", "/dev/ttyUSB1", "/dev/ttyACM0", "/dev/ttyACM1"];

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 115_200,
            read_timeout_ms: 1_000,
            reconnect_interval_ms: 2_000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scan lifecycle policy
// ─────────────────────────────────────────────────────────────────────────────

/// Tunables of the scan state machine.
///
/// These values have no physical derivation; they were picked to tolerate
/// rounding noise of the scanner firmware.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanPolicy {
    /// Maximum `|x - y|` for a sample to count as an end marker.
    pub end_tolerance: i32,
    /// Scan size drawn at the start of every scan, before data or the end
    /// corner says otherwise.
    pub initial_extent: i32,
    /// Upper clamp for the auto-detected scan size.
    pub max_extent: i32,
    /// Extent growth step (the detected size is rounded up to a multiple of
    /// it). Also the smallest scan an end corner is accepted for.
    pub extent_step: i32,
    /// Samples a scan must hold before a diagonal point can end it.
    pub min_end_samples: usize,
    /// Loaded scans whose X and Y extents differ by at most this are averaged.
    pub mismatch_threshold: u32,
    /// Abort an active scan after this long without a sample, in milliseconds.
    pub data_timeout_ms: u64,
}

impl ScanPolicy {
    pub fn data_timeout(&self) -> Duration {
        Duration::from_millis(self.data_timeout_ms)
    }
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            end_tolerance: 1,
            initial_extent: 100,
            max_extent: 300,
            extent_step: 50,
            min_end_samples: 50,
            mismatch_threshold: 5,
            data_timeout_ms: 5_000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display
// ─────────────────────────────────────────────────────────────────────────────

/// Display settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Cells per side of the rasterised heat map.
    pub grid_size: usize,
    /// Background reference image; a placeholder is drawn when it cannot be read.
    pub reference_image: Option<PathBuf>,
    /// Default Z range shown before any data arrives.
    pub default_z_range: [f64; 2],
    /// Window title.
    pub title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            grid_size: 80,
            reference_image: None,
            default_z_range: [-0.1, 0.1],
            title: "Particle Scan Viewer".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScanConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
///
/// | Field     | Purpose |
/// |-----------|---------|
/// | `serial`  | Port, baud rate and reconnect behaviour |
/// | `policy`  | Scan start/end detection and timeouts |
/// | `display` | Grid resolution, reference image, window title |
/// | `raw_dir` | Where raw scans and snapshots are written |
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub serial: SerialConfig,
    pub policy: ScanPolicy,
    pub display: DisplayConfig,
    /// Directory for `raw_*.csv` files and PNG snapshots. Defaults to the
    /// working directory.
    pub raw_dir: Option<PathBuf>,
}

impl ScanConfig {
    /// Read a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| ScanError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(|source| ScanError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Effective raw-data directory.
    pub fn raw_dir(&self) -> PathBuf {
        self.raw_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
