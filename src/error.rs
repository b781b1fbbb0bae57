//! Error type shared by the scan pipeline.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Everything that can go wrong outside the UI thread's own bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serial port {port}: {source}")]
    Serial {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("no serial port could be opened (tried: {tried})")]
    NoSerialPort { tried: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} contains no samples")]
    EmptyDataset(PathBuf),
}
