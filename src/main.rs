use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scanplot::{channel_scan, run_scanplot, ScanConfig};

/// Live viewer for serial particle scans.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port to try first.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Directory for raw CSV files and snapshots.
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Background reference image.
    #[arg(long)]
    reference_image: Option<PathBuf>,

    /// Heat-map cells per side.
    #[arg(long)]
    grid_size: Option<usize>,
}

impl Args {
    fn into_config(self) -> ScanConfig {
        let mut config = match &self.config {
            Some(path) => match ScanConfig::load(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("{e}; using defaults");
                    ScanConfig::default()
                }
            },
            None => ScanConfig::default(),
        };
        if self.port.is_some() {
            config.serial.port = self.port;
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if self.raw_dir.is_some() {
            config.raw_dir = self.raw_dir;
        }
        if self.reference_image.is_some() {
            config.display.reference_image = self.reference_image;
        }
        if let Some(n) = self.grid_size {
            config.display.grid_size = n;
        }
        config
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config();
    tracing::info!(raw_dir = %config.raw_dir().display(), "starting scan viewer");

    let (sink, rx) = channel_scan();
    if let Err(e) = scanplot::serial::spawn_reader(config.serial.clone(), sink) {
        tracing::error!("could not start serial reader: {e}");
    }

    run_scanplot(rx, config)
}
