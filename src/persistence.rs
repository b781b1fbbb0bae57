//! Raw scan files: `raw_<name>.csv` with an `x,y,z` header, plus a PNG
//! snapshot `<name>.png` in the same directory.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::extent::assumed_square_dimension;
use crate::data::sample::Sample;
use crate::error::{Result, ScanError};

pub const RAW_PREFIX: &str = "raw_";

/// Scan name without a leading `raw_`.
pub fn display_name(name: &str) -> &str {
    name.strip_prefix(RAW_PREFIX).unwrap_or(name)
}

/// `<dir>/raw_<name>.csv`; the prefix is not doubled.
pub fn raw_csv_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{RAW_PREFIX}{}.csv", display_name(name)))
}

/// `<dir>/<name>.png`, next to the raw CSV.
pub fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.png", display_name(name)))
}

#[derive(Serialize)]
struct RawRow {
    x: i32,
    y: i32,
    z: f64,
}

/// Write samples as CSV with an `x,y,z` header.
pub fn write_raw_csv<W: Write>(writer: W, samples: &[Sample]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    if samples.is_empty() {
        w.write_record(["x", "y", "z"])?;
    }
    for s in samples {
        w.serialize(RawRow {
            x: s.x,
            y: s.y,
            z: s.z,
        })?;
    }
    w.flush()?;
    Ok(())
}

/// Persist a scan to `raw_<name>.csv` under `dir`, creating `dir` if needed.
pub fn save_raw_scan(dir: &Path, name: &str, samples: &[Sample]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = raw_csv_path(dir, name);
    let file = std::fs::File::create(&path)?;
    write_raw_csv(std::io::BufWriter::new(file), samples)?;
    tracing::info!(path = %path.display(), samples = samples.len(), "raw scan saved");
    Ok(path)
}

/// Save an RGBA screenshot as PNG.
pub fn save_snapshot(path: &Path, image: &egui::ColorImage) -> Result<()> {
    let [w, h] = image.size;
    let mut out = image::RgbaImage::new(w as u32, h as u32);
    for (i, p) in image.pixels.iter().enumerate() {
        let (x, y) = ((i % w) as u32, (i / w) as u32);
        out.put_pixel(x, y, image::Rgba([p.r(), p.g(), p.b(), p.a()]));
    }
    out.save(path)?;
    tracing::info!(path = %path.display(), "snapshot saved");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Column-wise view of a raw file. Columns may differ in length when rows
/// are damaged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawColumns {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub zs: Vec<f64>,
}

impl RawColumns {
    /// Cut all columns to the shortest one.
    pub fn truncate_to_shortest(&mut self) -> usize {
        let n = self.xs.len().min(self.ys.len()).min(self.zs.len());
        if self.xs.len() != n || self.ys.len() != n || self.zs.len() != n {
            tracing::warn!(
                xs = self.xs.len(),
                ys = self.ys.len(),
                zs = self.zs.len(),
                kept = n,
                "column length mismatch; truncating"
            );
        }
        self.xs.truncate(n);
        self.ys.truncate(n);
        self.zs.truncate(n);
        n
    }

    pub fn into_samples(mut self) -> Vec<Sample> {
        self.truncate_to_shortest();
        self.xs
            .iter()
            .zip(&self.ys)
            .zip(&self.zs)
            .map(|((x, y), z)| Sample::new(x.round() as i32, y.round() as i32, *z))
            .collect()
    }
}

/// Read the three leading columns; unparsable cells are skipped per column.
pub fn read_raw_columns<R: Read>(reader: R) -> Result<RawColumns> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut cols = RawColumns::default();
    for record in rdr.records() {
        let record = record?;
        for (i, col) in [&mut cols.xs, &mut cols.ys, &mut cols.zs].into_iter().enumerate() {
            if let Some(v) = record.get(i).and_then(|c| c.parse::<f64>().ok()) {
                if v.is_finite() {
                    col.push(v);
                }
            }
        }
    }
    Ok(cols)
}

/// A saved scan ready to display.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedScan {
    /// File stem without the `raw_` prefix.
    pub name: String,
    pub path: PathBuf,
    pub samples: Vec<Sample>,
    /// Square side length assumed when scaling to the display grid.
    pub dimension: u32,
}

impl LoadedScan {
    pub fn from_samples(name: String, path: PathBuf, samples: Vec<Sample>, mismatch_threshold: u32) -> Self {
        let (mx, my) = samples
            .iter()
            .fold((0i32, 0i32), |(mx, my), s| (mx.max(s.x), my.max(s.y)));
        let dimension = assumed_square_dimension(mx.max(0) as u32, my.max(0) as u32, mismatch_threshold);
        tracing::debug!(x_extent = mx, y_extent = my, dimension, "loaded scan dimensions");
        Self {
            name,
            path,
            samples,
            dimension,
        }
    }
}

/// Load a `raw_*.csv` file.
pub fn load_raw_scan(path: &Path, mismatch_threshold: u32) -> Result<LoadedScan> {
    let file = std::fs::File::open(path)?;
    let samples = read_raw_columns(std::io::BufReader::new(file))?.into_samples();
    if samples.is_empty() {
        return Err(ScanError::EmptyDataset(path.to_path_buf()));
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = display_name(&stem).to_string();
    tracing::info!(path = %path.display(), samples = samples.len(), "raw scan loaded");
    Ok(LoadedScan::from_samples(name, path.to_path_buf(), samples, mismatch_threshold))
}
