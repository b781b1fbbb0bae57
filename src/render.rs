//! Rasterising scans onto the fixed display grid.
//!
//! Everything here is independent of egui's frame loop so it can be unit
//! tested; the panels in [`crate::panels`] only hand the results to
//! `egui_plot`.

use std::path::Path;

use egui::{Color32, ColorImage};

use crate::data::sample::Sample;
use crate::data::z_range::ZRange;
use crate::error::Result;

/// Side length of the square display coordinate space.
pub const DISPLAY_EXTENT: f64 = 100.0;

/// Where the reference image sits in display coordinates: `[x0, x1, y0, y1]`.
pub const REFERENCE_RECT: [f64; 4] = [16.0, 84.0, 40.0, 60.0];

/// Opacity of the reference image behind the heat map.
pub const REFERENCE_ALPHA: f32 = 0.08;

/// Scan units → display units. A zero dimension means no scaling.
pub fn display_scale(dimension: f64) -> f64 {
    if dimension > 0.0 && dimension.is_finite() {
        DISPLAY_EXTENT / dimension
    } else {
        1.0
    }
}

/// Tick label in scan units for a display-space coordinate.
pub fn tick_label(display_value: f64, dimension: f64) -> String {
    let v = display_value / display_scale(dimension);
    format!("{}", v.round() as i64)
}

// ─────────────────────────────────────────────────────────────────────────────
// Heat grid
// ─────────────────────────────────────────────────────────────────────────────

/// Square grid of cell means over the display space. Row 0 is the bottom (y = 0).
#[derive(Debug, Clone, PartialEq)]
pub struct HeatGrid {
    size: usize,
    cells: Vec<Option<f64>>,
}

impl HeatGrid {
    /// Average samples into `grid_size`×`grid_size` cells.
    ///
    /// Coordinates are scaled by `100 / dimension`; samples beyond the
    /// dimension or below zero are dropped.
    pub fn rasterize(samples: &[Sample], dimension: f64, grid_size: usize) -> Self {
        let size = grid_size.max(1);
        let scale = display_scale(dimension);
        let limit = if dimension > 0.0 { dimension } else { f64::INFINITY };
        let mut sums = vec![(0.0f64, 0u32); size * size];

        for s in samples {
            let (x, y) = (f64::from(s.x), f64::from(s.y));
            if x < 0.0 || y < 0.0 || x > limit || y > limit || !s.z.is_finite() {
                continue;
            }
            let col = cell_index(x * scale, size);
            let row = cell_index(y * scale, size);
            let cell = &mut sums[row * size + col];
            cell.0 += s.z;
            cell.1 += 1;
        }

        let cells = sums
            .into_iter()
            .map(|(sum, n)| (n > 0).then(|| sum / f64::from(n)))
            .collect();
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        self.cells.get(row * self.size + col).copied().flatten()
    }

    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Display-space centre of a cell.
    pub fn cell_center(&self, index: usize) -> f64 {
        (index as f64 + 0.5) * DISPLAY_EXTENT / self.size as f64
    }

    /// RGBA image, top row first, empty cells transparent.
    pub fn to_color_image(&self, z: &ZRange, alpha: u8) -> ColorImage {
        let mut rgba = Vec::with_capacity(self.size * self.size * 4);
        for row in (0..self.size).rev() {
            for col in 0..self.size {
                match self.get(col, row) {
                    Some(v) => {
                        let c = jet(z.normalize(v));
                        rgba.extend_from_slice(&[c.r(), c.g(), c.b(), alpha]);
                    }
                    None => rgba.extend_from_slice(&[0, 0, 0, 0]),
                }
            }
        }
        ColorImage::from_rgba_unmultiplied([self.size, self.size], &rgba)
    }
}

fn cell_index(display: f64, size: usize) -> usize {
    let i = (display / DISPLAY_EXTENT * size as f64).floor();
    (i.max(0.0) as usize).min(size - 1)
}

/// The "jet" colormap: blue → cyan → yellow → red over `0..=1`.
pub fn jet(t: f64) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let channel = |offset: f64| ((1.5 - (4.0 * t - offset).abs()).clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(channel(3.0), channel(2.0), channel(1.0))
}

// ─────────────────────────────────────────────────────────────────────────────
// 3D projection
// ─────────────────────────────────────────────────────────────────────────────

/// Camera for the oblique 3D view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAngles {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    /// Height of the full Z range relative to the 100-unit base.
    pub z_height: f64,
}

impl Default for ViewAngles {
    fn default() -> Self {
        Self {
            elevation_deg: 20.0,
            azimuth_deg: 300.0,
            z_height: 70.0,
        }
    }
}

impl ViewAngles {
    /// Project a display-space point with normalised height `h` (0..=1) to 2D.
    pub fn project(&self, x: f64, y: f64, h: f64) -> [f64; 2] {
        let half = DISPLAY_EXTENT / 2.0;
        let (xc, yc) = (x - half, y - half);
        let (sa, ca) = self.azimuth_deg.to_radians().sin_cos();
        let (se, ce) = self.elevation_deg.to_radians().sin_cos();
        let rx = xc * ca - yc * sa;
        let ry = xc * sa + yc * ca;
        let zz = (h - 0.5) * self.z_height;
        [rx, ry * se + zz * ce]
    }
}

/// One polyline of the 3D wireframe.
#[derive(Debug, Clone, PartialEq)]
pub struct WireLine {
    pub points: Vec<[f64; 2]>,
    pub color: Color32,
}

/// Row and column polylines of the grid, every `stride` cells.
///
/// Empty cells split a line into segments. Each segment is coloured by its
/// mean height.
pub fn wireframe(grid: &HeatGrid, z: &ZRange, view: &ViewAngles, stride: usize) -> Vec<WireLine> {
    let n = grid.size();
    let stride = stride.max(1);
    let mut lines = Vec::new();

    let mut push_run = |run: &mut Vec<([f64; 2], f64)>| {
        if run.len() >= 2 {
            let mean = run.iter().map(|(_, h)| h).sum::<f64>() / run.len() as f64;
            lines.push(WireLine {
                points: run.iter().map(|(p, _)| *p).collect(),
                color: jet(mean),
            });
        }
        run.clear();
    };

    for fixed in (0..n).step_by(stride) {
        for along_rows in [true, false] {
            let mut run: Vec<([f64; 2], f64)> = Vec::new();
            for i in 0..n {
                let (col, row) = if along_rows { (i, fixed) } else { (fixed, i) };
                match grid.get(col, row) {
                    Some(v) => {
                        let h = z.normalize(v);
                        let p = view.project(grid.cell_center(col), grid.cell_center(row), h);
                        run.push((p, h));
                    }
                    None => push_run(&mut run),
                }
            }
            push_run(&mut run);
        }
    }
    lines
}

/// Outline of the 3D base square and the vertical axis at the origin.
pub fn frame_lines(view: &ViewAngles) -> Vec<Vec<[f64; 2]>> {
    let e = DISPLAY_EXTENT;
    let base = vec![
        view.project(0.0, 0.0, 0.0),
        view.project(e, 0.0, 0.0),
        view.project(e, e, 0.0),
        view.project(0.0, e, 0.0),
        view.project(0.0, 0.0, 0.0),
    ];
    let axis = vec![view.project(0.0, 0.0, 0.0), view.project(0.0, 0.0, 1.0)];
    vec![base, axis]
}

// ─────────────────────────────────────────────────────────────────────────────
// Reference image
// ─────────────────────────────────────────────────────────────────────────────

/// Grey square shown when no reference image is available.
pub fn placeholder_image() -> ColorImage {
    ColorImage::from_rgba_unmultiplied([100, 100], &[128, 128, 128, 255].repeat(100 * 100))
}

fn read_image(path: &Path) -> Result<ColorImage> {
    let img = image::open(path)?.to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, img.as_raw()))
}

/// Load the background reference image, falling back to a placeholder.
pub fn load_reference_image(path: Option<&Path>) -> ColorImage {
    let Some(path) = path else {
        return placeholder_image();
    };
    match read_image(path) {
        Ok(img) => {
            tracing::info!(path = %path.display(), "reference image loaded");
            img
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "reference image unavailable, using placeholder: {e}");
            placeholder_image()
        }
    }
}
