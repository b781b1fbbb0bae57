//! Central panel: 2D heat map and 3D wireframe of the displayed scan.

use egui::{Color32, TextureHandle, TextureOptions, Ui};
use egui_plot::{Line, Plot, PlotImage, PlotPoint, Text};

use crate::data::scan_buffer::z_bounds;
use crate::data::scan_state::DisplaySource;
use crate::data::z_range::ZRange;
use crate::persistence::display_name;
use crate::render::{
    frame_lines, tick_label, wireframe, HeatGrid, ViewAngles, WireLine, DISPLAY_EXTENT,
    REFERENCE_ALPHA, REFERENCE_RECT,
};

/// Heat-map opacity.
const HEAT_ALPHA: u8 = 230;
/// Wireframe lines drawn per axis at most.
const MAX_WIRES: usize = 40;

pub struct ScanView {
    grid_size: usize,
    view: ViewAngles,
    reference_image: Option<egui::ColorImage>,
    reference: Option<TextureHandle>,
    heat: Option<TextureHandle>,
    wires: Vec<WireLine>,
    headline: String,
    dimension: f64,
    /// Actual min/max of the displayed data.
    data_z: Option<(f64, f64)>,
}

impl ScanView {
    pub fn new(grid_size: usize, reference_image: egui::ColorImage) -> Self {
        Self {
            grid_size: grid_size.max(1),
            view: ViewAngles::default(),
            reference_image: Some(reference_image),
            reference: None,
            heat: None,
            wires: Vec::new(),
            headline: String::new(),
            dimension: DISPLAY_EXTENT,
            data_z: None,
        }
    }

    /// Rebuild the heat map and wireframe from `source`.
    ///
    /// In live mode the Z range widens to cover the data; a loaded scan has
    /// already fitted it.
    pub fn refresh(&mut self, ctx: &egui::Context, source: DisplaySource<'_>, z: &mut ZRange) {
        let (samples, dimension, headline) = match source {
            DisplaySource::Live {
                name,
                samples,
                extent,
            } => {
                let headline = match name {
                    Some(n) => format!("Live Scan: {}", display_name(n)),
                    None => "Live Scan".to_string(),
                };
                (samples, f64::from(extent), headline)
            }
            DisplaySource::Loaded(scan) => (
                scan.samples.as_slice(),
                f64::from(scan.dimension),
                format!("Loaded: {}", display_name(&scan.name)),
            ),
        };

        self.headline = headline;
        self.dimension = dimension;
        self.data_z = z_bounds(samples);
        if let Some((lo, hi)) = self.data_z {
            z.include(lo, hi);
        }

        if samples.is_empty() {
            self.clear();
            return;
        }

        let grid = HeatGrid::rasterize(samples, dimension, self.grid_size);
        let image = grid.to_color_image(z, HEAT_ALPHA);
        match &mut self.heat {
            Some(tex) => tex.set(image, TextureOptions::NEAREST),
            None => self.heat = Some(ctx.load_texture("scan_heatmap", image, TextureOptions::NEAREST)),
        }
        let stride = grid.size().div_ceil(MAX_WIRES).max(1);
        self.wires = wireframe(&grid, z, &self.view, stride);
    }

    /// Drop the drawn data; axes and reference image stay.
    pub fn clear(&mut self) {
        self.heat = None;
        self.wires.clear();
        self.data_z = None;
    }

    pub fn show(&mut self, ui: &mut Ui, z: &ZRange) {
        if let Some(img) = self.reference_image.take() {
            self.reference = Some(ui.ctx().load_texture("scan_reference", img, TextureOptions::LINEAR));
        }

        ui.vertical_centered(|ui| {
            ui.heading(&self.headline);
        });
        ui.separator();

        ui.columns(2, |cols| {
            cols[0].horizontal(|ui| {
                self.show_colorbar(ui, z);
                self.show_2d(ui);
            });
            self.show_3d(&mut cols[1]);
        });
    }

    fn show_2d(&self, ui: &mut Ui) {
        let dim = self.dimension;
        Plot::new("scan_2d")
            .data_aspect(1.0)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .x_axis_label("x")
            .y_axis_label("y")
            .x_axis_formatter(move |x, _range| tick_label(x.value, dim))
            .y_axis_formatter(move |y, _range| tick_label(y.value, dim))
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds_x(0.0..=DISPLAY_EXTENT);
                plot_ui.set_plot_bounds_y(0.0..=DISPLAY_EXTENT);

                if let Some(tex) = &self.reference {
                    let [x0, x1, y0, y1] = REFERENCE_RECT;
                    let alpha = (REFERENCE_ALPHA * 255.0).round() as u8;
                    plot_ui.image(
                        PlotImage::new(
                            "reference",
                            tex.id(),
                            PlotPoint::new((x0 + x1) / 2.0, (y0 + y1) / 2.0),
                            [(x1 - x0) as f32, (y1 - y0) as f32],
                        )
                        .tint(Color32::from_white_alpha(alpha)),
                    );
                }
                if let Some(tex) = &self.heat {
                    let half = DISPLAY_EXTENT / 2.0;
                    plot_ui.image(PlotImage::new(
                        "heat map",
                        tex.id(),
                        PlotPoint::new(half, half),
                        [DISPLAY_EXTENT as f32, DISPLAY_EXTENT as f32],
                    ));
                }
            });
    }

    fn show_3d(&self, ui: &mut Ui) {
        Plot::new("scan_3d")
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .show_x(false)
            .show_y(false)
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds_x(-80.0..=80.0);
                plot_ui.set_plot_bounds_y(-60.0..=60.0);
                for pts in frame_lines(&self.view) {
                    plot_ui.line(Line::new("frame", pts).color(Color32::GRAY).width(1.0));
                }
                for w in &self.wires {
                    plot_ui.line(Line::new("surface", w.points.clone()).color(w.color).width(1.0));
                }
                if let Some((lo, hi)) = self.data_z {
                    plot_ui.text(Text::new("z max", PlotPoint::new(45.0, 55.0), format!("Z Max: {hi:.6}")));
                    plot_ui.text(Text::new("z min", PlotPoint::new(45.0, 48.0), format!("Z Min: {lo:.6}")));
                }
            });
    }

    fn show_colorbar(&self, ui: &mut Ui, z: &ZRange) {
        const STEPS: usize = 64;
        let (lo, hi) = z.bounds();
        ui.vertical(|ui| {
            ui.small(format!("{hi:.3}"));
            let height = (ui.available_height() - 24.0).max(40.0);
            let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, height), egui::Sense::hover());
            let painter = ui.painter_at(rect);
            let step_h = rect.height() / STEPS as f32;
            for i in 0..STEPS {
                let t = 1.0 - (i as f64 + 0.5) / STEPS as f64;
                let top = rect.top() + i as f32 * step_h;
                let cell = egui::Rect::from_min_max(
                    egui::pos2(rect.left(), top),
                    egui::pos2(rect.right(), top + step_h + 0.5),
                );
                painter.rect_filled(cell, 0.0, crate::render::jet(t));
            }
            ui.small(format!("{lo:.3}"));
        });
    }
}
