//! Native window entry point.

use eframe::egui;

use crate::config::ScanConfig;
use crate::sink::ScanCommand;

use super::scan_app::ScanApp;

/// Open the viewer window and block until it is closed.
///
/// `rx` is the receiving half of [`crate::sink::channel_scan`]; the reader
/// thread holds the sender.
pub fn run_scanplot(rx: std::sync::mpsc::Receiver<ScanCommand>, config: ScanConfig) -> eframe::Result<()> {
    let app = ScanApp::new(rx, &config);

    let mut viewport = egui::ViewportBuilder::default()
        .with_title(config.display.title.clone())
        .with_inner_size(egui::vec2(1400.0, 800.0));
    if let Some(icon) = load_app_icon_svg() {
        viewport = viewport.with_icon(icon);
    }
    let opts = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        &config.display.title,
        opts,
        Box::new(|cc| {
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(app))
        }),
    )
}

/// Render `icon.svg` from the crate root. `None` if it is missing or unreadable.
fn load_app_icon_svg() -> Option<egui::IconData> {
    let svg_path = concat!(env!("CARGO_MANIFEST_DIR"), "/icon.svg");
    let data = std::fs::read(svg_path).ok()?;

    let tree = usvg::Tree::from_data(&data, &usvg::Options::default()).ok()?;
    let size = tree.size().to_int_size();
    if size.width() == 0 || size.height() == 0 {
        return None;
    }
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Some(egui::IconData {
        rgba: pixmap.take(),
        width: size.width(),
        height: size.height(),
    })
}
