use crate::insight::{Highlight, RenderedCell};
use egui::{Color32, CornerRadius, Margin, RichText, Stroke};

pub const ALERT_COLOR: Color32 = Color32::from_rgb(211, 47, 47);
pub const FAVORABLE_COLOR: Color32 = Color32::from_rgb(56, 142, 60);
pub const WARNING_COLOR: Color32 = Color32::from_rgb(245, 124, 0);
pub const FLAGGED_ROW_TINT: Color32 = Color32::from_rgba_premultiplied(70, 14, 14, 90);

pub const SPACING_SMALL: f32 = 8.0;
pub const SPACING_MEDIUM: f32 = 12.0;
pub const MARGIN_CARD: f32 = 15.0;

pub fn apply_dashboard_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();

    visuals.widgets.active.bg_fill = Color32::from_rgb(25, 118, 210);
    visuals.widgets.hovered.corner_radius = CornerRadius::same(6);
    visuals.widgets.inactive.corner_radius = CornerRadius::same(6);
    visuals.faint_bg_color = Color32::from_rgb(35, 35, 35);
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 20);

    ctx.set_visuals(visuals);
}

pub fn card_frame(ui: &egui::Ui) -> egui::Frame {
    egui::Frame::new()
        .fill(ui.visuals().faint_bg_color)
        .corner_radius(CornerRadius::same(10))
        .inner_margin(Margin::same(MARGIN_CARD as i8))
        .stroke(Stroke::new(
            1.0,
            ui.visuals().widgets.noninteractive.bg_stroke.color,
        ))
}

pub fn highlight_color(highlight: Highlight) -> Option<Color32> {
    match highlight {
        Highlight::None => None,
        Highlight::Alert => Some(ALERT_COLOR),
        Highlight::Favorable => Some(FAVORABLE_COLOR),
    }
}

pub fn cell_text(cell: &RenderedCell) -> RichText {
    let text = RichText::new(&cell.text);
    if cell.muted {
        return text.weak();
    }
    match highlight_color(cell.highlight) {
        Some(color) => text.color(color).strong(),
        None => text,
    }
}
