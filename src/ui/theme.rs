use egui::style::WidgetVisuals;
use egui::{Color32, FontId, Rounding, Stroke, Visuals};

// ── Palette: slate with a teal accent ───────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(19, 23, 29);
pub const BG_PANEL: Color32 = Color32::from_rgb(25, 30, 38);
pub const BG_HEADER: Color32 = Color32::from_rgb(31, 38, 48);
pub const BG_FIELD: Color32 = Color32::from_rgb(15, 18, 23);
pub const BG_WEEKEND: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 48);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(32, 110, 104, 60);
pub const BG_FOCUSED: Color32 = Color32::from_rgb(34, 62, 66);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(44, 52, 63);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(64, 196, 180);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(222, 228, 234);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(146, 158, 170);
pub const TEXT_DIM: Color32 = Color32::from_rgb(94, 106, 118);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(250, 252, 252);

pub const ACCENT: Color32 = Color32::from_rgb(52, 178, 164);
pub const TODAY_LINE: Color32 = Color32::from_rgb(232, 96, 86);
pub const GRID_LINE: Color32 = Color32::from_rgb(36, 43, 53);
pub const WARNING: Color32 = Color32::from_rgb(236, 176, 64);
pub const RING_TRACK: Color32 = Color32::from_rgb(50, 59, 70);

// Widget fills, from resting to pressed.
const WIDGET_REST: Color32 = Color32::from_rgb(36, 44, 55);
const WIDGET_HOVER: Color32 = Color32::from_rgb(44, 54, 67);
const WIDGET_PRESS: Color32 = Color32::from_rgb(52, 64, 78);

// ── Sizes ───────────────────────────────────────────────────────────────────

pub const ROW_HEIGHT: f32 = 28.0;
pub const ROW_GAP: f32 = 2.0;
pub const HEADER_HEIGHT: f32 = 44.0;
pub const BAR_ROUNDING: f32 = 4.0;
pub const BAR_INSET: f32 = 5.0; // keeps bars off the row edges
pub const INDENT_WIDTH: f32 = 16.0;
pub const STATUS_BAR_HEIGHT: f32 = 24.0;
pub const SIDE_PANEL_WIDTH: f32 = 420.0;
pub const DIALOG_WIDTH: f32 = 320.0;

const WIDGET_ROUNDING: f32 = 3.0;

// ── Fonts ───────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.0)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

// ── Visuals ─────────────────────────────────────────────────────────────────

fn tone(widget: &mut WidgetVisuals, fill: Color32, border: Color32, text: Color32) {
    widget.bg_fill = fill;
    widget.weak_bg_fill = fill;
    widget.bg_stroke = Stroke::new(1.0, border);
    widget.fg_stroke = Stroke::new(1.0, text);
    widget.rounding = Rounding::same(WIDGET_ROUNDING);
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_HEADER;
    visuals.extreme_bg_color = BG_FIELD;
    visuals.faint_bg_color = BG_DARK;
    visuals.striped = false;

    let widgets = &mut visuals.widgets;
    tone(&mut widgets.noninteractive, BG_PANEL, BORDER_SUBTLE, TEXT_SECONDARY);
    tone(&mut widgets.inactive, WIDGET_REST, BORDER_SUBTLE, TEXT_PRIMARY);
    tone(&mut widgets.hovered, WIDGET_HOVER, ACCENT, TEXT_PRIMARY);
    tone(&mut widgets.active, WIDGET_PRESS, BORDER_ACCENT, TEXT_ON_BAR);
    tone(&mut widgets.open, WIDGET_HOVER, ACCENT, TEXT_PRIMARY);

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, BORDER_ACCENT);
    visuals.hyperlink_color = ACCENT;
    visuals.warn_fg_color = WARNING;
    visuals.window_rounding = Rounding::same(6.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);

    ctx.style_mut(|style| {
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(6.0, 4.0);
        style.spacing.button_padding = egui::vec2(8.0, 3.0);
    });
}
