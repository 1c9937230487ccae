use eframe::egui;
use egui::{Color32, Pos2, Stroke, Vec2};
use image::Rgba;

// ============================================================================
// BackgroundColor: the single backdrop value shared by screen and export
// ============================================================================

/// What sits behind the edited image: nothing, or a solid colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackgroundColor {
    #[default]
    Transparent,
    Rgb([u8; 3]),
}

/// Swatches offered next to the colour picker, in display order.
pub const PRESETS: &[BackgroundColor] = &[
    BackgroundColor::Transparent,
    BackgroundColor::Rgb([0xff, 0xff, 0xff]),
    BackgroundColor::Rgb([0x00, 0x00, 0x00]),
    BackgroundColor::Rgb([0xef, 0x44, 0x44]),
    BackgroundColor::Rgb([0x3b, 0x82, 0xf6]),
    BackgroundColor::Rgb([0xf5, 0x9e, 0x0b]),
    BackgroundColor::Rgb([0x10, 0xb9, 0x81]),
];

impl BackgroundColor {
    pub const WHITE: BackgroundColor = BackgroundColor::Rgb([255, 255, 255]);

    pub fn is_transparent(&self) -> bool {
        matches!(self, BackgroundColor::Transparent)
    }

    /// Parse `transparent`, `#rgb` or `#rrggbb` (the leading `#` is optional).
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("transparent") || s.eq_ignore_ascii_case("none") {
            return Some(BackgroundColor::Transparent);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    rgb[i] = v * 17;
                }
                Some(BackgroundColor::Rgb(rgb))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(BackgroundColor::Rgb([r, g, b]))
            }
            _ => None,
        }
    }

    /// `transparent` or lowercase `#rrggbb`.
    pub fn to_css(&self) -> String {
        match self {
            BackgroundColor::Transparent => "transparent".to_string(),
            BackgroundColor::Rgb([r, g, b]) => format!("#{:02x}{:02x}{:02x}", r, g, b),
        }
    }

    /// Opaque fill pixel, `None` for transparent.
    pub fn fill_pixel(&self) -> Option<Rgba<u8>> {
        match self {
            BackgroundColor::Transparent => None,
            BackgroundColor::Rgb([r, g, b]) => Some(Rgba([*r, *g, *b, 255])),
        }
    }

    pub fn to_color32(&self) -> Color32 {
        match self {
            BackgroundColor::Transparent => Color32::TRANSPARENT,
            BackgroundColor::Rgb([r, g, b]) => Color32::from_rgb(*r, *g, *b),
        }
    }

    /// Value the colour wheel starts from; white while transparent.
    pub fn picker_rgb(&self) -> [u8; 3] {
        match self {
            BackgroundColor::Transparent => [255, 255, 255],
            BackgroundColor::Rgb(rgb) => *rgb,
        }
    }
}

// ============================================================================
// Drawing helpers
// ============================================================================

/// Paint the live backdrop of the canvas: checkerboard when transparent,
/// a solid fill otherwise. Must match what `export` bakes in.
pub fn paint_backdrop(painter: &egui::Painter, rect: egui::Rect, background: BackgroundColor) {
    match background {
        BackgroundColor::Transparent => draw_checkerboard(painter, rect, 10.0),
        BackgroundColor::Rgb(_) => painter.rect_filled(rect, 0.0, background.to_color32()),
    }
}

pub fn draw_checkerboard(painter: &egui::Painter, rect: egui::Rect, cell: f32) {
    painter.rect_filled(rect, 0.0, Color32::WHITE);
    let cols = (rect.width() / cell).ceil() as i32;
    let rows = (rect.height() / cell).ceil() as i32;
    for row in 0..rows {
        for col in 0..cols {
            if (row + col) % 2 == 1 {
                let cr = egui::Rect::from_min_size(
                    Pos2::new(
                        rect.min.x + col as f32 * cell,
                        rect.min.y + row as f32 * cell,
                    ),
                    Vec2::new(cell, cell),
                )
                .intersect(rect);
                painter.rect_filled(cr, 0.0, Color32::from_gray(200));
            }
        }
    }
}

/// Row of round preset swatches plus a colour wheel.
/// Returns the newly chosen background, if the user picked one.
pub fn background_swatches(ui: &mut egui::Ui, current: BackgroundColor) -> Option<BackgroundColor> {
    let mut picked = None;
    ui.horizontal_wrapped(|ui| {
        let mut wheel = current.picker_rgb();
        if ui
            .color_edit_button_srgb(&mut wheel)
            .on_hover_text("Custom colour")
            .changed()
        {
            picked = Some(BackgroundColor::Rgb(wheel));
        }

        for preset in PRESETS {
            let size = Vec2::splat(28.0);
            let (rect, resp) = ui.allocate_exact_size(size, egui::Sense::click());
            if ui.is_rect_visible(rect) {
                let p = ui.painter();
                let center = rect.center();
                let radius = rect.width() * 0.5;
                if preset.is_transparent() {
                    draw_checkerboard(p, rect.shrink(radius * 0.3), 4.0);
                } else {
                    p.circle_filled(center, radius, preset.to_color32());
                }
                let border = if *preset == current {
                    Stroke::new(2.0, ui.visuals().selection.bg_fill)
                } else {
                    Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color)
                };
                p.circle_stroke(center, radius, border);
            }
            let resp = resp.on_hover_text(preset.to_css());
            if resp.clicked() {
                picked = Some(*preset);
            }
        }
    });
    picked
}

#[cfg(test)]
#[path = "colors_test.rs"]
mod tests;
