use std::ops::RangeInclusive;

use eframe::egui;
use egui::{Pos2, Rect};

pub const BRUSH_SIZE_DEFAULT: u32 = 30;
pub const BRUSH_SIZE_RANGE: RangeInclusive<u32> = 5..=100;

// ============================================================================
// EDITOR TOOLS
// ============================================================================

/// Which interaction the pointer and the AI triggers map to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EditorTool {
    /// Selecting it immediately sends the source image to the AI service.
    #[default]
    AutoRemove,
    /// Brush that erases to full transparency.
    ManualErase,
    BackgroundColor,
    BackgroundAi,
}

impl EditorTool {
    pub fn label(&self) -> &'static str {
        match self {
            EditorTool::AutoRemove => "Auto Remove",
            EditorTool::ManualErase => "Manual Erase",
            EditorTool::BackgroundColor => "Background Color",
            EditorTool::BackgroundAi => "AI Scene Generator",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            EditorTool::AutoRemove => "Accurate AI Extraction",
            EditorTool::ManualErase => "Brush to erase",
            EditorTool::BackgroundColor => "Solid backdrop",
            EditorTool::BackgroundAi => "Describe a scene",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            EditorTool::AutoRemove => "\u{2728}",
            EditorTool::ManualErase => "\u{1F9FD}",
            EditorTool::BackgroundColor => "\u{1F3A8}",
            EditorTool::BackgroundAi => "\u{1FA84}",
        }
    }
}

// ============================================================================
// BRUSH STATE
// ============================================================================

/// Transient eraser state; never persisted and never part of history.
#[derive(Clone, Debug, PartialEq)]
pub struct BrushState {
    /// Line width in surface pixels.
    pub size: u32,
    /// Last surface-space point of the current stroke.
    pub last_pos: Option<Pos2>,
    /// Screen-space pointer position for the cursor ring.
    pub cursor_pos: Option<Pos2>,
    pub is_drawing: bool,
}

impl Default for BrushState {
    fn default() -> Self {
        Self::new(BRUSH_SIZE_DEFAULT)
    }
}

impl BrushState {
    pub fn new(size: u32) -> Self {
        Self {
            size: size.clamp(*BRUSH_SIZE_RANGE.start(), *BRUSH_SIZE_RANGE.end()),
            last_pos: None,
            cursor_pos: None,
            is_drawing: false,
        }
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size.clamp(*BRUSH_SIZE_RANGE.start(), *BRUSH_SIZE_RANGE.end());
    }

    /// Forget the in-progress stroke without touching the size.
    pub fn cancel_stroke(&mut self) {
        self.is_drawing = false;
        self.last_pos = None;
    }
}

// ============================================================================
// COORDINATE MAPPING
// ============================================================================

/// Map a screen position into surface pixel space.
///
/// `rendered` is where the surface is drawn on screen; `surface` its size in
/// pixels. Each axis is scaled independently by `surface_px / rendered_px`,
/// so a non-uniformly stretched surface still maps correctly.
pub fn map_to_surface(pos: Pos2, rendered: Rect, surface: [u32; 2]) -> Pos2 {
    let scale_x = if rendered.width() > 0.0 {
        surface[0] as f32 / rendered.width()
    } else {
        1.0
    };
    let scale_y = if rendered.height() > 0.0 {
        surface[1] as f32 / rendered.height()
    } else {
        1.0
    };
    Pos2::new(
        (pos.x - rendered.min.x) * scale_x,
        (pos.y - rendered.min.y) * scale_y,
    )
}

/// On-screen size of the brush ring for a surface-space brush width.
pub fn cursor_screen_size(brush_size: u32, rendered: Rect, surface: [u32; 2]) -> egui::Vec2 {
    let sx = if surface[0] > 0 { rendered.width() / surface[0] as f32 } else { 1.0 };
    let sy = if surface[1] > 0 { rendered.height() / surface[1] as f32 } else { 1.0 };
    egui::vec2(brush_size as f32 * sx, brush_size as f32 * sy)
}

#[cfg(test)]
#[path = "tools_test.rs"]
mod tests;
