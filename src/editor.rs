use eframe::egui;
use egui::{Pos2, Rect};
use image::Rgba;
use uuid::Uuid;

use crate::canvas::Surface;
use crate::components::colors::BackgroundColor;
use crate::components::history::{HistoryManager, Snapshot};
use crate::components::tools::{BrushState, EditorTool, map_to_surface};
use crate::io::{self, ExportFormat, ImageIoError};
use crate::ops::ai::{AiError, AiTask, ImageAiService};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Image(#[from] ImageIoError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

/// AI work handed out by the session. Run it anywhere, then feed the
/// completion back through [`EditorSession::finish_ai`].
#[derive(Clone, Debug)]
pub struct AiRequest {
    pub job: Uuid,
    pub task: AiTask,
}

impl AiRequest {
    pub fn run(self, service: &dyn ImageAiService) -> AiCompletion {
        let result = self.task.run(service);
        AiCompletion {
            job: self.job,
            label: self.task.label(),
            result,
        }
    }
}

#[derive(Debug)]
pub struct AiCompletion {
    pub job: Uuid,
    pub label: &'static str,
    pub result: Result<String, AiError>,
}

/// Encoded export ready to be written or downloaded.
#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// The editing session: one surface, its undo log, and the tool state.
pub struct EditorSession {
    pub id: Uuid,
    /// Data URL of the image as first loaded; source for Auto Remove and reset.
    original: Option<String>,
    surface: Surface,
    history: HistoryManager,
    background: BackgroundColor,
    tool: EditorTool,
    pub brush: BrushState,
    is_processing: bool,
    pending_job: Option<Uuid>,
    /// Bumped on every pixel change so views know when to re-upload.
    revision: u64,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(BrushState::default().size)
    }
}

impl EditorSession {
    pub fn new(brush_size: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            original: None,
            surface: Surface::default(),
            history: HistoryManager::default(),
            background: BackgroundColor::Transparent,
            tool: EditorTool::default(),
            brush: BrushState::new(brush_size),
            is_processing: false,
            pending_job: None,
            revision: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn has_image(&self) -> bool {
        self.original.is_some()
    }

    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn background(&self) -> BackgroundColor {
        self.background
    }

    pub fn set_background(&mut self, background: BackgroundColor) {
        self.background = background;
    }

    pub fn tool(&self) -> EditorTool {
        self.tool
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn pending_job(&self) -> Option<Uuid> {
        self.pending_job
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ------------------------------------------------------------------------
    // Loading and history
    // ------------------------------------------------------------------------

    /// Start over with a newly picked file: history restarts at one entry, the
    /// background goes back to transparent and any in-flight AI job is dropped.
    /// On decode failure the session is left as it was.
    pub fn load_source(&mut self, data_url: &str) -> Result<(), EditorError> {
        let image = io::decode_data_url(data_url)?;
        self.original = Some(data_url.to_string());
        self.history.clear();
        self.background = BackgroundColor::Transparent;
        self.invalidate_job();
        self.brush.cancel_stroke();
        self.surface.load_scaled(&image);
        self.revision += 1;
        self.snapshot("Open image");
        log::info!(
            "editor: loaded source {}x{} (surface {}x{})",
            image.width(),
            image.height(),
            self.surface.width(),
            self.surface.height()
        );
        Ok(())
    }

    /// Draw a new image onto the surface (scaled to fit) and append it to the
    /// history. Used for AI results.
    pub fn load_image(&mut self, data_url: &str) -> Result<(), EditorError> {
        let image = io::decode_data_url(data_url)?;
        if self.original.is_none() {
            self.original = Some(data_url.to_string());
        }
        self.surface.load_scaled(&image);
        self.revision += 1;
        self.snapshot("Load image");
        Ok(())
    }

    pub fn snapshot(&mut self, description: &str) {
        self.history.push(Snapshot::capture(description, self.surface.pixels()));
        log::debug!(
            "editor: {} states, {} KiB held",
            self.history.len(),
            self.history.memory_usage() / 1024
        );
    }

    /// Step back one state. `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo() else {
            return false;
        };
        log::debug!("editor: undo to {:?}", previous);
        let pixels = previous.pixels().clone();
        self.surface.restore(&pixels);
        self.revision += 1;
        true
    }

    /// Throw all edits away after `confirm` agrees. The original image is
    /// reloaded as the only history entry and the background is cleared.
    pub fn reset_to_original(&mut self, confirm: impl FnOnce() -> bool) -> Result<bool, EditorError> {
        let Some(original) = self.original.clone() else {
            return Ok(false);
        };
        if !confirm() {
            return Ok(false);
        }
        self.load_source(&original)?;
        log::info!("editor: reset to original");
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Tools and AI
    // ------------------------------------------------------------------------

    /// Switch tool. Selecting Auto Remove also starts the removal job.
    pub fn select_tool(&mut self, tool: EditorTool) -> Option<AiRequest> {
        if self.tool != tool {
            self.brush.cancel_stroke();
        }
        self.tool = tool;
        if tool == EditorTool::AutoRemove {
            self.begin_auto_remove()
        } else {
            None
        }
    }

    /// Background removal always works from the original upload.
    pub fn begin_auto_remove(&mut self) -> Option<AiRequest> {
        if self.is_processing {
            return None;
        }
        let source = self.original.clone()?;
        Some(self.start_job(AiTask::RemoveBackground { source }))
    }

    /// Scene generation works from the current surface. Blank prompts are ignored.
    pub fn begin_scene(&mut self, prompt: &str) -> Result<Option<AiRequest>, EditorError> {
        let prompt = prompt.trim();
        if prompt.is_empty() || self.is_processing || !self.has_image() {
            return Ok(None);
        }
        let source = io::encode_png_data_url(self.surface.pixels())?;
        Ok(Some(self.start_job(AiTask::GenerateScene {
            source,
            prompt: prompt.to_string(),
        })))
    }

    fn start_job(&mut self, task: AiTask) -> AiRequest {
        let job = Uuid::new_v4();
        self.is_processing = true;
        self.pending_job = Some(job);
        log::info!("editor: {} started (job {})", task.label(), job);
        AiRequest { job, task }
    }

    fn invalidate_job(&mut self) {
        if let Some(job) = self.pending_job.take() {
            log::debug!("editor: dropping in-flight job {}", job);
        }
        self.is_processing = false;
    }

    /// Apply a finished AI job. Returns `Ok(true)` when the surface changed,
    /// `Ok(false)` for a completion that no longer belongs to this session.
    pub fn finish_ai(&mut self, completion: AiCompletion) -> Result<bool, EditorError> {
        if self.pending_job != Some(completion.job) {
            log::debug!("editor: ignoring stale {} result (job {})", completion.label, completion.job);
            return Ok(false);
        }
        self.pending_job = None;
        self.is_processing = false;

        match completion.result {
            Ok(data_url) => {
                self.load_image(&data_url)?;
                log::info!("editor: {} applied", completion.label);
                Ok(true)
            }
            Err(err) => {
                log::warn!("editor: {} failed: {}", completion.label, err);
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Manual erase
    // ------------------------------------------------------------------------

    fn can_draw(&self) -> bool {
        self.tool == EditorTool::ManualErase && self.has_image() && !self.is_processing
    }

    /// Pointer down at screen position `pos` over the canvas drawn in `rendered`.
    pub fn begin_stroke(&mut self, pos: Pos2, rendered: Rect) -> bool {
        self.brush.cursor_pos = Some(pos);
        if !self.can_draw() {
            return false;
        }
        self.brush.is_drawing = true;
        self.brush.last_pos = None;
        self.erase_to(pos, rendered);
        true
    }

    pub fn continue_stroke(&mut self, pos: Pos2, rendered: Rect) {
        self.brush.cursor_pos = Some(pos);
        if self.brush.is_drawing && self.can_draw() {
            self.erase_to(pos, rendered);
        }
    }

    /// Pointer up. One history entry per stroke.
    pub fn end_stroke(&mut self) -> bool {
        if !self.brush.is_drawing {
            return false;
        }
        self.brush.cancel_stroke();
        self.snapshot("Erase");
        true
    }

    /// Pointer left the canvas: hide the ring and finish any stroke.
    pub fn pointer_left(&mut self) -> bool {
        self.brush.cursor_pos = None;
        self.end_stroke()
    }

    fn erase_to(&mut self, pos: Pos2, rendered: Rect) {
        let point = map_to_surface(pos, rendered, self.surface.size());
        let from = self.brush.last_pos.unwrap_or(point);
        if self.surface.erase_segment(from, point, self.brush.size as f32).is_some() {
            self.revision += 1;
        }
        self.brush.last_pos = Some(point);
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    /// Flatten over the current background and encode. `None` without an image.
    pub fn export(&self, format: ExportFormat) -> Result<Option<ExportedImage>, EditorError> {
        self.export_at(format, io::unix_millis())
    }

    pub fn export_at(&self, format: ExportFormat, timestamp_ms: u128) -> Result<Option<ExportedImage>, EditorError> {
        if !self.has_image() {
            return Ok(None);
        }
        let flattened = self.surface.composite_over(self.export_fill(format));
        let bytes = io::encode(&flattened, format)?;
        let file_name = io::export_file_name(format, timestamp_ms);
        log::info!("editor: exported {} ({} bytes)", file_name, bytes.len());
        Ok(Some(ExportedImage {
            file_name,
            format,
            bytes,
        }))
    }

    /// JPEG cannot carry alpha, so a transparent background exports as white.
    fn export_fill(&self, format: ExportFormat) -> Option<Rgba<u8>> {
        match self.background.fill_pixel() {
            None if !format.supports_transparency() => BackgroundColor::WHITE.fill_pixel(),
            fill => fill,
        }
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
