use super::*;
use egui::{pos2, vec2};
use image::RgbaImage;
use std::sync::Mutex;

const BLUE: Rgba<u8> = Rgba([30, 60, 220, 255]);

/// Opaque blue image as a PNG data URL.
fn blue_source(w: u32, h: u32) -> String {
    io::encode_png_data_url(&RgbaImage::from_pixel(w, h, BLUE)).unwrap()
}

/// Left half transparent, right half red.
fn half_transparent(w: u32, h: u32) -> String {
    let img = RgbaImage::from_fn(w, h, |x, _| {
        if x < w / 2 { Rgba([0, 0, 0, 0]) } else { Rgba([200, 0, 0, 255]) }
    });
    io::encode_png_data_url(&img).unwrap()
}

fn loaded(w: u32, h: u32) -> EditorSession {
    let mut s = EditorSession::default();
    s.load_source(&blue_source(w, h)).unwrap();
    s
}

fn native_rect(s: &EditorSession) -> Rect {
    let [w, h] = s.surface().size();
    Rect::from_min_size(pos2(0.0, 0.0), vec2(w as f32, h as f32))
}

/// Records every call and answers with a fixed image, or fails when it has none.
struct ScriptedService {
    reply: Option<RgbaImage>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedService {
    fn replying(img: RgbaImage) -> Self {
        Self { reply: Some(img), calls: Mutex::new(Vec::new()) }
    }

    fn failing() -> Self {
        Self { reply: None, calls: Mutex::new(Vec::new()) }
    }

    fn answer(&self) -> Result<String, AiError> {
        match &self.reply {
            Some(img) => Ok(io::encode_png_data_url(img)?),
            None => Err(AiError::Request("connection refused".into())),
        }
    }
}

impl ImageAiService for ScriptedService {
    fn remove_background(&self, data_url: &str) -> Result<String, AiError> {
        self.calls.lock().unwrap().push((data_url.to_string(), None));
        self.answer()
    }

    fn generate_background(&self, data_url: &str, prompt: &str) -> Result<String, AiError> {
        self.calls.lock().unwrap().push((data_url.to_string(), Some(prompt.to_string())));
        self.answer()
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// ===== loading =====

#[test]
fn load_source_starts_a_fresh_history() {
    let mut s = loaded(8, 8);
    s.set_background(BackgroundColor::WHITE);
    s.snapshot("extra");
    assert_eq!(s.history().len(), 2);

    s.load_source(&blue_source(4, 4)).unwrap();
    assert!(s.has_image());
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.background(), BackgroundColor::Transparent);
    assert_eq!(s.surface().size(), [4, 4]);
}

#[test]
fn large_sources_are_scaled_to_fit() {
    let s = loaded(3000, 1500);
    assert_eq!(s.surface().size(), [1200, 600]);
}

#[test]
fn undecodable_source_leaves_session_untouched() {
    let mut s = loaded(8, 8);
    let before = s.original().map(str::to_string);
    assert!(s.load_source("data:image/png;base64,AAAA").is_err());
    assert_eq!(s.original().map(str::to_string), before);
    assert_eq!(s.history().len(), 1);
}

#[test]
fn nothing_happens_without_an_image() {
    let mut s = EditorSession::default();
    assert!(s.select_tool(EditorTool::AutoRemove).is_none());
    assert!(s.begin_scene("beach").unwrap().is_none());
    assert!(!s.undo());
    assert!(!s.reset_to_original(|| true).unwrap());
    assert!(s.export(ExportFormat::Png).unwrap().is_none());
    s.select_tool(EditorTool::ManualErase);
    assert!(!s.begin_stroke(pos2(0.0, 0.0), Rect::from_min_size(pos2(0.0, 0.0), vec2(1.0, 1.0))));
}

// ===== AI flow =====

#[test]
fn auto_remove_round_trip() {
    let mut s = loaded(8, 8);
    let original = s.original().unwrap().to_string();

    let request = s.select_tool(EditorTool::AutoRemove).unwrap();
    assert!(s.is_processing());
    assert_eq!(s.pending_job(), Some(request.job));
    assert_eq!(request.task, AiTask::RemoveBackground { source: original.clone() });
    // Triggers are disabled while a job is in flight.
    assert!(s.begin_auto_remove().is_none());
    assert!(s.begin_scene("beach").unwrap().is_none());

    let cutout = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
    let service = ScriptedService::replying(cutout.clone());
    let completion = request.run(&service);

    assert!(s.finish_ai(completion).unwrap());
    assert!(!s.is_processing());
    assert_eq!(s.pending_job(), None);
    assert_eq!(s.history().len(), 2);
    assert_eq!(s.surface().pixels(), &cutout);
    assert_eq!(service.calls.lock().unwrap()[0], (original, None));
}

#[test]
fn ai_failure_clears_flag_and_keeps_canvas() {
    let mut s = loaded(8, 8);
    let before = s.surface().clone();
    let completion = s.begin_auto_remove().unwrap().run(&ScriptedService::failing());

    let err = s.finish_ai(completion).unwrap_err();
    assert!(matches!(err, EditorError::Ai(AiError::Request(_))));
    assert!(!s.is_processing());
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.surface(), &before);
    // A new request can be made right away.
    assert!(s.begin_auto_remove().is_some());
}

#[test]
fn result_for_a_replaced_source_is_discarded() {
    let mut s = loaded(8, 8);
    let request = s.begin_auto_remove().unwrap();
    s.load_source(&blue_source(6, 6)).unwrap();
    assert!(!s.is_processing());

    let completion = request.run(&ScriptedService::replying(RgbaImage::new(8, 8)));
    assert!(!s.finish_ai(completion).unwrap());
    assert_eq!(s.surface().size(), [6, 6]);
    assert_eq!(s.history().len(), 1);
}

#[test]
fn scene_uses_current_surface_and_trimmed_prompt() {
    let mut s = loaded(8, 8);
    assert!(s.begin_scene("   ").unwrap().is_none());
    assert!(!s.is_processing());

    s.select_tool(EditorTool::ManualErase);
    let rect = native_rect(&s);
    s.begin_stroke(pos2(1.0, 1.0), rect);
    s.end_stroke();
    let current = s.surface().pixels().clone();

    let request = s.begin_scene("  a quiet forest ").unwrap().unwrap();
    let service = ScriptedService::replying(RgbaImage::from_pixel(8, 8, BLUE));
    let completion = request.run(&service);
    assert!(s.finish_ai(completion).unwrap());

    let calls = service.calls.lock().unwrap();
    let (sent, prompt) = &calls[0];
    assert_eq!(prompt.as_deref(), Some("a quiet forest"));
    assert_eq!(io::decode_data_url(sent).unwrap(), current);
}

// ===== manual erase =====

#[test]
fn stroke_erases_and_records_one_state() {
    let mut s = loaded(40, 20);
    assert!(s.select_tool(EditorTool::ManualErase).is_none());
    s.brush.set_size(6);
    let rect = native_rect(&s);

    assert!(s.begin_stroke(pos2(5.0, 10.0), rect));
    s.continue_stroke(pos2(15.0, 10.0), rect);
    s.continue_stroke(pos2(30.0, 10.0), rect);
    assert_eq!(s.history().len(), 1);
    assert!(s.end_stroke());
    assert!(!s.end_stroke());

    assert_eq!(s.history().len(), 2);
    assert_eq!(s.surface().get_pixel(20, 10)[3], 0);
    assert_eq!(s.surface().get_pixel(20, 2)[3], 255);
}

#[test]
fn stroke_maps_through_the_rendered_rect() {
    let mut s = loaded(40, 20);
    s.select_tool(EditorTool::ManualErase);
    s.brush.set_size(5);
    // Displayed at half size, offset by (100, 100).
    let rect = Rect::from_min_size(pos2(100.0, 100.0), vec2(20.0, 10.0));
    s.begin_stroke(pos2(110.0, 105.0), rect);
    s.end_stroke();
    assert_eq!(s.surface().get_pixel(20, 10)[3], 0);
    assert_eq!(s.surface().get_pixel(5, 5)[3], 255);
}

#[test]
fn pointer_leaving_ends_the_stroke() {
    let mut s = loaded(20, 20);
    s.select_tool(EditorTool::ManualErase);
    s.begin_stroke(pos2(10.0, 10.0), native_rect(&s));
    assert!(s.pointer_left());
    assert!(s.brush.cursor_pos.is_none());
    assert_eq!(s.history().len(), 2);
}

#[test]
fn other_tools_do_not_draw() {
    let mut s = loaded(20, 20);
    s.select_tool(EditorTool::BackgroundColor);
    assert!(!s.begin_stroke(pos2(10.0, 10.0), native_rect(&s)));
    assert!(!s.end_stroke());
    assert_eq!(s.surface().opaque_pixel_count(), 400);
}

#[test]
fn undo_restores_previous_stroke_state() {
    let mut s = loaded(20, 20);
    s.select_tool(EditorTool::ManualErase);
    let rect = native_rect(&s);
    s.begin_stroke(pos2(10.0, 10.0), rect);
    s.end_stroke();
    assert!(s.surface().opaque_pixel_count() < 400);

    assert!(s.undo());
    assert_eq!(s.surface().opaque_pixel_count(), 400);
    assert!(!s.undo());
}

#[test]
fn oversized_ai_result_is_fitted_and_undo_restores_size() {
    let mut s = loaded(40, 20);
    let request = s.select_tool(EditorTool::AutoRemove).unwrap();
    let big = RgbaImage::from_pixel(3000, 1500, Rgba([0, 0, 0, 0]));
    assert!(s.finish_ai(request.run(&ScriptedService::replying(big))).unwrap());
    assert_eq!(s.surface().size(), [1200, 600]);
    assert_eq!(s.history().len(), 2);

    assert!(s.undo());
    assert_eq!(s.surface().size(), [40, 20]);
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.surface().opaque_pixel_count(), 800);
    assert_eq!(*s.surface().get_pixel(39, 19), BLUE);
}

#[test]
fn history_stops_at_ten_states() {
    let mut s = loaded(20, 20);
    s.select_tool(EditorTool::ManualErase);
    s.brush.set_size(5);
    let rect = native_rect(&s);
    for i in 0..12 {
        s.begin_stroke(pos2(i as f32 + 1.0, 10.0), rect);
        s.end_stroke();
    }
    assert_eq!(s.history().len(), 10);
}

// ===== reset =====

#[test]
fn reset_requires_confirmation() {
    let mut s = loaded(20, 20);
    s.select_tool(EditorTool::ManualErase);
    s.begin_stroke(pos2(10.0, 10.0), native_rect(&s));
    s.end_stroke();
    s.set_background(BackgroundColor::Rgb([1, 2, 3]));

    assert!(!s.reset_to_original(|| false).unwrap());
    assert_eq!(s.history().len(), 2);

    assert!(s.reset_to_original(|| true).unwrap());
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.background(), BackgroundColor::Transparent);
    assert_eq!(s.surface().opaque_pixel_count(), 400);
}

// ===== export =====

#[test]
fn export_name_and_png_alpha() {
    let mut s = EditorSession::default();
    s.load_source(&half_transparent(16, 16)).unwrap();
    let out = s.export_at(ExportFormat::Png, 42).unwrap().unwrap();
    assert_eq!(out.file_name, "lumina_edit_42.png");
    let img = io::decode_image_bytes(&out.bytes).unwrap();
    assert_eq!(img.get_pixel(2, 8)[3], 0);
    assert_eq!(*img.get_pixel(12, 8), Rgba([200, 0, 0, 255]));
}

#[test]
fn jpeg_over_transparent_background_is_white() {
    let mut s = EditorSession::default();
    s.load_source(&half_transparent(16, 16)).unwrap();
    let out = s.export_at(ExportFormat::Jpeg, 7).unwrap().unwrap();
    assert_eq!(out.file_name, "lumina_edit_7.jpeg");
    let img = io::decode_image_bytes(&out.bytes).unwrap();
    let p = img.get_pixel(1, 8);
    assert!(p[0] > 235 && p[1] > 235 && p[2] > 235, "{p:?}");
}

#[test]
fn png_export_fills_with_chosen_background() {
    let mut s = EditorSession::default();
    s.load_source(&half_transparent(16, 16)).unwrap();
    s.set_background(BackgroundColor::Rgb([16, 185, 129]));
    let out = s.export_at(ExportFormat::Png, 1).unwrap().unwrap();
    let img = io::decode_image_bytes(&out.bytes).unwrap();
    assert_eq!(*img.get_pixel(2, 8), Rgba([16, 185, 129, 255]));
    assert_eq!(*img.get_pixel(12, 8), Rgba([200, 0, 0, 255]));
}

#[test]
fn revision_moves_with_pixel_changes() {
    let mut s = EditorSession::default();
    assert_eq!(s.revision(), 0);
    s.load_source(&blue_source(20, 20)).unwrap();
    let after_load = s.revision();
    assert!(after_load > 0);

    s.set_background(BackgroundColor::WHITE);
    assert_eq!(s.revision(), after_load);

    s.select_tool(EditorTool::ManualErase);
    s.begin_stroke(pos2(10.0, 10.0), native_rect(&s));
    s.end_stroke();
    let after_stroke = s.revision();
    assert!(after_stroke > after_load);

    s.undo();
    assert!(s.revision() > after_stroke);
}
