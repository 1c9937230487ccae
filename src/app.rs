use crate::auth::PendingLogin;
use crate::components::colors;
use crate::components::dialogs::{AlertDialog, ConfirmDialog};
use crate::components::tools::{BRUSH_SIZE_RANGE, EditorTool, cursor_screen_size};
use crate::editor::{AiCompletion, AiRequest, EditorSession};
use crate::io::{self, ExportFormat};
use crate::ops::ai::{self, AiError, ImageAiService, LocalImageService};
use crate::settings::AppSettings;
use crate::state::{AppMode, AppState};
use crate::theme::{ACCENT, ACCENT_AI, ACCENT_ERASE, ThemeMode};
use eframe::egui;
use egui::{Align2, Color32, Pos2, Rect, RichText, Rounding, Sense, Stroke, Vec2};
use std::sync::{Arc, mpsc};
use std::time::Instant;
use uuid::Uuid;

// ============================================================================
// ASYNC AI PIPELINE: background jobs with channel completion
// ============================================================================

/// Completion delivered from a background AI thread, tagged with the session
/// that asked for it.
pub struct AiJobResult {
    pub session_id: Uuid,
    pub completion: AiCompletion,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Sign-in form state.
#[derive(Default)]
struct AuthForm {
    email: String,
    pending: Option<PendingLogin>,
}

/// Everything on screen that is not the editor session itself.
#[derive(Default)]
struct EditorView {
    prompt: String,
    /// Job whose success should clear the prompt box.
    prompt_job: Option<Uuid>,
    texture: Option<egui::TextureHandle>,
    texture_revision: Option<u64>,
    confirm_reset: Option<ConfirmDialog>,
}

pub struct LuminaApp {
    settings: AppSettings,
    state: AppState,
    applied_theme: Option<ThemeMode>,
    auth: AuthForm,
    editor: EditorSession,
    view: EditorView,
    alert: Option<AlertDialog>,

    ai_service: Arc<dyn ImageAiService>,
    ai_sender: mpsc::Sender<AiJobResult>,
    ai_receiver: mpsc::Receiver<AiJobResult>,
    ai_started_at: Option<f64>,
}

impl LuminaApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();
        let system_dark = cc
            .integration_info
            .system_theme
            .map(|t| matches!(t, eframe::Theme::Dark));
        let theme = settings.theme.resolve(system_dark);
        theme.apply(&cc.egui_ctx);

        let ai_service: Arc<dyn ImageAiService> = match ai::service_from_settings(&settings) {
            Ok(service) => service,
            Err(e) => {
                log::error!("AI backend unavailable ({}), using offline removal", e);
                Arc::new(LocalImageService::default())
            }
        };
        log::info!("AI backend: {}", ai_service.name());

        let (ai_sender, ai_receiver) = mpsc::channel();

        Self {
            editor: EditorSession::new(settings.brush_size),
            settings,
            state: AppState::new(theme),
            applied_theme: Some(theme),
            auth: AuthForm::default(),
            view: EditorView::default(),
            alert: None,
            ai_service,
            ai_sender,
            ai_receiver,
            ai_started_at: None,
        }
    }

    // ------------------------------------------------------------------------
    // AI jobs
    // ------------------------------------------------------------------------

    /// Run `request` on the rayon pool; the result arrives on `ai_receiver`.
    fn spawn_ai_job(&mut self, request: AiRequest, current_time: f64) {
        let sender = self.ai_sender.clone();
        let service = Arc::clone(&self.ai_service);
        let session_id = self.editor.id;
        self.ai_started_at = Some(current_time);
        rayon::spawn(move || {
            let job = request.job;
            let label = request.task.label();
            let completion = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                request.run(service.as_ref())
            }))
            .unwrap_or_else(|panic_info| {
                let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.to_string()
                } else {
                    "unknown panic payload".to_string()
                };
                log::error!("AI job '{}' panicked: {}", label, msg);
                AiCompletion {
                    job,
                    label,
                    result: Err(AiError::Request(format!("worker panicked: {}", msg))),
                }
            });
            let _ = sender.send(AiJobResult { session_id, completion });
        });
    }

    fn poll_ai_results(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.ai_receiver.try_recv() {
            if result.session_id != self.editor.id {
                log::debug!("discarding AI result for a closed editor");
                continue;
            }
            let job = result.completion.job;
            match self.editor.finish_ai(result.completion) {
                Ok(true) => {
                    if self.view.prompt_job == Some(job) {
                        self.view.prompt.clear();
                        self.view.prompt_job = None;
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    self.alert = Some(AlertDialog::new(
                        "AI Processing Failed",
                        format!("Failed to process the image. Please try again.\n\n{}", e),
                    ));
                }
            }
            if !self.editor.is_processing() {
                self.ai_started_at = None;
            }
        }
        if self.editor.is_processing() {
            ctx.request_repaint();
        }
    }

    fn select_tool(&mut self, tool: EditorTool, current_time: f64) {
        if let Some(request) = self.editor.select_tool(tool) {
            self.spawn_ai_job(request, current_time);
        }
    }

    fn generate_scene(&mut self, current_time: f64) {
        match self.editor.begin_scene(&self.view.prompt) {
            Ok(Some(request)) => {
                self.view.prompt_job = Some(request.job);
                self.spawn_ai_job(request, current_time);
            }
            Ok(None) => {}
            Err(e) => self.alert = Some(AlertDialog::new("AI Scene", e.to_string())),
        }
    }

    // ------------------------------------------------------------------------
    // File I/O
    // ------------------------------------------------------------------------

    fn pick_source(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        let loaded = io::read_file_as_data_url(&path)
            .map_err(|e| e.to_string())
            .and_then(|url| self.editor.load_source(&url).map_err(|e| e.to_string()));
        match loaded {
            Ok(()) => {
                log::info!("opened {}", path.display());
                self.view.prompt_job = None;
            }
            Err(e) => {
                log::warn!("could not open {}: {}", path.display(), e);
                self.alert = Some(AlertDialog::new("Open Image", format!("Could not open {}.\n\n{}", path.display(), e)));
            }
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let exported = match self.editor.export(format) {
            Ok(Some(exported)) => exported,
            Ok(None) => return,
            Err(e) => {
                self.alert = Some(AlertDialog::new("Export", e.to_string()));
                return;
            }
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&exported.file_name)
            .add_filter(format.label(), &[format.extension()])
            .save_file()
        else {
            return;
        };
        if let Err(e) = std::fs::write(&path, &exported.bytes) {
            log::error!("export to {} failed: {}", path.display(), e);
            self.alert = Some(AlertDialog::new("Export", format!("Could not write {}.\n\n{}", path.display(), e)));
        } else {
            log::info!("exported {}", path.display());
        }
    }

    fn request_reset(&mut self) {
        if !self.editor.has_image() {
            return;
        }
        self.view.confirm_reset = Some(ConfirmDialog::reset());
    }

    fn reset_confirmed(&mut self) {
        if let Err(e) = self.editor.reset_to_original(|| true) {
            self.alert = Some(AlertDialog::new("Reset", e.to_string()));
        }
        self.view.prompt_job = None;
    }

    /// Leaving the editor throws the session away; late AI results are dropped.
    fn leave_editor(&mut self) {
        self.editor = EditorSession::new(self.settings.brush_size);
        self.view = EditorView::default();
        self.ai_started_at = None;
        self.state.navigate(AppMode::Dashboard);
    }

    fn remember_brush_size(&mut self) {
        if self.settings.remember_brush_size(self.editor.brush.size) {
            self.settings.save();
        }
    }

    fn sync_theme(&mut self, ctx: &egui::Context) {
        let theme = self.state.theme();
        if self.applied_theme != Some(theme) {
            theme.apply(ctx);
            self.applied_theme = Some(theme);
        }
    }

    // ========================================================================
    // SCREENS
    // ========================================================================

    fn show_auth(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        if let Some(pending) = &self.auth.pending {
            match pending.poll(now) {
                Some(user) => {
                    self.auth.pending = None;
                    self.state.login(user);
                    return;
                }
                None => ctx.request_repaint_after(pending.remaining(now)),
            }
        }
        let loading = self.auth.pending.is_some();
        let mut submit = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space((ui.available_height() * 0.2).max(24.0));
                card_frame(ui).show(ui, |ui| {
                    ui.set_width(360.0);
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("\u{2728}").size(36.0));
                        ui.heading(RichText::new("Welcome Back").strong());
                        ui.label(RichText::new("Sign in to start creating magic.").weak());
                        ui.add_space(16.0);

                        let email = ui.add_enabled(
                            !loading,
                            egui::TextEdit::singleline(&mut self.auth.email)
                                .hint_text("Email address")
                                .desired_width(f32::INFINITY),
                        );
                        if email.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                            submit = true;
                        }
                        let mut password = String::from("password");
                        ui.add_enabled(
                            false,
                            egui::TextEdit::singleline(&mut password)
                                .password(true)
                                .desired_width(f32::INFINITY),
                        );
                        ui.add_space(12.0);

                        if loading {
                            ui.add(egui::Spinner::new());
                        } else if ui.add(primary_button("Sign In").min_size(Vec2::new(320.0, 36.0))).clicked() {
                            submit = true;
                        }
                        ui.add_space(12.0);
                        ui.label(RichText::new("Or continue with").weak());
                        ui.add_space(8.0);
                        if ui
                            .add_enabled(!loading, egui::Button::new("Continue with Google").min_size(Vec2::new(320.0, 36.0)))
                            .clicked()
                        {
                            submit = true;
                        }
                    });
                });
            });
        });

        if submit && !loading {
            self.auth.pending = Some(PendingLogin::start(&self.auth.email, now));
            ctx.request_repaint();
        }
    }

    fn show_dashboard(&mut self, ctx: &egui::Context) {
        let Some(user) = self.state.user().cloned() else {
            return;
        };
        let mut toggle_theme = false;
        let mut logout = false;
        let mut open_editor = false;

        egui::TopBottomPanel::top("dashboard_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Lumina").strong().size(20.0));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Log out").clicked() {
                        logout = true;
                    }
                    ui.label(&user.name);
                    if ui
                        .button(self.state.theme().toggle_icon())
                        .on_hover_text("Toggle theme")
                        .clicked()
                    {
                        toggle_theme = true;
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(24.0);
            ui.heading(RichText::new(format!("Welcome back, {}", user.name)).strong().size(28.0));
            ui.label(RichText::new(&user.email).weak());
            ui.add_space(24.0);

            card_frame(ui).show(ui, |ui| {
                ui.set_width(320.0);
                ui.label(RichText::new("\u{1FA84}").size(32.0));
                ui.label(RichText::new("Studio Editor").strong().size(18.0));
                ui.label(RichText::new("Remove backgrounds, erase by hand and drop your subject into new scenes.").weak());
                ui.add_space(8.0);
                if ui.add(primary_button("Open Editor")).clicked() {
                    open_editor = true;
                }
            });
        });

        if toggle_theme {
            self.state.toggle_theme();
            if self.settings.remember_theme(self.state.theme()) {
                self.settings.save();
            }
        }
        if logout {
            self.state.logout();
        }
        if open_editor {
            self.state.navigate(AppMode::Editor);
        }
    }

    fn show_editor(&mut self, ctx: &egui::Context) {
        let current_time = ctx.input(|i| i.time);
        let mut back = false;
        let mut export_as = None;

        egui::TopBottomPanel::top("editor_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("\u{2190}").on_hover_text("Back to dashboard").clicked() {
                    back = true;
                }
                let status = if self.editor.is_processing() {
                    "AI Processing..."
                } else {
                    "Studio Editor"
                };
                ui.label(RichText::new(status).strong());
                if let Some(started) = self.ai_started_at
                    && self.editor.is_processing()
                {
                    ui.label(RichText::new(format!("{:.0}s", current_time - started)).weak());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.add_enabled_ui(self.editor.has_image(), |ui| {
                        ui.menu_button("Export", |ui| {
                            for format in [ExportFormat::Png, ExportFormat::Jpeg] {
                                if ui.button(format.label()).clicked() {
                                    export_as = Some(format);
                                    ui.close_menu();
                                }
                            }
                        });
                    });
                });
            });
        });

        self.show_tool_sidebar(ctx, current_time);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.state.theme().workspace_fill()))
            .show(ctx, |ui| {
                if self.editor.has_image() {
                    self.show_canvas(ui);
                } else {
                    self.show_empty_state(ui);
                }
            });

        if self.editor.has_image() {
            self.show_floating_toolbar(ctx, &mut export_as);
        }

        if let Some(format) = export_as {
            self.export(format);
        }
        if back {
            self.leave_editor();
        }
    }

    fn show_tool_sidebar(&mut self, ctx: &egui::Context, current_time: f64) {
        let mut chosen = None;
        let mut generate = false;
        let enabled = self.editor.has_image() && !self.editor.is_processing();

        egui::SidePanel::left("editor_tools")
            .resizable(false)
            .exact_width(260.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(RichText::new("Tools").strong());
                ui.add_enabled_ui(enabled, |ui| {
                    for tool in [EditorTool::AutoRemove, EditorTool::ManualErase] {
                        if tool_button(ui, tool, self.editor.tool() == tool).clicked() {
                            chosen = Some(tool);
                        }
                    }

                    if self.editor.tool() == EditorTool::ManualErase {
                        ui.add_space(4.0);
                        ui.label(format!("Brush Size: {}px", self.editor.brush.size));
                        let mut size = self.editor.brush.size;
                        let slider = ui.add(egui::Slider::new(&mut size, BRUSH_SIZE_RANGE).show_value(false));
                        if slider.changed() {
                            self.editor.brush.set_size(size);
                        }
                        if slider.drag_released() || (slider.changed() && !slider.dragged()) {
                            self.remember_brush_size();
                        }
                    }

                    ui.separator();
                    ui.label(RichText::new("Background").strong());
                    if let Some(bg) = colors::background_swatches(ui, self.editor.background()) {
                        self.editor.set_background(bg);
                        chosen.get_or_insert(EditorTool::BackgroundColor);
                    }

                    ui.separator();
                    ui.label(RichText::new("AI Scene Generator").strong().color(ACCENT_AI));
                    let prompt = ui.add(
                        egui::TextEdit::multiline(&mut self.view.prompt)
                            .hint_text("Describe a background, e.g. a sunny beach at golden hour")
                            .desired_rows(3)
                            .desired_width(f32::INFINITY),
                    );
                    if prompt.gained_focus() {
                        chosen.get_or_insert(EditorTool::BackgroundAi);
                    }
                    let can_generate = !self.view.prompt.trim().is_empty();
                    let button = egui::Button::new(RichText::new("Generate").color(Color32::WHITE)).fill(ACCENT_AI);
                    if ui.add_enabled(can_generate, button).clicked() {
                        generate = true;
                    }
                });

                if let Some(hint) = self.editor.has_image().then(|| self.editor.tool().hint()) {
                    ui.add_space(12.0);
                    ui.label(RichText::new(hint).weak().italics());
                }
            });

        if let Some(tool) = chosen {
            self.select_tool(tool, current_time);
        }
        if generate {
            self.generate_scene(current_time);
        }
    }

    fn show_empty_state(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space((ui.available_height() * 0.35).max(24.0));
            ui.label(RichText::new("\u{1F5BC}").size(48.0));
            ui.label(RichText::new("Upload an image to get started").strong().size(18.0));
            ui.label(RichText::new("PNG, JPEG, WebP or BMP").weak());
            ui.add_space(12.0);
            if ui.add(primary_button("Start Editing")).clicked() {
                self.pick_source();
            }
        });
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let revision = self.editor.revision();
        if self.view.texture_revision == Some(revision) && self.view.texture.is_some() {
            return;
        }
        let pixels = self.editor.surface().pixels();
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [pixels.width() as usize, pixels.height() as usize],
            pixels.as_raw(),
        );
        match &mut self.view.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.view.texture = Some(ctx.load_texture("lumina_canvas", image, egui::TextureOptions::LINEAR));
            }
        }
        self.view.texture_revision = Some(revision);
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        self.refresh_texture(ui.ctx());
        let surface = self.editor.surface().size();
        let area = ui.available_rect_before_wrap().shrink(32.0);
        let rendered = fit_rect(area, surface);

        let response = ui.allocate_rect(rendered, Sense::hover());
        let painter = ui.painter_at(rendered.expand(2.0));
        colors::paint_backdrop(&painter, rendered, self.editor.background());
        if let Some(texture) = &self.view.texture {
            painter.image(
                texture.id(),
                rendered,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // -- Pointer ----------------------------------------------------------
        let (pressed, released) = ui.input(|i| (i.pointer.primary_pressed(), i.pointer.primary_released()));
        match response.hover_pos() {
            Some(pos) => {
                if pressed {
                    self.editor.begin_stroke(pos, rendered);
                }
                self.editor.continue_stroke(pos, rendered);
            }
            None => {
                if self.editor.brush.cursor_pos.is_some() {
                    self.editor.pointer_left();
                }
            }
        }
        if released {
            self.editor.end_stroke();
        }

        // -- Brush ring ------------------------------------------------------
        if self.editor.tool() == EditorTool::ManualErase
            && !self.editor.is_processing()
            && let Some(pos) = self.editor.brush.cursor_pos
        {
            ui.ctx().set_cursor_icon(egui::CursorIcon::None);
            let size = cursor_screen_size(self.editor.brush.size, rendered, surface);
            let radius = (size.x + size.y) * 0.25;
            painter.circle_filled(pos, radius, Color32::from_rgba_unmultiplied(255, 255, 255, 40));
            painter.circle_stroke(pos, radius, Stroke::new(1.5, ACCENT_ERASE));
        }

        // -- Processing overlay ----------------------------------------------
        if self.editor.is_processing() {
            painter.rect_filled(rendered, Rounding::ZERO, Color32::from_black_alpha(120));
            let spinner_rect = Rect::from_center_size(rendered.center(), Vec2::splat(40.0));
            ui.put(spinner_rect, egui::Spinner::new().size(40.0).color(Color32::WHITE));
            painter.text(
                rendered.center() + Vec2::new(0.0, 40.0),
                Align2::CENTER_TOP,
                "AI Processing...",
                egui::FontId::proportional(16.0),
                Color32::WHITE,
            );
        }
    }

    fn show_floating_toolbar(&mut self, ctx: &egui::Context, export_as: &mut Option<ExportFormat>) {
        let mut reset = false;
        let mut undo = false;
        egui::Area::new("editor_toolbar")
            .anchor(Align2::CENTER_BOTTOM, [130.0, -24.0])
            .show(ctx, |ui| {
                card_frame(ui).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let idle = !self.editor.is_processing();
                        if ui.add_enabled(idle, egui::Button::new("\u{21BA} Reset")).clicked() {
                            reset = true;
                        }
                        let history = self.editor.history();
                        let undo_hint = match history.descriptions().first() {
                            Some(last) if history.can_undo() => format!("Undo \"{}\" ({}/{})", last, history.len(), history.capacity()),
                            _ => "Nothing to undo".to_string(),
                        };
                        if ui
                            .add_enabled(idle && self.editor.can_undo(), egui::Button::new("\u{21B6} Undo"))
                            .on_hover_text(undo_hint)
                            .on_disabled_hover_text("Nothing to undo")
                            .clicked()
                        {
                            undo = true;
                        }
                        ui.separator();
                        for format in [ExportFormat::Png, ExportFormat::Jpeg] {
                            if ui.add(primary_button(format.label())).clicked() {
                                *export_as = Some(format);
                            }
                        }
                    });
                });
            });

        if reset {
            self.request_reset();
        }
        if undo {
            self.editor.undo();
        }
    }

    fn show_modals(&mut self, ctx: &egui::Context) {
        if let Some(dialog) = &self.view.confirm_reset
            && let Some(answer) = dialog.show(ctx)
        {
            self.view.confirm_reset = None;
            if answer {
                self.reset_confirmed();
            }
        }
        if let Some(alert) = &self.alert
            && alert.show(ctx)
        {
            self.alert = None;
        }
    }
}

impl eframe::App for LuminaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync_theme(ctx);
        self.poll_ai_results(ctx);

        match self.state.screen() {
            AppMode::Auth => self.show_auth(ctx),
            AppMode::Dashboard => self.show_dashboard(ctx),
            AppMode::Editor => self.show_editor(ctx),
        }

        self.show_modals(ctx);
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Largest rect with the surface's aspect ratio that fits in `area`, centred.
/// Never scales above 1:1.
fn fit_rect(area: Rect, surface: [u32; 2]) -> Rect {
    let (w, h) = (surface[0].max(1) as f32, surface[1].max(1) as f32);
    let scale = (area.width() / w).min(area.height() / h).clamp(0.01, 1.0);
    Rect::from_center_size(area.center(), Vec2::new(w * scale, h * scale))
}

fn card_frame(ui: &egui::Ui) -> egui::Frame {
    egui::Frame::group(ui.style())
        .fill(ui.visuals().window_fill())
        .rounding(Rounding::same(16.0))
        .inner_margin(egui::Margin::same(16.0))
}

fn primary_button(text: &str) -> egui::Button<'static> {
    egui::Button::new(RichText::new(text.to_string()).color(Color32::WHITE).strong()).fill(ACCENT)
}

fn tool_button(ui: &mut egui::Ui, tool: EditorTool, active: bool) -> egui::Response {
    let accent = match tool {
        EditorTool::ManualErase => ACCENT_ERASE,
        EditorTool::BackgroundAi => ACCENT_AI,
        _ => ACCENT,
    };
    let text = RichText::new(format!("{}  {}", tool.icon(), tool.label()));
    let button = if active {
        egui::Button::new(text.color(Color32::WHITE)).fill(accent)
    } else {
        egui::Button::new(text)
    };
    ui.add(button.min_size(Vec2::new(ui.available_width(), 34.0)))
}
