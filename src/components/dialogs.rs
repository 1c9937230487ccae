use eframe::egui;
use egui::{Color32, RichText};

/// Yes/no question shown as a centred modal window.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
}

impl ConfirmDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>, confirm_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: confirm_label.into(),
        }
    }

    /// The reset question asked before throwing edits away.
    pub fn reset() -> Self {
        Self::new(
            "Reset All",
            "Are you sure you want to reset all changes?",
            "Reset",
        )
    }

    /// `Some(true)` on confirm, `Some(false)` on cancel, `None` while open.
    pub fn show(&self, ctx: &egui::Context) -> Option<bool> {
        let mut answer = None;
        egui::Window::new(&self.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&self.message);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    // Warning button, red tint that works on both themes.
                    let danger = if ui.visuals().dark_mode {
                        Color32::from_rgb(153, 27, 27)
                    } else {
                        Color32::from_rgb(220, 38, 38)
                    };
                    let confirm = egui::Button::new(RichText::new(&self.confirm_label).color(Color32::WHITE)).fill(danger);
                    if ui.add(confirm).clicked() {
                        answer = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(false);
                    }
                });
            });
        if answer.is_none() && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            answer = Some(false);
        }
        answer
    }
}

/// Blocking message with a single OK button.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertDialog {
    pub title: String,
    pub message: String,
}

impl AlertDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// `true` once dismissed.
    pub fn show(&self, ctx: &egui::Context) -> bool {
        let mut dismissed = false;
        egui::Window::new(&self.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .min_width(320.0)
            .show(ctx, |ui| {
                ui.label(&self.message);
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });
        dismissed || ctx.input(|i| i.key_pressed(egui::Key::Enter) || i.key_pressed(egui::Key::Escape))
    }
}
