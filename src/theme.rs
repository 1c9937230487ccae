use eframe::egui;
use egui::{Color32, Rounding, Stroke};

/// Light or dark appearance of the whole application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

/// What the settings file asks for at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ThemePreference {
    Light,
    Dark,
    /// Follow the operating system, light when it does not say.
    #[default]
    System,
}

impl ThemePreference {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn resolve(&self, system_prefers_dark: Option<bool>) -> ThemeMode {
        match self {
            Self::Light => ThemeMode::Light,
            Self::Dark => ThemeMode::Dark,
            Self::System => {
                if system_prefers_dark == Some(true) {
                    ThemeMode::Dark
                } else {
                    ThemeMode::Light
                }
            }
        }
    }
}

impl From<ThemeMode> for ThemePreference {
    fn from(mode: ThemeMode) -> Self {
        if mode.is_dark() { Self::Dark } else { Self::Light }
    }
}

/// Indigo accent used for the primary actions.
pub const ACCENT: Color32 = Color32::from_rgb(99, 102, 241);
/// Purple accent of the AI scene generator.
pub const ACCENT_AI: Color32 = Color32::from_rgb(147, 51, 234);
/// Amber accent of the manual eraser.
pub const ACCENT_ERASE: Color32 = Color32::from_rgb(245, 158, 11);

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == ThemeMode::Dark
    }

    /// Icon for the toggle button: shows the mode you would switch *to*.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            ThemeMode::Light => "\u{1F319}",
            ThemeMode::Dark => "\u{2600}",
        }
    }

    /// Background behind the canvas area.
    pub fn workspace_fill(self) -> Color32 {
        match self {
            ThemeMode::Light => Color32::from_rgb(243, 244, 246),
            ThemeMode::Dark => Color32::from_rgb(9, 9, 11),
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        let mut visuals = match self {
            ThemeMode::Light => egui::Visuals::light(),
            ThemeMode::Dark => egui::Visuals::dark(),
        };
        visuals.selection.bg_fill = ACCENT;
        visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
        visuals.hyperlink_color = ACCENT;
        visuals.window_rounding = Rounding::same(12.0);
        visuals.widgets.inactive.rounding = Rounding::same(8.0);
        visuals.widgets.hovered.rounding = Rounding::same(8.0);
        visuals.widgets.active.rounding = Rounding::same(8.0);
        visuals
    }

    pub fn apply(self, ctx: &egui::Context) {
        ctx.set_visuals(self.visuals());
    }
}
