//! Persistent application settings.
//!
//! Plain `key=value` lines, one per setting. Unknown keys are ignored and
//! malformed values keep their defaults, so an old or hand-edited file never
//! prevents startup.

use std::path::{Path, PathBuf};

use crate::components::tools::{BRUSH_SIZE_DEFAULT, BRUSH_SIZE_RANGE};
use crate::theme::{ThemeMode, ThemePreference};

pub const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_AI_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 120;

/// Which implementation of the image AI service to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AiProvider {
    /// Remote Gemini image model over HTTP.
    #[default]
    Gemini,
    /// Offline colour-key removal; no scene generation.
    Local,
}

impl AiProvider {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "local" => Some(Self::Local),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Local => "local",
        }
    }
}

/// Application settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    pub theme: ThemePreference,
    /// Initial eraser width in surface pixels
    pub brush_size: u32,
    pub ai_provider: AiProvider,
    pub ai_base_url: String,
    pub ai_model: String,
    /// Name of the environment variable that holds the API key.
    /// The key itself is never written to disk.
    pub ai_api_key_env: String,
    pub ai_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: ThemePreference::System,
            brush_size: BRUSH_SIZE_DEFAULT,
            ai_provider: AiProvider::Gemini,
            ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_api_key_env: DEFAULT_AI_KEY_ENV.to_string(),
            ai_timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/lumina/lumina_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\Lumina\lumina_settings.cfg
    /// On macOS:   ~/Library/Application Support/Lumina/lumina_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("lumina");
            return Some(config_dir.join("lumina_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("Lumina").join("lumina_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("Lumina")
                    .join("lumina_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("lumina_settings.cfg")))
        }
    }

    /// Load from the default location, or defaults if there is no file yet.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("could not read settings {}: {}", path.display(), e);
                }
                Self::default()
            }
        }
    }

    /// Parse `key=value` content on top of the defaults.
    pub fn parse(content: &str) -> Self {
        let mut settings = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "theme_mode" => {
                    if let Some(t) = ThemePreference::parse(value) {
                        settings.theme = t;
                    }
                }
                "brush_size" => {
                    if let Ok(v) = value.parse::<u32>() {
                        settings.brush_size = v.clamp(*BRUSH_SIZE_RANGE.start(), *BRUSH_SIZE_RANGE.end());
                    }
                }
                "ai_provider" => {
                    if let Some(p) = AiProvider::parse(value) {
                        settings.ai_provider = p;
                    }
                }
                "ai_base_url" if !value.is_empty() => {
                    settings.ai_base_url = value.trim_end_matches('/').to_string();
                }
                "ai_model" if !value.is_empty() => settings.ai_model = value.to_string(),
                "ai_api_key_env" if !value.is_empty() => settings.ai_api_key_env = value.to_string(),
                "ai_timeout_secs" => {
                    if let Ok(v) = value.parse::<u64>()
                        && v > 0
                    {
                        settings.ai_timeout_secs = v;
                    }
                }
                _ => {}
            }
        }
        settings
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "theme_mode={}\n\
             brush_size={}\n\
             ai_provider={}\n\
             ai_base_url={}\n\
             ai_model={}\n\
             ai_api_key_env={}\n\
             ai_timeout_secs={}\n",
            self.theme.as_str(),
            self.brush_size,
            self.ai_provider.as_str(),
            self.ai_base_url,
            self.ai_model,
            self.ai_api_key_env,
            self.ai_timeout_secs,
        )
    }

    /// Pin the theme the user switched to. `true` when the stored value changed.
    pub fn remember_theme(&mut self, mode: ThemeMode) -> bool {
        let preference = ThemePreference::from(mode);
        if self.theme == preference {
            return false;
        }
        self.theme = preference;
        true
    }

    /// `true` when the stored brush size changed.
    pub fn remember_brush_size(&mut self, size: u32) -> bool {
        let size = size.clamp(*BRUSH_SIZE_RANGE.start(), *BRUSH_SIZE_RANGE.end());
        if self.brush_size == size {
            return false;
        }
        self.brush_size = size;
        true
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            log::warn!("could not save settings {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    /// The API key, read from the environment variable named in the settings.
    pub fn ai_api_key(&self) -> Option<String> {
        std::env::var(&self.ai_api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
