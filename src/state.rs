use crate::auth::User;
use crate::theme::ThemeMode;

/// Top-level screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Auth,
    Dashboard,
    Editor,
}

/// Navigation, theme and signed-in user. Every change goes through one of the
/// reducers below.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    mode: AppMode,
    theme: ThemeMode,
    user: Option<User>,
}

impl AppState {
    pub fn new(theme: ThemeMode) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    pub fn login(&mut self, user: User) {
        log::info!("state: signed in as {}", user.email);
        self.user = Some(user);
        self.mode = AppMode::Dashboard;
    }

    pub fn logout(&mut self) {
        log::info!("state: signed out");
        self.user = None;
        self.mode = AppMode::Auth;
    }

    pub fn navigate(&mut self, mode: AppMode) {
        log::debug!("state: {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Screen to draw. The dashboard needs a user; without one the sign-in
    /// screen is shown instead. The editor has no such guard.
    pub fn screen(&self) -> AppMode {
        match self.mode {
            AppMode::Dashboard if self.user.is_none() => AppMode::Auth,
            mode => mode,
        }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
