//! Mock sign-in. No credentials are checked and nothing is stored; a [`User`]
//! is fabricated from the typed email after a short artificial delay.

use std::time::{Duration, Instant};

/// How long "signing in" takes.
pub const MOCK_LOGIN_DELAY: Duration = Duration::from_millis(1200);

pub const FALLBACK_EMAIL: &str = "user@example.com";
pub const FALLBACK_NAME: &str = "Creator";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl User {
    /// Build a user from whatever was typed into the email field, verbatim.
    pub fn from_email(entered: &str) -> Self {
        let email = if entered.is_empty() {
            FALLBACK_EMAIL.to_string()
        } else {
            entered.to_string()
        };
        let name = entered.split('@').next().unwrap_or_default();
        let name = if name.is_empty() { FALLBACK_NAME } else { name };
        Self {
            email,
            name: name.to_string(),
            avatar: Some(format!("https://picsum.photos/seed/{}/200", entered)),
        }
    }
}

/// A sign-in in progress. Poll it each frame until it yields the user.
#[derive(Clone, Debug)]
pub struct PendingLogin {
    entered: String,
    started: Instant,
    delay: Duration,
}

impl PendingLogin {
    pub fn start(entered: &str, now: Instant) -> Self {
        Self::with_delay(entered, now, MOCK_LOGIN_DELAY)
    }

    pub fn with_delay(entered: &str, now: Instant, delay: Duration) -> Self {
        log::info!("auth: mock sign-in started");
        Self {
            entered: entered.to_string(),
            started: now,
            delay,
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.delay.saturating_sub(now.saturating_duration_since(self.started))
    }

    /// `Some(user)` once the delay has elapsed.
    pub fn poll(&self, now: Instant) -> Option<User> {
        if self.remaining(now).is_zero() {
            Some(User::from_email(&self.entered))
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
