//! Session bootstrap and persistence
//!
//! The first run logs in through the site's login form and writes the
//! resulting cookies to a JSON file. Later runs install those cookies
//! instead of logging in again.

use crate::config::{Credentials, SessionConfig};
use crate::surface::{Surface, SurfaceError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while bootstrapping a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed session file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Login form element missing: {0}")]
    MissingField(String),

    #[error("Login requires credentials: {0}")]
    Credentials(#[from] crate::ConfigError),

    #[error("Surface error during login: {0}")]
    Surface(#[from] SurfaceError),
}

/// A persisted browser cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

/// Authenticated session state as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// RFC 3339 timestamp of when the session was captured
    pub saved_at: String,
    pub cookies: Vec<StoredCookie>,
}

impl SessionState {
    pub fn new(cookies: Vec<StoredCookie>) -> Self {
        Self {
            saved_at: Utc::now().to_rfc3339(),
            cookies,
        }
    }

    /// Loads a session file, returning `None` if it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>, SessionError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Writes the session to `path`, replacing any previous file
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Logs in by filling the configured form and captures the resulting session
pub async fn login(
    surface: &dyn Surface,
    config: &SessionConfig,
    credentials: &Credentials,
) -> Result<SessionState, SessionError> {
    let (email, password) = credentials.require_login()?;
    let short_settle = Duration::from_millis(config.field_settle_ms);

    tracing::info!("Logging in at {}", config.login_url);
    surface.navigate(&config.login_url).await?;

    let email_input = locate(surface, &config.email_selector).await?;
    surface.fill(&email_input, email).await?;
    surface.settle(short_settle).await;

    let password_input = locate(surface, &config.password_selector).await?;
    surface.fill(&password_input, password).await?;
    surface.settle(short_settle).await;

    let submit = locate(surface, &config.submit_selector).await?;
    surface.click(&submit).await?;
    surface
        .settle(Duration::from_millis(config.post_login_settle_ms))
        .await;

    let state = surface.save_session().await?;
    tracing::info!("Login complete, captured {} cookies", state.cookies.len());
    Ok(state)
}

async fn locate(
    surface: &dyn Surface,
    selector: &str,
) -> Result<crate::surface::ElementRef, SessionError> {
    surface
        .find(selector)
        .await?
        .ok_or_else(|| SessionError::MissingField(selector.to_string()))
}

/// Restores the saved session if present, otherwise logs in and saves it
pub async fn ensure_session(
    surface: &dyn Surface,
    config: &SessionConfig,
    credentials: &Credentials,
) -> Result<(), SessionError> {
    let path = Path::new(&config.path);

    match SessionState::load(path)? {
        Some(state) => {
            tracing::info!(
                "Found existing session state at {} (saved {})",
                path.display(),
                state.saved_at
            );
            // Cookies can only be installed once the tab is on the site's origin
            surface.navigate(&config.login_url).await?;
            surface.restore_session(&state).await?;
        }
        None => {
            tracing::info!("No session state at {}, logging in", path.display());
            let state = login(surface, config, credentials).await?;
            state.save(path)?;
            tracing::info!("Saved session state to {}", path.display());
        }
    }

    Ok(())
}
