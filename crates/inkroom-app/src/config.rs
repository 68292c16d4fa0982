//! Application configuration, read from `INKROOM_*` environment variables.

use crate::error::{AppError, AppResult};
use kurbo::Size;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const ENV_WS_URL: &str = "INKROOM_WS_URL";
pub const ENV_ROOM: &str = "INKROOM_ROOM";
pub const ENV_USER: &str = "INKROOM_USER";
pub const ENV_TOKEN: &str = "INKROOM_TOKEN";
pub const ENV_SEED: &str = "INKROOM_SEED";
pub const ENV_EXPORT: &str = "INKROOM_EXPORT";
pub const ENV_DURATION_SECS: &str = "INKROOM_DURATION_SECS";
pub const ENV_VIEWPORT: &str = "INKROOM_VIEWPORT";

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Relay endpoint, `ws://` or `wss://`.
    pub server_url: String,
    pub room_id: String,
    pub user_id: String,
    /// Sent to the relay as the `token` query parameter.
    pub token: Option<String>,
    /// JSON array of persisted shape records to start from.
    pub seed_path: Option<PathBuf>,
    /// Where to write a PNG snapshot before leaving.
    pub export_path: Option<PathBuf>,
    /// How long to stay in the room.
    pub duration: Duration,
    pub viewport: Size,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8080".to_string(),
            room_id: "lobby".to_string(),
            user_id: "guest".to_string(),
            token: None,
            seed_path: None,
            export_path: None,
            duration: Duration::from_secs(10),
            viewport: Size::new(1280.0, 800.0),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset or empty keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_WS_URL) {
            config.server_url = url;
        }
        if let Some(room) = get(ENV_ROOM) {
            config.room_id = room;
        }
        if let Some(user) = get(ENV_USER) {
            config.user_id = user;
        }
        config.token = get(ENV_TOKEN);
        config.seed_path = get(ENV_SEED).map(PathBuf::from);
        config.export_path = get(ENV_EXPORT).map(PathBuf::from);
        if let Some(secs) = get(ENV_DURATION_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                AppError::Config(format!("{ENV_DURATION_SECS} must be whole seconds, got {secs:?}"))
            })?;
            config.duration = Duration::from_secs(secs);
        }
        if let Some(viewport) = get(ENV_VIEWPORT) {
            config.viewport = parse_viewport(&viewport)?;
        }

        config.connect_url()?;
        Ok(config)
    }

    /// Relay URL with the token attached.
    pub fn connect_url(&self) -> AppResult<Url> {
        let mut url = Url::parse(&self.server_url)
            .map_err(|e| AppError::Config(format!("{ENV_WS_URL}: {e}")))?;
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(AppError::Config(format!(
                "{ENV_WS_URL} must use ws:// or wss://, got {}",
                url.scheme()
            )));
        }
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}

/// Parse a `WIDTHxHEIGHT` viewport such as `1280x800`.
pub fn parse_viewport(value: &str) -> AppResult<Size> {
    let invalid = || AppError::Config(format!("{ENV_VIEWPORT} must look like 1280x800, got {value:?}"));
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: f64 = w.trim().parse().map_err(|_| invalid())?;
    let height: f64 = h.trim().parse().map_err(|_| invalid())?;
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(invalid());
    }
    Ok(Size::new(width, height))
}
