//! Headless room client: enter, mirror the room for a while, snapshot, leave.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use inkroom_core::{
    Channel, RoomSession, SeedRecord, SessionConfig, SessionHooks, Surface, WebSocketChannel,
    parse_seed,
};
use inkroom_render::VelloRenderer;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Delay between channel polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Frames received from the relay.
    pub frames: usize,
    /// Shapes on the canvas when the client left.
    pub shape_count: usize,
    /// Where the snapshot was written, if one was requested.
    pub export_path: Option<PathBuf>,
}

/// Read a seed file. A missing path means an empty room.
pub fn load_seed_file(path: Option<&Path>) -> AppResult<Vec<SeedRecord>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let json = std::fs::read_to_string(path)?;
    let records = parse_seed(&json).map_err(|source| AppError::Seed {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded {} seed records from {}", records.len(), path.display());
    Ok(records)
}

/// Connect to the configured relay and run until the configured duration elapses.
pub fn run(config: &AppConfig) -> AppResult<RunReport> {
    let url = config.connect_url()?;
    log::info!("Connecting to {}", config.server_url);
    let channel = WebSocketChannel::connect(url.as_str()).map_err(AppError::Connect)?;
    run_with(config, Box::new(channel), Box::new(VelloRenderer::new()))
}

/// Run a session over an already constructed channel and surface.
pub fn run_with(
    config: &AppConfig,
    channel: Box<dyn Channel>,
    surface: Box<dyn Surface>,
) -> AppResult<RunReport> {
    let seed = load_seed_file(config.seed_path.as_deref())?;
    let hooks = SessionHooks::new()
        .on_scale_change(|percent| log::debug!("Zoom now {}%", percent))
        .on_selection_change(|ids| log::debug!("{} shapes selected", ids.len()));
    let mut session = RoomSession::enter(
        SessionConfig::new(&config.room_id, &config.user_id, config.viewport),
        channel,
        surface,
        &seed,
        hooks,
    )?;

    let deadline = Instant::now() + config.duration;
    let mut frames = 0;
    loop {
        frames += session.poll_channel();
        if Instant::now() >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    let export_path = match &config.export_path {
        Some(path) => {
            let png = session.export_image()?;
            std::fs::write(path, &png)?;
            log::info!("PNG export complete: {} bytes to {}", png.len(), path.display());
            Some(path.clone())
        }
        None => None,
    };

    let report = RunReport {
        frames,
        shape_count: session.shape_count(),
        export_path,
    };
    session.teardown();
    Ok(report)
}
