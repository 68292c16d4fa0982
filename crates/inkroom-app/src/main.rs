//! Main application entry point (native).

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting InkRoom");

    let config = match inkroom_app::AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match inkroom_app::run(&config) {
        Ok(report) => {
            log::info!(
                "Left room {} with {} shapes after {} frames",
                config.room_id,
                report.shape_count,
                report.frames
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
