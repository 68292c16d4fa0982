//! InkRoom Application
//!
//! Headless room client: configuration, relay connection and the session loop.

pub mod client;
pub mod config;
pub mod error;

pub use client::{RunReport, load_seed_file, run, run_with};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
