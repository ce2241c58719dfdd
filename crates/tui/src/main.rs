mod app;
mod block_font;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use matchtui_core::{
    config::{self, AppConfig},
    score::{PlayerProfile, ScoreStore},
    session::SessionController,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let store = ScoreStore::new(config.data_root.clone());
    let remembered = store.load_profile();
    let profile = remembered
        .clone()
        .unwrap_or_else(PlayerProfile::anonymous);
    let controller = SessionController::new(&config, store, profile);

    let mut app = app::MatchApp::new(config, controller, remembered.is_some());
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("matchtui.log");

    let env_filter = EnvFilter::from_default_env();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
