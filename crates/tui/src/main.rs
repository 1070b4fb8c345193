mod app;
mod forms;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Mutex,
};

use gameshelf_core::{
    config::{self, AppConfig},
    import::Importer,
    library::Library,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let written = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config.log_dir)?;
    if let Some(path) = written {
        info!(path = %path.display(), "Wrote default configuration");
    }
    info!(
        score_scale = ?config.import.score_scale,
        tags = config.library.default_tags.len(),
        samples = config.library.seed_samples,
        "Starting gameshelf"
    );

    let library = Library::seeded(&config.library.default_tags, config.library.seed_samples);
    let importer = Importer::new(config.import.score_scale, config.import.auto_map);

    let mut app = app::GameshelfApp::new(library, importer, config.ui.dark_mode);
    app.run().await
}

// The terminal belongs to the UI, so logs only go to the file.
fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("gameshelf.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
