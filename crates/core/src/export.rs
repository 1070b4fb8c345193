//! CSV export of the collection.

use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use tracing::info;

use crate::models::Game;

/// Header written by [`write_games`]. Names match the import field keys so an
/// exported file maps itself on re-import.
pub const EXPORT_HEADER: [&str; 9] = [
    "title",
    "platform",
    "status",
    "score",
    "tags",
    "releaseDate",
    "completedDate",
    "coverImage",
    "comments",
];

/// Write `games` as CSV. Scores are on the 0–10 scale.
pub fn write_games<W: Write>(games: &[Game], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(EXPORT_HEADER)
        .context("failed to write CSV header")?;
    for game in games {
        let date = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        csv.write_record([
            game.title.clone(),
            game.platform.clone().unwrap_or_default(),
            game.status.kind().to_string(),
            game.score.map(|s| s.to_string()).unwrap_or_default(),
            game.tags.join(", "),
            date(game.release_date),
            date(game.status.completed_on()),
            game.cover_image.clone().unwrap_or_default(),
            game.comments.clone(),
        ])
        .with_context(|| format!("failed to write game {}", game.id))?;
    }
    csv.flush().context("failed to flush CSV output")?;
    Ok(())
}

/// Write `games` to `path`, creating parent directories as needed.
pub fn export_to_path(games: &[Game], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_games(games, file)?;
    info!(count = games.len(), path = %path.display(), "Collection exported");
    Ok(())
}
