//! Row-to-record conversion.
//!
//! Every field rule degrades to a default on bad input; a row always yields
//! a record.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{Game, GameStatus, Score, Status};

use super::{fields::ImportField, mapping::ImportMapping, parser::CsvRow};

/// Placeholder title for rows without one.
pub const UNTITLED: &str = "Untitled";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y", "%d %b %Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Scale the source file uses for ratings. Declared, never guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScale {
    /// Ratings are already 0–10.
    Ten,
    /// Ratings are 0–100 and get divided by ten.
    #[default]
    Hundred,
}

impl ScoreScale {
    /// Convert a raw rating on this scale.
    pub fn to_score(self, raw: f64) -> Option<Score> {
        match self {
            ScoreScale::Ten => Score::new(raw),
            ScoreScale::Hundred => Score::from_percent(raw),
        }
    }
}

/// Applies a mapping to rows.
#[derive(Debug, Clone, Copy)]
pub struct RowTransformer<'a> {
    mapping: &'a ImportMapping,
    scale: ScoreScale,
}

impl<'a> RowTransformer<'a> {
    /// Transformer reading columns through `mapping`, ratings on `scale`.
    pub fn new(mapping: &'a ImportMapping, scale: ScoreScale) -> Self {
        Self { mapping, scale }
    }

    /// Build one record. `id` is assigned by the caller and never read from
    /// the row.
    ///
    /// The completion date is always left empty: finishing a game is personal
    /// data an export cannot be trusted with.
    pub fn to_game(&self, row: &CsvRow, id: u64) -> Game {
        let title = self
            .value(row, ImportField::Title)
            .unwrap_or(UNTITLED)
            .to_string();
        let kind = self
            .value(row, ImportField::Status)
            .map(GameStatus::parse_or_backlog)
            .unwrap_or(GameStatus::Backlog);
        let tags = self
            .value(row, ImportField::Tags)
            .map(split_tags)
            .unwrap_or_default();
        let score = self
            .value(row, ImportField::Score)
            .and_then(|raw| raw.parse::<f64>().ok())
            .and_then(|raw| self.scale.to_score(raw));

        Game {
            id,
            title,
            platform: self.value(row, ImportField::Platform).map(str::to_string),
            cover_image: self.value(row, ImportField::CoverImage).map(str::to_string),
            status: Status::from_kind(kind),
            tags,
            score,
            release_date: self.value(row, ImportField::ReleaseDate).and_then(parse_date),
            comments: self
                .value(row, ImportField::Comments)
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Build records for `rows`, numbering them from `starting_id`.
    pub fn to_games(&self, rows: &[CsvRow], starting_id: u64) -> Vec<Game> {
        rows.iter()
            .zip(starting_id..)
            .map(|(row, id)| self.to_game(row, id))
            .collect()
    }

    fn value<'r>(&self, row: &'r CsvRow, field: ImportField) -> Option<&'r str> {
        let column = self.mapping.column(field)?;
        row.get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Split a comma-separated tag string, trimming pieces and dropping blanks.
/// Order and duplicates are kept.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a calendar date in any of the formats exporters commonly emit.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> ImportMapping {
        let mut mapping = ImportMapping::new();
        mapping.set(ImportField::Title, "name");
        mapping.set(ImportField::Platform, "platform");
        mapping.set(ImportField::Status, "labels");
        mapping.set(ImportField::Tags, "genres");
        mapping.set(ImportField::Score, "user_rating");
        mapping.set(ImportField::ReleaseDate, "release_date");
        mapping.set(ImportField::CoverImage, "image_url_medium");
        mapping.set(ImportField::Comments, "description_short");
        mapping
    }

    fn row(pairs: &[(&str, &str)]) -> CsvRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_row_yields_defaults() {
        let mapping = mapping();
        let game = RowTransformer::new(&mapping, ScoreScale::Hundred).to_game(&CsvRow::new(), 1);
        assert_eq!(game.id, 1);
        assert_eq!(game.title, "Untitled");
        assert_eq!(game.status, Status::Backlog);
        assert_eq!(game.score, None);
        assert_eq!(game.status.completed_on(), None);
        assert!(game.tags.is_empty());
        assert_eq!(game.comments, "");
        assert_eq!(game.cover_image, None);

        let unmapped = ImportMapping::new();
        let game = RowTransformer::new(&unmapped, ScoreScale::Hundred)
            .to_game(&row(&[("name", "Hades")]), 7);
        assert_eq!(game.title, "Untitled");
        assert_eq!(game.id, 7);
    }

    #[test]
    fn id_comes_from_the_caller() {
        let mapping = mapping();
        let transformer = RowTransformer::new(&mapping, ScoreScale::Hundred);
        let r = row(&[("name", "Hades"), ("id", "555")]);
        for id in [1, 42, 9000] {
            assert_eq!(transformer.to_game(&r, id).id, id);
        }
    }

    #[test]
    fn status_is_a_closed_lookup() {
        let mapping = mapping();
        let transformer = RowTransformer::new(&mapping, ScoreScale::Hundred);
        for (raw, expected) in [
            ("Finished", GameStatus::Finished),
            ("REPLAY", GameStatus::Replay),
            ("abandoned", GameStatus::Abandoned),
            ("Suspended", GameStatus::Suspended),
            ("wishlist", GameStatus::Wishlist),
            ("backlog", GameStatus::Backlog),
            ("playing", GameStatus::Backlog),
            ("finish", GameStatus::Backlog),
            ("", GameStatus::Backlog),
        ] {
            let game = transformer.to_game(&row(&[("labels", raw)]), 1);
            assert_eq!(game.status.kind(), expected, "status for {raw:?}");
        }
    }

    #[test]
    fn finished_rows_never_get_a_completion_date() {
        let mapping = mapping();
        let game = RowTransformer::new(&mapping, ScoreScale::Hundred).to_game(
            &row(&[("labels", "finished"), ("release_date", "2020-01-01")]),
            1,
        );
        assert_eq!(game.status, Status::Finished { completed_on: None });
        assert_eq!(game.release_date, NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn score_rescaling() {
        let mapping = mapping();
        let hundred = RowTransformer::new(&mapping, ScoreScale::Hundred);
        let score = |t: &RowTransformer, raw: &str| {
            t.to_game(&row(&[("user_rating", raw)]), 1)
                .score
                .map(Score::value)
        };
        assert_eq!(score(&hundred, "85"), Some(8.5));
        assert_eq!(score(&hundred, "100"), Some(10.0));
        assert_eq!(score(&hundred, "73"), Some(7.5));
        assert_eq!(score(&hundred, "0"), Some(0.0));
        assert_eq!(score(&hundred, "abc"), None);
        assert_eq!(score(&hundred, "250"), None);

        let ten = RowTransformer::new(&mapping, ScoreScale::Ten);
        assert_eq!(score(&ten, "8.5"), Some(8.5));
        assert_eq!(score(&ten, "85"), None);
    }

    #[test]
    fn tags_are_trimmed_in_order() {
        assert_eq!(
            split_tags("RPG, Indie ,  Action"),
            vec!["RPG", "Indie", "Action"]
        );
        assert_eq!(split_tags(" ,RPG,,RPG, "), vec!["RPG", "RPG"]);
    }

    #[test]
    fn dates_in_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 1);
        for raw in [
            "2024-02-01",
            "2024/02/01",
            "02/01/2024",
            "Feb 1, 2024",
            "2024-02-01T10:00:00Z",
            "2024-02-01 10:00:00",
        ] {
            assert_eq!(parse_date(raw), expected, "parsing {raw:?}");
        }
        assert_eq!(parse_date("someday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn full_row() {
        let mapping = mapping();
        let games = RowTransformer::new(&mapping, ScoreScale::Hundred).to_games(
            &[
                row(&[
                    ("name", "Tunic"),
                    ("platform", "PC"),
                    ("labels", "wishlist"),
                    ("genres", "Adventure, Indie"),
                    ("user_rating", "90"),
                    ("release_date", "2022-03-16"),
                    ("image_url_medium", "https://example.com/tunic.png"),
                    ("description_short", "Fox with a sword"),
                ]),
                row(&[("name", "Celeste")]),
            ],
            10,
        );
        assert_eq!(games.len(), 2);
        let tunic = &games[0];
        assert_eq!(tunic.id, 10);
        assert_eq!(tunic.platform.as_deref(), Some("PC"));
        assert_eq!(tunic.status, Status::Wishlist);
        assert_eq!(tunic.tags, vec!["Adventure", "Indie"]);
        assert_eq!(tunic.score.map(Score::value), Some(9.0));
        assert_eq!(tunic.wishlist_release(), NaiveDate::from_ymd_opt(2022, 3, 16));
        assert_eq!(tunic.cover_image.as_deref(), Some("https://example.com/tunic.png"));
        assert_eq!(tunic.comments, "Fox with a sword");
        assert_eq!(games[1].id, 11);
    }
}
