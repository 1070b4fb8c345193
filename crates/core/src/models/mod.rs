//! Shared domain models.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound on the free-text comment attached to a record.
pub const MAX_COMMENT_LEN: usize = 250;

/// The closed set of collection states a record can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Played through.
    Finished,
    /// Owned, not started.
    Backlog,
    /// Finished once, queued for another run.
    Replay,
    /// Dropped for good.
    Abandoned,
    /// Paused mid-way.
    Suspended,
    /// Not owned yet.
    Wishlist,
}

impl GameStatus {
    /// Every status in display order.
    pub const ALL: [GameStatus; 6] = [
        GameStatus::Finished,
        GameStatus::Backlog,
        GameStatus::Replay,
        GameStatus::Abandoned,
        GameStatus::Suspended,
        GameStatus::Wishlist,
    ];

    /// Canonical lower-case key.
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Finished => "finished",
            GameStatus::Backlog => "backlog",
            GameStatus::Replay => "replay",
            GameStatus::Abandoned => "abandoned",
            GameStatus::Suspended => "suspended",
            GameStatus::Wishlist => "wishlist",
        }
    }

    /// Capitalised label for menus.
    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Finished => "Finished",
            GameStatus::Backlog => "Backlog",
            GameStatus::Replay => "Replay",
            GameStatus::Abandoned => "Abandoned",
            GameStatus::Suspended => "Suspended",
            GameStatus::Wishlist => "Wishlist",
        }
    }

    /// Case-insensitive lookup that falls back to [`GameStatus::Backlog`]
    /// for anything that is not one of the six keys.
    pub fn parse_or_backlog(raw: &str) -> Self {
        raw.parse().unwrap_or(GameStatus::Backlog)
    }

    /// Next status in [`GameStatus::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the six status keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for GameStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        GameStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lower)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Stored status of a record.
///
/// The completion date lives inside the `Finished` variant, so a record that
/// is not finished cannot carry one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Status {
    /// Played through, optionally on a known date.
    Finished {
        /// Day the game was completed, when known.
        completed_on: Option<NaiveDate>,
    },
    /// Owned, not started.
    #[default]
    Backlog,
    /// Queued for another run.
    Replay,
    /// Dropped.
    Abandoned,
    /// Paused.
    Suspended,
    /// Not owned yet.
    Wishlist,
}

impl Status {
    /// Status for `kind` with no associated date.
    pub fn from_kind(kind: GameStatus) -> Self {
        match kind {
            GameStatus::Finished => Status::Finished { completed_on: None },
            GameStatus::Backlog => Status::Backlog,
            GameStatus::Replay => Status::Replay,
            GameStatus::Abandoned => Status::Abandoned,
            GameStatus::Suspended => Status::Suspended,
            GameStatus::Wishlist => Status::Wishlist,
        }
    }

    /// The plain status key.
    pub fn kind(&self) -> GameStatus {
        match self {
            Status::Finished { .. } => GameStatus::Finished,
            Status::Backlog => GameStatus::Backlog,
            Status::Replay => GameStatus::Replay,
            Status::Abandoned => GameStatus::Abandoned,
            Status::Suspended => GameStatus::Suspended,
            Status::Wishlist => GameStatus::Wishlist,
        }
    }

    /// Completion date, only ever present for finished records.
    pub fn completed_on(&self) -> Option<NaiveDate> {
        match self {
            Status::Finished { completed_on } => *completed_on,
            _ => None,
        }
    }
}

/// Rating on a 0–10 scale with half-point granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(u8);

impl Score {
    /// Highest representable rating.
    pub const MAX: f64 = 10.0;

    /// Snap `points` to the nearest half point. Returns `None` when `points`
    /// lies outside 0–10 or is not finite.
    pub fn new(points: f64) -> Option<Self> {
        if !(0.0..=Self::MAX).contains(&points) {
            return None;
        }
        Some(Self((points * 2.0).round() as u8))
    }

    /// Rescale a 0–100 rating onto 0–10.
    pub fn from_percent(percent: f64) -> Option<Self> {
        Self::new(percent / 10.0)
    }

    /// Rating as a decimal number.
    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{:.1}", self.value())
        }
    }
}

impl TryFrom<f64> for Score {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Score::new(value).ok_or_else(|| format!("score {value} outside 0-10"))
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.value()
    }
}

/// One tracked game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Collection-unique identifier, fixed at creation.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Platform the copy belongs to.
    #[serde(default)]
    pub platform: Option<String>,
    /// Cover art URL.
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Collection state.
    #[serde(flatten)]
    pub status: Status,
    /// Free-form labels in insertion order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Personal rating.
    #[serde(default)]
    pub score: Option<Score>,
    /// Release date as recorded when the entry was created.
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    /// Free text note.
    #[serde(default)]
    pub comments: String,
}

impl Game {
    /// Release date, surfaced only while the game is wishlisted.
    pub fn wishlist_release(&self) -> Option<NaiveDate> {
        match self.status {
            Status::Wishlist => self.release_date,
            _ => None,
        }
    }

    /// Whether the record carries `tag` (case-sensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns a user-facing label combining title and platform.
    pub fn display_name(&self) -> String {
        match self.platform.as_deref() {
            Some(platform) if !platform.is_empty() => format!("{} · {}", self.title, platform),
            _ => self.title.clone(),
        }
    }
}

/// A record before it has been given an identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameDraft {
    /// Display title.
    pub title: String,
    /// Platform.
    pub platform: Option<String>,
    /// Cover art URL.
    pub cover_image: Option<String>,
    /// Collection state.
    pub status: Status,
    /// Labels.
    pub tags: Vec<String>,
    /// Rating.
    pub score: Option<Score>,
    /// Release date.
    pub release_date: Option<NaiveDate>,
    /// Note.
    pub comments: String,
}

impl GameDraft {
    /// Attach an identifier.
    pub fn into_game(self, id: u64) -> Game {
        Game {
            id,
            title: self.title,
            platform: self.platform,
            cover_image: self.cover_image,
            status: self.status,
            tags: self.tags,
            score: self.score,
            release_date: self.release_date,
            comments: self.comments,
        }
    }
}

impl From<Game> for GameDraft {
    fn from(game: Game) -> Self {
        Self {
            title: game.title,
            platform: game.platform,
            cover_image: game.cover_image,
            status: game.status,
            tags: game.tags,
            score: game.score,
            release_date: game.release_date,
            comments: game.comments,
        }
    }
}

/// Two starter records shown on a fresh library.
pub fn sample_games() -> Vec<GameDraft> {
    vec![
        GameDraft {
            title: "Elden Ring".to_string(),
            cover_image: Some("https://i.redd.it/wzqo9olsot471.png".to_string()),
            status: Status::Finished {
                completed_on: NaiveDate::from_ymd_opt(2024, 2, 1),
            },
            score: Score::new(9.0),
            comments: "Loved this game!".to_string(),
            tags: vec!["Adventure".to_string(), "RPG".to_string()],
            ..GameDraft::default()
        },
        GameDraft {
            title: "Stardew Valley".to_string(),
            status: Status::Replay,
            comments: "Really need to replay it".to_string(),
            tags: vec!["Indie".to_string()],
            ..GameDraft::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parsing_is_case_insensitive_and_closed() {
        assert_eq!(GameStatus::parse_or_backlog("FINISHED"), GameStatus::Finished);
        assert_eq!(GameStatus::parse_or_backlog("WishList"), GameStatus::Wishlist);
        assert_eq!(GameStatus::parse_or_backlog("finish"), GameStatus::Backlog);
        assert_eq!(GameStatus::parse_or_backlog(""), GameStatus::Backlog);
        assert!("playing".parse::<GameStatus>().is_err());
    }

    #[test]
    fn status_cycle_wraps() {
        assert_eq!(GameStatus::Wishlist.next(), GameStatus::Finished);
        assert_eq!(GameStatus::Finished.next(), GameStatus::Backlog);
    }

    #[test]
    fn new_records_start_in_backlog() {
        assert_eq!(Status::default(), Status::Backlog);
        assert_eq!(GameDraft::default().status.kind(), GameStatus::Backlog);
    }

    #[test]
    fn score_snaps_to_half_points() {
        assert_eq!(Score::new(7.3).map(Score::value), Some(7.5));
        assert_eq!(Score::new(7.2).map(Score::value), Some(7.0));
        assert_eq!(Score::from_percent(85.0).map(Score::value), Some(8.5));
        assert_eq!(Score::from_percent(100.0).map(Score::value), Some(10.0));
        assert!(Score::new(10.5).is_none());
        assert!(Score::new(-1.0).is_none());
        assert!(Score::new(-0.2).is_none());
        assert!(Score::new(10.2).is_none());
        assert!(Score::from_percent(-2.0).is_none());
        assert!(Score::from_percent(102.0).is_none());
        assert_eq!(Score::from_percent(0.0).map(Score::value), Some(0.0));
        assert!(Score::new(f64::NAN).is_none());
        assert_eq!(Score::new(8.5).map(|s| s.to_string()).as_deref(), Some("8.5"));
        assert_eq!(Score::new(9.0).map(|s| s.to_string()).as_deref(), Some("9"));
    }

    #[test]
    fn release_date_only_surfaces_for_wishlist() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1);
        let mut game = GameDraft {
            title: "Hollow Knight: Silksong".to_string(),
            status: Status::Backlog,
            release_date: date,
            ..GameDraft::default()
        }
        .into_game(1);
        assert_eq!(game.wishlist_release(), None);
        game.status = Status::Wishlist;
        assert_eq!(game.wishlist_release(), date);
        assert_eq!(game.status.completed_on(), None);
    }

    #[test]
    fn game_serializes_status_inline() {
        let game = sample_games().remove(0).into_game(1);
        let value = serde_json::to_value(&game).unwrap();
        assert_eq!(value["status"], json!("finished"));
        assert_eq!(value["completed_on"], json!("2024-02-01"));
        assert_eq!(value["score"], json!(9.0));

        let back: Game = serde_json::from_value(value).unwrap();
        assert_eq!(back, game);
    }
}
