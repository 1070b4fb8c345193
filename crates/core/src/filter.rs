//! Search and filter bar state.

use crate::models::{Game, GameStatus};

/// Criteria narrowing the visible records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Case-insensitive title substring.
    pub query: String,
    /// Only this status, when set.
    pub status: Option<GameStatus>,
    /// Only records carrying this exact tag, when set.
    pub tag: Option<String>,
}

impl GameFilter {
    /// Whether any criterion is active.
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.status.is_some() || self.tag.is_some()
    }

    /// Drop every criterion.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether `game` passes all criteria.
    pub fn matches(&self, game: &Game) -> bool {
        let needle = self.query.trim().to_lowercase();
        (needle.is_empty() || game.title.to_lowercase().contains(&needle))
            && self.status.map_or(true, |status| game.status.kind() == status)
            && self.tag.as_deref().map_or(true, |tag| game.has_tag(tag))
    }

    /// Records passing the filter, in collection order.
    pub fn apply<'a>(&self, games: &'a [Game]) -> Vec<&'a Game> {
        games.iter().filter(|game| self.matches(game)).collect()
    }

    /// Advance the status criterion: all → each status → all.
    pub fn cycle_status(&mut self) {
        self.status = match self.status {
            None => Some(GameStatus::ALL[0]),
            Some(GameStatus::Wishlist) => None,
            Some(status) => Some(status.next()),
        };
    }

    /// Advance the tag criterion through `available`: all → each tag → all.
    pub fn cycle_tag(&mut self, available: &[String]) {
        let position = self
            .tag
            .as_ref()
            .and_then(|tag| available.iter().position(|t| t == tag));
        self.tag = match position {
            None if self.tag.is_none() => available.first().cloned(),
            None => None,
            Some(idx) => available.get(idx + 1).cloned(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameDraft, Status};

    fn games() -> Vec<Game> {
        vec![
            GameDraft {
                title: "Elden Ring".to_string(),
                status: Status::Finished { completed_on: None },
                tags: vec!["RPG".to_string()],
                ..GameDraft::default()
            }
            .into_game(1),
            GameDraft {
                title: "Ring Fit Adventure".to_string(),
                status: Status::Backlog,
                tags: vec!["Sports".to_string()],
                ..GameDraft::default()
            }
            .into_game(2),
        ]
    }

    #[test]
    fn combines_query_status_and_tag() {
        let games = games();
        let mut filter = GameFilter {
            query: "RING".to_string(),
            ..GameFilter::default()
        };
        assert_eq!(filter.apply(&games).len(), 2);
        filter.status = Some(GameStatus::Backlog);
        assert_eq!(filter.apply(&games)[0].id, 2);
        filter.tag = Some("sports".to_string());
        assert!(filter.apply(&games).is_empty());
        filter.tag = Some("Sports".to_string());
        assert_eq!(filter.apply(&games).len(), 1);
        filter.clear();
        assert!(!filter.is_active());
    }

    #[test]
    fn cycling_returns_to_all() {
        let mut filter = GameFilter::default();
        for _ in 0..GameStatus::ALL.len() {
            filter.cycle_status();
            assert!(filter.status.is_some());
        }
        filter.cycle_status();
        assert_eq!(filter.status, None);

        let tags = vec!["Action".to_string(), "RPG".to_string()];
        filter.cycle_tag(&tags);
        assert_eq!(filter.tag.as_deref(), Some("Action"));
        filter.cycle_tag(&tags);
        assert_eq!(filter.tag.as_deref(), Some("RPG"));
        filter.cycle_tag(&tags);
        assert_eq!(filter.tag, None);

        filter.tag = Some("Gone".to_string());
        filter.cycle_tag(&tags);
        assert_eq!(filter.tag, None);
    }
}
