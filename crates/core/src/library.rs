//! In-memory collection state and the transitions that edit it.

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    models::{sample_games, Game, GameDraft},
    tags::{compare_tags, TagError, TagRegistry},
};

/// Reasons a transition is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    /// Title blank after trimming.
    #[error("Title cannot be empty")]
    EmptyTitle,
    /// No record with this identifier.
    #[error("No game with id {0}")]
    UnknownGame(u64),
    /// An imported record reused or reordered identifiers.
    #[error("Imported id {id} collides with the collection (next free id is {next})")]
    IdCollision {
        /// Offending identifier.
        id: u64,
        /// Smallest identifier that would have been accepted.
        next: u64,
    },
    /// Registry edit failed.
    #[error(transparent)]
    Tag(#[from] TagError),
}

/// A single edit to the library.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Create a record with the next free identifier.
    AddGame(GameDraft),
    /// Replace the record with the same identifier.
    UpdateGame(Game),
    /// Drop a record.
    DeleteGame(u64),
    /// Register a tag.
    AddTag(String),
    /// Rename a tag everywhere.
    RenameTag {
        /// Current spelling.
        from: String,
        /// New spelling.
        to: String,
    },
    /// Unregister a tag and strip it from every record.
    DeleteTag(String),
    /// Append a batch produced by the CSV importer.
    ImportGames(Vec<Game>),
}

/// Owned application state: the records and the tag registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    games: Vec<Game>,
    tags: TagRegistry,
    next_id: u64,
}

impl Library {
    /// Empty library with the given registry.
    pub fn new(tags: TagRegistry) -> Self {
        Self {
            games: Vec::new(),
            tags,
            next_id: 1,
        }
    }

    /// Library seeded from configuration, optionally with starter records.
    pub fn seeded<I, S>(default_tags: I, with_samples: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut library = Self::new(TagRegistry::from_names(default_tags));
        if with_samples {
            for draft in sample_games() {
                library.insert_draft(draft);
            }
        }
        library
    }

    /// All records in insertion order.
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    /// Record with `id`.
    pub fn game(&self, id: u64) -> Option<&Game> {
        self.games.iter().find(|game| game.id == id)
    }

    /// The tag registry.
    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    /// Identifier the next created record will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id.max(1)
    }

    /// Distinct tags carried by at least one record, sorted for display.
    pub fn tags_in_use(&self) -> Vec<String> {
        let mut used: Vec<String> = Vec::new();
        for tag in self.games.iter().flat_map(|game| game.tags.iter()) {
            if !used.contains(tag) {
                used.push(tag.clone());
            }
        }
        used.sort_by(|a, b| compare_tags(a, b));
        used
    }

    /// Apply `action` and return the resulting state. `self` is left as it was.
    pub fn apply(&self, action: Action) -> Result<Library, LibraryError> {
        let mut next = self.clone();
        match action {
            Action::AddGame(draft) => {
                let title = draft.title.trim().to_string();
                if title.is_empty() {
                    return Err(LibraryError::EmptyTitle);
                }
                let id = next.insert_draft(GameDraft { title, ..draft });
                info!(id, "Game added");
            }
            Action::UpdateGame(game) => {
                let title = game.title.trim().to_string();
                if title.is_empty() {
                    return Err(LibraryError::EmptyTitle);
                }
                let slot = next
                    .games
                    .iter_mut()
                    .find(|existing| existing.id == game.id)
                    .ok_or(LibraryError::UnknownGame(game.id))?;
                let mut game = Game { title, ..game };
                next.tags.adopt(&mut game.tags);
                *slot = game;
                debug!(id = slot.id, "Game updated");
            }
            Action::DeleteGame(id) => {
                let before = next.games.len();
                next.games.retain(|game| game.id != id);
                if next.games.len() == before {
                    return Err(LibraryError::UnknownGame(id));
                }
                info!(id, "Game deleted");
            }
            Action::AddTag(name) => {
                let stored = next.tags.add(&name)?;
                debug!(tag = %stored, "Tag added");
            }
            Action::RenameTag { from, to } => {
                let stored = next.tags.rename(&from, &to)?;
                for game in &mut next.games {
                    for tag in game.tags.iter_mut().filter(|tag| **tag == from) {
                        *tag = stored.clone();
                    }
                }
                info!(from = %from, to = %stored, "Tag renamed");
            }
            Action::DeleteTag(name) => {
                next.tags.remove(&name)?;
                for game in &mut next.games {
                    game.tags.retain(|tag| *tag != name);
                }
                info!(tag = %name, "Tag deleted");
            }
            Action::ImportGames(batch) => {
                let count = batch.len();
                for mut game in batch {
                    if game.id < next.next_id() {
                        return Err(LibraryError::IdCollision {
                            id: game.id,
                            next: next.next_id(),
                        });
                    }
                    next.next_id = game.id + 1;
                    let registered = next.tags.adopt(&mut game.tags);
                    if registered > 0 {
                        debug!(id = game.id, registered, "Imported tags registered");
                    }
                    next.games.push(game);
                }
                info!(count, total = next.games.len(), "Import merged");
            }
        }
        Ok(next)
    }

    fn insert_draft(&mut self, mut draft: GameDraft) -> u64 {
        let id = self.next_id();
        self.next_id = id + 1;
        self.tags.adopt(&mut draft.tags);
        self.games.push(draft.into_game(id));
        id
    }
}
