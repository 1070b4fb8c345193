#![warn(clippy::all, missing_docs)]

//! Core domain logic for gameshelf, a personal game collection tracker.
//!
//! This crate hosts the record model, the tag registry, the library state
//! transitions, the CSV import pipeline and CSV export, and configuration
//! handling used by the terminal UI and any future frontends.

pub mod config;
pub mod export;
pub mod filter;
pub mod import;
pub mod library;
pub mod models;
pub mod tags;

pub use config::AppConfig;
pub use filter::GameFilter;
pub use import::{ImportError, ImportField, ImportMapping, Importer, ScoreScale};
pub use library::{Action, Library, LibraryError};
pub use models::{Game, GameDraft, GameStatus, Score, Status};
pub use tags::{TagError, TagRegistry};
