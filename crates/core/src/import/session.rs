//! Import dialog state: which file is being parsed, the parsed result, and
//! the mapping the user is editing.
//!
//! Parsing happens off the UI thread. Every call to [`Importer::begin`]
//! hands out a new [`ParseTicket`]; a completion carrying any other ticket
//! is dropped, so picking a new file or resetting always wins over an older
//! parse that finishes late.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::models::Game;

use super::{
    error::ImportError,
    fields::ImportField,
    mapping::ImportMapping,
    parser::ParsedCsv,
    transform::{RowTransformer, ScoreScale},
    validate::validate,
};

/// Identifies one parse request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseTicket(u64);

/// A parsed file waiting for the user to confirm the mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImport {
    /// File the rows came from.
    pub source: PathBuf,
    /// Parsed columns and rows.
    pub parsed: ParsedCsv,
    /// Current field mapping.
    pub mapping: ImportMapping,
}

impl PreparedImport {
    /// Problems that would block confirmation with the current mapping.
    pub fn errors(&self) -> Vec<String> {
        validate(&self.parsed, &self.mapping)
    }
}

/// Where the import dialog currently is.
#[derive(Debug, Default)]
pub enum ImportState {
    /// Nothing selected.
    #[default]
    Idle,
    /// Waiting on the parse for `ticket`.
    Parsing {
        /// Ticket the completion must carry.
        ticket: ParseTicket,
        /// File being parsed.
        source: PathBuf,
    },
    /// Parsed and awaiting confirmation.
    Ready(PreparedImport),
    /// The last parse failed; a new file must be chosen.
    Failed(Vec<String>),
}

/// Drives one import at a time.
#[derive(Debug)]
pub struct Importer {
    state: ImportState,
    issued: u64,
    scale: ScoreScale,
    auto_map: bool,
}

impl Importer {
    /// Importer reading ratings on `scale`, optionally pre-filling mappings
    /// from header names.
    pub fn new(scale: ScoreScale, auto_map: bool) -> Self {
        Self {
            state: ImportState::Idle,
            issued: 0,
            scale,
            auto_map,
        }
    }

    /// Current state.
    pub fn state(&self) -> &ImportState {
        &self.state
    }

    /// Scale ratings are read on.
    pub fn scale(&self) -> ScoreScale {
        self.scale
    }

    /// Whether a parse is in flight.
    pub fn is_parsing(&self) -> bool {
        matches!(self.state, ImportState::Parsing { .. })
    }

    /// The parsed file, once ready.
    pub fn prepared(&self) -> Option<&PreparedImport> {
        match &self.state {
            ImportState::Ready(prepared) => Some(prepared),
            _ => None,
        }
    }

    /// Start importing `source`, superseding anything in progress.
    pub fn begin(&mut self, source: impl AsRef<Path>) -> ParseTicket {
        self.issued += 1;
        let ticket = ParseTicket(self.issued);
        let source = source.as_ref().to_path_buf();
        debug!(ticket = ticket.0, source = %source.display(), "Import parse started");
        self.state = ImportState::Parsing { ticket, source };
        ticket
    }

    /// Deliver a parse result. Returns `false` and leaves the state alone
    /// when `ticket` is not the one currently awaited.
    pub fn resolve(&mut self, ticket: ParseTicket, result: Result<ParsedCsv, ImportError>) -> bool {
        let source = match &self.state {
            ImportState::Parsing { ticket: awaited, source } if *awaited == ticket => source.clone(),
            _ => {
                warn!(ticket = ticket.0, "Discarding stale CSV parse result");
                return false;
            }
        };

        self.state = match result {
            Ok(parsed) => {
                let mapping = if self.auto_map {
                    ImportMapping::auto_detect(&parsed.columns)
                } else {
                    ImportMapping::new()
                };
                info!(
                    source = %source.display(),
                    rows = parsed.rows.len(),
                    mapped = mapping.iter().count(),
                    "CSV ready for mapping"
                );
                ImportState::Ready(PreparedImport {
                    source,
                    parsed,
                    mapping,
                })
            }
            Err(err) => {
                warn!(source = %source.display(), %err, "CSV parse failed");
                ImportState::Failed(err.messages())
            }
        };
        true
    }

    /// Abandon the current import; any in-flight parse becomes stale.
    pub fn reset(&mut self) {
        self.issued += 1;
        self.state = ImportState::Idle;
    }

    /// Map `field` to `column` in the ready import.
    pub fn set_mapping(&mut self, field: ImportField, column: impl Into<String>) {
        if let ImportState::Ready(prepared) = &mut self.state {
            prepared.mapping.set(field, column);
        }
    }

    /// Unmap `field` in the ready import.
    pub fn clear_mapping(&mut self, field: ImportField) {
        if let ImportState::Ready(prepared) = &mut self.state {
            prepared.mapping.clear(field);
        }
    }

    /// Step `field` to the next/previous discovered column.
    pub fn cycle_mapping(&mut self, field: ImportField, forward: bool) {
        if let ImportState::Ready(prepared) = &mut self.state {
            let columns = prepared.parsed.columns.clone();
            prepared.mapping.cycle(field, &columns, forward);
        }
    }

    /// Current blocking problems, if any.
    pub fn errors(&self) -> Vec<String> {
        match &self.state {
            ImportState::Ready(prepared) => prepared.errors(),
            ImportState::Failed(errors) => errors.clone(),
            _ => Vec::new(),
        }
    }

    /// Validate and transform every row, numbering records from
    /// `starting_id`. On success the importer returns to idle; on a
    /// validation failure it stays ready so the mapping can be fixed.
    pub fn confirm(&mut self, starting_id: u64) -> Result<Vec<Game>, ImportError> {
        let prepared = self.prepared().ok_or(ImportError::NotReady)?;
        let errors = prepared.errors();
        if !errors.is_empty() {
            return Err(ImportError::Invalid(errors));
        }
        let games = RowTransformer::new(&prepared.mapping, self.scale)
            .to_games(&prepared.parsed.rows, starting_id);
        info!(count = games.len(), starting_id, "CSV rows transformed");
        self.reset();
        Ok(games)
    }
}
