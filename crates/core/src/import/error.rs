use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures that stop an import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file could not be read.
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid UTF-8 text.
    #[error("{} is not UTF-8 text", .0.display())]
    Encoding(PathBuf),
    /// The text is not parseable as CSV.
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    /// Required columns missing or no data rows.
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),
    /// Confirmation requested before a file finished parsing.
    #[error("no parsed CSV is ready to import")]
    NotReady,
}

impl ImportError {
    /// Human-readable messages for display, one per problem.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ImportError::Invalid(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}
