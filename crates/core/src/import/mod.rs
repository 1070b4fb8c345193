//! CSV import pipeline.
//!
//! Raw text is sanitised and parsed into columns and rows, the user (or
//! [`ImportMapping::auto_detect`]) maps catalog fields onto columns, the
//! result is validated as a whole, and every row is turned into a [`Game`].
//!
//! [`Game`]: crate::models::Game

mod error;
pub mod fields;
pub mod mapping;
pub mod parser;
pub mod sanitize;
pub mod session;
pub mod transform;
pub mod validate;

pub use error::ImportError;
pub use fields::{ImportField, FIELD_CATALOG};
pub use mapping::ImportMapping;
pub use parser::{parse_csv, read_csv_file, CsvRow, ParsedCsv};
pub use sanitize::sanitize_header_line;
pub use session::{ImportState, Importer, ParseTicket, PreparedImport};
pub use transform::{parse_date, split_tags, RowTransformer, ScoreScale};
pub use validate::validate;
