//! CSV text to columns and rows.

use std::{collections::HashMap, path::Path};

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};

use super::{
    error::ImportError,
    sanitize::{clean_header, sanitize_header_line},
};

/// One data row keyed by column name. Columns missing from a short row are
/// absent rather than empty.
pub type CsvRow = HashMap<String, String>;

/// Result of parsing a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCsv {
    /// Header names in file order.
    pub columns: Vec<String>,
    /// Data rows in file order; blank lines are skipped.
    pub rows: Vec<CsvRow>,
}

impl ParsedCsv {
    /// Whether the file had no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether `column` is one of the discovered headers (exact match).
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Parse CSV text with a header row.
pub fn parse_csv(content: &str) -> Result<ParsedCsv, ImportError> {
    let sanitized = sanitize_header_line(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(sanitized.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(clean_header).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let row: CsvRow = columns
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.clone(), clean_value(value)))
            .collect();
        rows.push(row);
    }

    debug!(columns = ?columns, "CSV headers discovered");
    info!(rows = rows.len(), columns = columns.len(), "CSV parsed");
    Ok(ParsedCsv { columns, rows })
}

/// Read and parse the CSV file at `path`.
pub async fn read_csv_file(path: impl AsRef<Path>) -> Result<ParsedCsv, ImportError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ImportError::Encoding(path.to_path_buf()))?;
    parse_csv(&text)
}

fn clean_value(value: &str) -> String {
    value.trim().trim_matches('"').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_headers_and_rows() -> Result<()> {
        let parsed = parse_csv(
            "\"Name\",\"Platform\",\"Genres\"\n\
             Hades, PC ,\"Action, Roguelike\"\n\
             \n\
             Celeste,Switch\n",
        )?;
        assert_eq!(parsed.columns, vec!["Name", "Platform", "Genres"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0]["Platform"], "PC");
        assert_eq!(parsed.rows[0]["Genres"], "Action, Roguelike");
        assert_eq!(parsed.rows[1]["Name"], "Celeste");
        assert!(!parsed.rows[1].contains_key("Genres"));
        Ok(())
    }

    #[test]
    fn extra_trailing_fields_are_ignored() -> Result<()> {
        let parsed = parse_csv("title,platform\nOkami,PS2,unexpected\n")?;
        assert_eq!(parsed.rows[0].len(), 2);
        assert_eq!(parsed.rows[0]["title"], "Okami");
        Ok(())
    }

    #[test]
    fn header_only_file_has_no_rows() -> Result<()> {
        let parsed = parse_csv("title,platform\n")?;
        assert!(parsed.is_empty());
        assert!(parsed.has_column("platform"));
        let parsed = parse_csv("")?;
        assert!(parsed.columns.is_empty());
        Ok(())
    }

    #[test]
    fn stray_value_quotes_are_stripped() -> Result<()> {
        let parsed = parse_csv("title,platform\n\"\"\"Okami\"\"\",PS2\n")?;
        assert_eq!(parsed.rows[0]["title"], "Okami");
        Ok(())
    }

    #[tokio::test]
    async fn reads_files_from_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("games.csv");
        fs::write(&path, "title,platform\nCeleste,Switch\n")?;
        let parsed = read_csv_file(&path).await?;
        assert_eq!(parsed.rows.len(), 1);

        let missing = read_csv_file(dir.path().join("nope.csv")).await;
        assert!(matches!(missing, Err(ImportError::Io { .. })));

        let binary = dir.path().join("binary.csv");
        fs::write(&binary, [0xff, 0xfe, 0x00, 0x41])?;
        assert!(matches!(
            read_csv_file(&binary).await,
            Err(ImportError::Encoding(_))
        ));
        Ok(())
    }
}
