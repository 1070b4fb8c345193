//! Field-to-column mapping edited in the import dialog.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::fields::{ImportField, FIELD_CATALOG};

static NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("invalid column name regex"));

/// Lower-case and strip everything but letters and digits, so that
/// `Release Date`, `release_date` and `releaseDate` compare equal.
pub fn normalize_column_name(name: &str) -> String {
    NON_ALNUM.replace_all(&name.to_lowercase(), "").into_owned()
}

/// Partial map from catalog field to CSV column. Two fields may share a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMapping {
    columns: BTreeMap<ImportField, String>,
}

impl ImportMapping {
    /// Mapping with nothing assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Best-effort mapping from header names: a column matches a field when
    /// its normalised name equals the field key or one of its aliases.
    /// Exact key matches win over aliases.
    pub fn auto_detect(columns: &[String]) -> Self {
        let normalized: Vec<(String, &String)> = columns
            .iter()
            .map(|column| (normalize_column_name(column), column))
            .collect();

        let mut mapping = Self::new();
        for field in FIELD_CATALOG {
            let key = normalize_column_name(field.key());
            let found = normalized
                .iter()
                .find(|(name, _)| *name == key)
                .or_else(|| {
                    normalized
                        .iter()
                        .find(|(name, _)| field.aliases().contains(&name.as_str()))
                });
            if let Some((_, column)) = found {
                mapping.set(field, (*column).clone());
            }
        }
        mapping
    }

    /// Point `field` at `column`, replacing any previous choice.
    pub fn set(&mut self, field: ImportField, column: impl Into<String>) {
        self.columns.insert(field, column.into());
    }

    /// Mark `field` as not mapped.
    pub fn clear(&mut self, field: ImportField) {
        self.columns.remove(&field);
    }

    /// Column chosen for `field`.
    pub fn column(&self, field: ImportField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// Step the choice for `field` through `columns`, with "not mapped"
    /// between the last and the first column.
    pub fn cycle(&mut self, field: ImportField, columns: &[String], forward: bool) {
        if columns.is_empty() {
            self.clear(field);
            return;
        }
        let current = self
            .column(field)
            .and_then(|selected| columns.iter().position(|c| c == selected));
        let next = match (current, forward) {
            (None, true) => Some(0),
            (None, false) => Some(columns.len() - 1),
            (Some(idx), true) if idx + 1 < columns.len() => Some(idx + 1),
            (Some(idx), false) if idx > 0 => Some(idx - 1),
            (Some(_), _) => None,
        };
        match next {
            Some(idx) => self.set(field, columns[idx].clone()),
            None => self.clear(field),
        }
    }

    /// Mapped fields in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (ImportField, &str)> {
        self.columns.iter().map(|(field, column)| (*field, column.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn normalizes_column_names() {
        assert_eq!(normalize_column_name("Release Date"), "releasedate");
        assert_eq!(normalize_column_name("release_date"), "releasedate");
        assert_eq!(normalize_column_name("releaseDate"), "releasedate");
    }

    #[test]
    fn auto_detect_prefers_keys_then_aliases() {
        let cols = columns(&["Name", "Title", "Platforms", "genres", "user_rating", "Labels"]);
        let mapping = ImportMapping::auto_detect(&cols);
        assert_eq!(mapping.column(ImportField::Title), Some("Title"));
        assert_eq!(mapping.column(ImportField::Platform), Some("Platforms"));
        assert_eq!(mapping.column(ImportField::Tags), Some("genres"));
        assert_eq!(mapping.column(ImportField::Score), Some("user_rating"));
        assert_eq!(mapping.column(ImportField::Status), Some("Labels"));
        assert_eq!(mapping.column(ImportField::Comments), None);
    }

    #[test]
    fn last_write_wins_and_columns_may_be_shared() {
        let mut mapping = ImportMapping::new();
        mapping.set(ImportField::Title, "a");
        mapping.set(ImportField::Title, "b");
        mapping.set(ImportField::Comments, "b");
        assert_eq!(mapping.column(ImportField::Title), Some("b"));
        assert_eq!(mapping.column(ImportField::Comments), Some("b"));
        mapping.clear(ImportField::Title);
        assert_eq!(mapping.column(ImportField::Title), None);
        assert_eq!(mapping.iter().count(), 1);
    }

    #[test]
    fn cycling_passes_through_unmapped() {
        let cols = columns(&["a", "b"]);
        let mut mapping = ImportMapping::new();
        mapping.cycle(ImportField::Score, &cols, true);
        assert_eq!(mapping.column(ImportField::Score), Some("a"));
        mapping.cycle(ImportField::Score, &cols, true);
        assert_eq!(mapping.column(ImportField::Score), Some("b"));
        mapping.cycle(ImportField::Score, &cols, true);
        assert_eq!(mapping.column(ImportField::Score), None);
        mapping.cycle(ImportField::Score, &cols, false);
        assert_eq!(mapping.column(ImportField::Score), Some("b"));
    }
}
