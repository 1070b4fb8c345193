//! Whole-file checks run once before any row is transformed.

use super::{fields::FIELD_CATALOG, mapping::ImportMapping, parser::ParsedCsv};

/// Message reported for a file with a header but no data rows.
pub const EMPTY_CSV: &str = "CSV is empty";

/// Collect every problem with `parsed` under `mapping`. An empty list means
/// the import may proceed.
pub fn validate(parsed: &ParsedCsv, mapping: &ImportMapping) -> Vec<String> {
    let mut errors = Vec::new();

    for field in FIELD_CATALOG.into_iter().filter(|field| field.required()) {
        match mapping.column(field) {
            Some(column) if parsed.has_column(column) => {}
            Some(column) => errors.push(format!(
                "Column \"{column}\" mapped to {} is not in the CSV",
                field.label()
            )),
            None => errors.push(format!("Missing required column: {}", field.key())),
        }
    }

    for (field, column) in mapping.iter().filter(|(field, _)| !field.required()) {
        if !parsed.has_column(column) {
            errors.push(format!(
                "Column \"{column}\" mapped to {} is not in the CSV",
                field.label()
            ));
        }
    }

    if parsed.is_empty() {
        errors.push(EMPTY_CSV.to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{fields::ImportField, parser::parse_csv};
    use anyhow::Result;

    fn check(content: &str) -> Result<Vec<String>> {
        let parsed = parse_csv(content)?;
        let mapping = ImportMapping::auto_detect(&parsed.columns);
        Ok(validate(&parsed, &mapping))
    }

    #[test]
    fn well_formed_file_passes() -> Result<()> {
        assert!(check("title,platform\nHades,PC\n")?.is_empty());
        Ok(())
    }

    #[test]
    fn missing_platform_is_reported() -> Result<()> {
        let errors = check("title,genres\nHades,Action\n")?;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("platform"));
        Ok(())
    }

    #[test]
    fn empty_file_is_reported_with_other_errors() -> Result<()> {
        let errors = check("title,platform\n")?;
        assert_eq!(errors, vec![EMPTY_CSV.to_string()]);

        let errors = check("genres\n")?;
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("title"));
        assert!(errors[1].contains("platform"));
        assert_eq!(errors[2], EMPTY_CSV);
        Ok(())
    }

    #[test]
    fn stale_mapping_is_reported() -> Result<()> {
        let parsed = parse_csv("title,platform\nHades,PC\n")?;
        let mut mapping = ImportMapping::auto_detect(&parsed.columns);
        mapping.set(ImportField::Score, "rating");
        let errors = validate(&parsed, &mapping);
        assert_eq!(errors, vec!["Column \"rating\" mapped to Score is not in the CSV"]);
        Ok(())
    }
}
