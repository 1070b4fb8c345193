//! The fixed catalog of importable fields.

use std::fmt;

/// A record field that can be filled from a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImportField {
    /// Display title.
    Title,
    /// Platform.
    Platform,
    /// Release date.
    ReleaseDate,
    /// Cover art URL.
    CoverImage,
    /// Status label.
    Status,
    /// Rating.
    Score,
    /// Free text.
    Comments,
    /// Comma-separated tags.
    Tags,
}

/// Every importable field in dialog order.
pub const FIELD_CATALOG: [ImportField; 8] = [
    ImportField::Title,
    ImportField::Platform,
    ImportField::ReleaseDate,
    ImportField::CoverImage,
    ImportField::Status,
    ImportField::Score,
    ImportField::Comments,
    ImportField::Tags,
];

impl ImportField {
    /// Stable key, also used for name-based auto-mapping.
    pub fn key(self) -> &'static str {
        match self {
            ImportField::Title => "title",
            ImportField::Platform => "platform",
            ImportField::ReleaseDate => "releaseDate",
            ImportField::CoverImage => "coverImage",
            ImportField::Status => "status",
            ImportField::Score => "score",
            ImportField::Comments => "comments",
            ImportField::Tags => "tags",
        }
    }

    /// Label shown next to the column picker.
    pub fn label(self) -> &'static str {
        match self {
            ImportField::Title => "Title",
            ImportField::Platform => "Platform",
            ImportField::ReleaseDate => "Release date",
            ImportField::CoverImage => "Cover image URL",
            ImportField::Status => "Status",
            ImportField::Score => "Score",
            ImportField::Comments => "Comments",
            ImportField::Tags => "Tags",
        }
    }

    /// Whether an import cannot proceed without this field.
    pub fn required(self) -> bool {
        matches!(self, ImportField::Title | ImportField::Platform)
    }

    /// Column names used by common tracker exports for this field.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ImportField::Title => &["name", "game", "gametitle"],
            ImportField::Platform => &["platforms", "system", "console"],
            ImportField::ReleaseDate => &["released", "releasedon"],
            ImportField::CoverImage => &["imageurlmedium", "imageurl", "cover", "coverurl"],
            ImportField::Status => &["labels", "label", "state"],
            ImportField::Score => &["userrating", "rating"],
            ImportField::Comments => &["descriptionshort", "notes", "comment"],
            ImportField::Tags => &["genres", "genre", "tag"],
        }
    }
}

impl fmt::Display for ImportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
