//! Tag registry and name normalisation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised by registry edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// Blank after trimming.
    #[error("Tag name cannot be empty")]
    Empty,
    /// Collides (ignoring case) with a tag already registered.
    #[error("Tag already exists as \"{existing}\"")]
    Duplicate {
        /// The registered spelling.
        existing: String,
    },
    /// The tag being edited is not registered.
    #[error("Unknown tag \"{0}\"")]
    Unknown(String),
}

/// Trim surrounding whitespace from a candidate tag.
pub fn normalize_tag(tag: &str) -> &str {
    tag.trim()
}

/// Find the registered spelling of `candidate`, ignoring case.
pub fn find_existing_tag<'a, I>(tags: I, candidate: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let needle = candidate.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    tags.into_iter()
        .find(|tag| tag.to_lowercase() == needle)
        .map(String::as_str)
}

/// Case-insensitive ordering, ties broken by the exact spelling.
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sorted copy of `tags`.
pub fn sort_tags(tags: &[String]) -> Vec<String> {
    let mut sorted = tags.to_vec();
    sorted.sort_by(|a, b| compare_tags(a, b));
    sorted
}

/// The set of tag names known to the application, unique ignoring case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRegistry {
    tags: Vec<String>,
}

impl TagRegistry {
    /// Build a registry, silently skipping blanks and case-duplicates.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::default();
        for name in names {
            let _ = registry.add(name.as_ref());
        }
        registry
    }

    /// Registered tags in insertion order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Registered tags ordered for display.
    pub fn sorted(&self) -> Vec<String> {
        sort_tags(&self.tags)
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Registered spelling of `name`, ignoring case.
    pub fn find(&self, name: &str) -> Option<&str> {
        find_existing_tag(&self.tags, name)
    }

    /// Exact (case-sensitive) membership.
    pub fn contains(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag == name)
    }

    /// Register a new tag and return the stored spelling.
    pub fn add(&mut self, name: &str) -> Result<String, TagError> {
        let normalized = normalize_tag(name);
        if normalized.is_empty() {
            return Err(TagError::Empty);
        }
        if let Some(existing) = self.find(normalized) {
            return Err(TagError::Duplicate {
                existing: existing.to_string(),
            });
        }
        self.tags.push(normalized.to_string());
        Ok(normalized.to_string())
    }

    /// Rename `from` to `to`, keeping its position.
    ///
    /// A pure case change of the same tag is accepted.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<String, TagError> {
        let normalized = normalize_tag(to);
        if normalized.is_empty() {
            return Err(TagError::Empty);
        }
        let position = self
            .tags
            .iter()
            .position(|tag| tag == from)
            .ok_or_else(|| TagError::Unknown(from.to_string()))?;
        let clash = self
            .tags
            .iter()
            .enumerate()
            .find(|(idx, tag)| *idx != position && tag.to_lowercase() == normalized.to_lowercase());
        if let Some((_, existing)) = clash {
            return Err(TagError::Duplicate {
                existing: existing.clone(),
            });
        }
        self.tags[position] = normalized.to_string();
        Ok(normalized.to_string())
    }

    /// Remove `name` (exact match).
    pub fn remove(&mut self, name: &str) -> Result<(), TagError> {
        let before = self.tags.len();
        self.tags.retain(|tag| tag != name);
        if self.tags.len() == before {
            return Err(TagError::Unknown(name.to_string()));
        }
        Ok(())
    }

    /// Rewrite `names` to their registered spellings, registering any name
    /// not seen before. Blanks are dropped and case-duplicates collapse to
    /// the first occurrence. Returns how many tags were newly registered.
    pub fn adopt(&mut self, names: &mut Vec<String>) -> usize {
        let mut registered = 0;
        let mut adopted: Vec<String> = Vec::with_capacity(names.len());
        for name in names.drain(..) {
            let stored = match self.find(&name) {
                Some(existing) => existing.to_string(),
                None => match self.add(&name) {
                    Ok(stored) => {
                        registered += 1;
                        stored
                    }
                    Err(_) => continue,
                },
            };
            if !adopted.contains(&stored) {
                adopted.push(stored);
            }
        }
        *names = adopted;
        registered
    }
}
