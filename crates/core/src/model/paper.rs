use serde::{Deserialize, Serialize};
use std::fmt;

/// Year used when a question carries no year tag.
pub const DEFAULT_YEAR: &str = "Unknown";
/// Slot used when a question carries no slot tag.
pub const DEFAULT_SLOT: &str = "Slot 1";

/// `(year, slot)` grouping key for previous-year papers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaperKey {
    year: String,
    slot: String,
}

impl PaperKey {
    #[must_use]
    pub fn new(year: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            slot: slot.into(),
        }
    }

    /// Build a key from optional tags, falling back to the defaults.
    #[must_use]
    pub fn from_parts(year: Option<&str>, slot: Option<&str>) -> Self {
        Self::new(year.unwrap_or(DEFAULT_YEAR), slot.unwrap_or(DEFAULT_SLOT))
    }

    #[must_use]
    pub fn year(&self) -> &str {
        &self.year
    }

    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Slug form used in test ids, e.g. `2023-slot-1`.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}-{}", self.year, self.slot)
            .to_ascii_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl fmt::Display for PaperKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.year, self.slot)
    }
}

/// Read-only summary of one previous-year paper in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperDescriptor {
    pub key: PaperKey,
    pub question_count: usize,
}

impl PaperDescriptor {
    #[must_use]
    pub fn year(&self) -> &str {
        self.key.year()
    }

    #[must_use]
    pub fn slot(&self) -> &str {
        self.key.slot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_parts() {
        let key = PaperKey::from_parts(None, None);
        assert_eq!(key.year(), "Unknown");
        assert_eq!(key.slot(), "Slot 1");
    }

    #[test]
    fn slug_is_lowercase_and_dashed() {
        assert_eq!(PaperKey::new("2023", "Slot 2").slug(), "2023-slot-2");
    }
}
