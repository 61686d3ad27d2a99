use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

/// Table compiled into the binary, used when no word file can be loaded
static BUILTIN_TABLE: Lazy<CompoundWordTable> = Lazy::new(|| {
    CompoundWordTable::from_json(include_str!("../../compound_words.json"))
        .unwrap_or_else(|_| CompoundWordTable::from_entries(Vec::new()))
});

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read compound word file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid compound word file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("compound word file contains no entries")]
    Empty,
}

/// A pair of fragments and the word they form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundWordEntry {
    pub first: String,
    pub second: String,
    pub compound: String,
}

impl CompoundWordEntry {
    #[cfg(test)]
    pub fn new(first: &str, second: &str, compound: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
            compound: compound.to_string(),
        }
    }

    /// True when `a` and `b` are this entry's fragments, in either order
    pub fn matches(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.second == a && self.first == b)
    }
}

/// Ordered, read-only list of compound words
#[derive(Debug, Clone)]
pub struct CompoundWordTable {
    entries: Vec<CompoundWordEntry>,
}

impl CompoundWordTable {
    /// Load the table from a JSON file holding an array of entries
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let content = fs::read_to_string(path).await?;
        let table = Self::from_json(&content)?;
        if table.is_empty() {
            return Err(TableError::Empty);
        }

        tracing::info!("Loaded {} compound words", table.len());

        Ok(table)
    }

    pub fn from_json(content: &str) -> Result<Self, TableError> {
        let entries: Vec<CompoundWordEntry> = serde_json::from_str(content)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<CompoundWordEntry>) -> Self {
        let mut seen = HashSet::new();
        for entry in &entries {
            for part in [&entry.first, &entry.second] {
                if !seen.insert(part.as_str()) {
                    tracing::warn!(
                        "Fragment '{}' appears in more than one compound word; matches may be ambiguous",
                        part
                    );
                }
            }
        }

        Self { entries }
    }

    /// The table shipped with the binary
    pub fn builtin() -> Self {
        BUILTIN_TABLE.clone()
    }

    /// Find the compound word formed by two fragments, in either order
    pub fn lookup(&self, a: &str, b: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.matches(a, b))
            .map(|entry| entry.compound.as_str())
    }

    pub fn entries(&self) -> &[CompoundWordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
