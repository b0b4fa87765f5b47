//! Content types and structures.

use std::{collections::BTreeMap, fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Raw markup of a single page or post.
///
/// The key is the fragment's file name. It doubles as the output file name and
/// as the link target in generated listings, so it is unique per collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFragment {
    /// File-name-like identifier.
    pub key: String,

    /// Raw HTML text, never modified.
    pub text: String,
}

impl ContentFragment {
    /// Create a new fragment.
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Metadata derived from a fragment for use in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// Document title.
    pub title: String,

    /// Display date, formatted as `"Mon D, YYYY"`.
    pub date: String,

    /// Plain-text excerpt, always ending in `"..."`.
    pub preview: String,
}

/// One row of a collection listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Fragment key the entry links to.
    pub key: String,

    /// Metadata shown for the entry.
    pub metadata: ContentMetadata,
}

impl IndexEntry {
    /// Create a new index entry.
    pub fn new(key: impl Into<String>, metadata: ContentMetadata) -> Self {
        Self {
            key: key.into(),
            metadata,
        }
    }
}

/// A finished HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    html: String,
}

impl Page {
    /// Wrap an already assembled document.
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Borrow the document text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.html
    }

    /// Document bytes, as written to disk.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.html.as_bytes()
    }

    /// Consume the page, returning the document text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.html
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

/// Precomputed listing metadata for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Listing title.
    pub title: String,

    /// Listing preview text, used verbatim.
    pub preview: String,

    /// Display date. When absent the date is read from the fragment itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Mapping from fragment file name to precomputed listing metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SideTable {
    entries: BTreeMap<String, TableEntry>,
}

impl SideTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a side table from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::side_table(path, "file not found"));
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CoreError::side_table(path, e.to_string()))
    }

    /// Parse a side table from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the table as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Insert or replace the entry for a file.
    pub fn insert(&mut self, key: impl Into<String>, entry: TableEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Look up the entry for a file.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TableEntry> {
        self.entries.get(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<IndexEntry> for SideTable {
    fn from_iter<I: IntoIterator<Item = IndexEntry>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|entry| {
                let table_entry = TableEntry {
                    title: entry.metadata.title,
                    preview: entry.metadata.preview,
                    date: Some(entry.metadata.date),
                };
                (entry.key, table_entry)
            })
            .collect();
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_round_trips_text() {
        let page = Page::new("<html></html>");
        assert_eq!(page.as_str(), "<html></html>");
        assert_eq!(page.as_bytes(), b"<html></html>");
        assert_eq!(page.to_string(), "<html></html>");
        assert_eq!(page.into_string(), "<html></html>");
    }

    #[test]
    fn test_side_table_from_json() {
        let json = r#"{
            "first.html": { "title": "First", "preview": "Hello..." },
            "second.html": { "title": "Second", "preview": "Bye...", "date": "Mar 5, 2024" }
        }"#;

        let table = SideTable::from_json(json).unwrap();
        assert_eq!(table.len(), 2);

        let first = table.get("first.html").unwrap();
        assert_eq!(first.title, "First");
        assert!(first.date.is_none());

        let second = table.get("second.html").unwrap();
        assert_eq!(second.date.as_deref(), Some("Mar 5, 2024"));
        assert!(table.get("third.html").is_none());
    }

    #[test]
    fn test_side_table_rejects_non_object() {
        assert!(SideTable::from_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_side_table_load_missing_file() {
        let result = SideTable::load(Path::new("/nonexistent/blog.json"));
        assert!(result.unwrap_err().to_string().contains("file not found"));
    }

    #[test]
    fn test_side_table_from_entries() {
        let table: SideTable = vec![IndexEntry::new(
            "post.html",
            ContentMetadata {
                title: "Post".to_string(),
                date: "Jan 5, 2024".to_string(),
                preview: "Body...".to_string(),
            },
        )]
        .into_iter()
        .collect();

        let json = table.to_json().unwrap();
        let reloaded = SideTable::from_json(&json).unwrap();
        assert_eq!(reloaded, table);
        assert_eq!(
            reloaded.get("post.html").unwrap().date.as_deref(),
            Some("Jan 5, 2024")
        );
    }
}
