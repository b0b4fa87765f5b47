//! Collection indexing.
//!
//! The indexer turns a collection of fragments into listing entries sorted by
//! date, newest first. Where the title and preview come from is decided by a
//! [`MetadataSource`]; everything else is shared.

use std::{cmp::Ordering, collections::HashSet};

use chrono::NaiveDate;
use quire_core::{ContentFragment, ContentMetadata, IndexEntry, SideTable, config::MetadataPolicy};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    metadata::{self, MetadataError, MetadataField},
    repository::{ContentRepository, RepositoryError},
};

/// Display format of fragment dates, e.g. `Jan 5, 2024`.
pub const DATE_FORMAT: &str = "%b %d, %Y";

/// Indexing errors.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Title, date or table entry missing.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Date not in `Mon D, YYYY` form.
    #[error("{key}: cannot parse date {date:?} as \"Mon D, YYYY\": {source}")]
    DateParse {
        key: String,
        date: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Date parses only by ignoring the separating whitespace.
    #[error("{key}: date {date:?} is not spaced as \"Mon D, YYYY\"")]
    DateShape { key: String, date: String },

    /// Two fragments in one collection share a key.
    #[error("duplicate key in collection: {0}")]
    DuplicateKey(String),

    /// Reading the collection failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl IndexError {
    /// Whether the error concerns a single item's metadata, as opposed to
    /// the collection as a whole.
    #[must_use]
    pub fn is_item_error(&self) -> bool {
        matches!(
            self,
            Self::Metadata(_) | Self::DateParse { .. } | Self::DateShape { .. }
        )
    }
}

/// Result type for indexing.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Supplies listing metadata for a fragment.
pub trait MetadataSource {
    /// Title, date and preview for `fragment`.
    fn metadata(&self, fragment: &ContentFragment) -> metadata::Result<ContentMetadata>;
}

impl<S: MetadataSource + ?Sized> MetadataSource for Box<S> {
    fn metadata(&self, fragment: &ContentFragment) -> metadata::Result<ContentMetadata> {
        (**self).metadata(fragment)
    }
}

impl<S: MetadataSource + ?Sized> MetadataSource for &S {
    fn metadata(&self, fragment: &ContentFragment) -> metadata::Result<ContentMetadata> {
        (**self).metadata(fragment)
    }
}

/// Metadata parsed out of the fragment markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsedMetadata;

impl MetadataSource for ParsedMetadata {
    fn metadata(&self, fragment: &ContentFragment) -> metadata::Result<ContentMetadata> {
        metadata::extract_metadata(fragment)
    }
}

/// Titles and previews looked up in a side table.
///
/// Entries without a date fall back to the fragment's own date element.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    table: SideTable,
}

impl TableMetadata {
    /// Use `table` as the metadata source.
    #[must_use]
    pub fn new(table: SideTable) -> Self {
        Self { table }
    }

    /// The underlying table.
    #[must_use]
    pub fn table(&self) -> &SideTable {
        &self.table
    }
}

impl MetadataSource for TableMetadata {
    fn metadata(&self, fragment: &ContentFragment) -> metadata::Result<ContentMetadata> {
        let entry = self
            .table
            .get(&fragment.key)
            .ok_or_else(|| MetadataError::missing(&fragment.key, MetadataField::TableEntry))?;

        let date = match &entry.date {
            Some(date) => date.clone(),
            None => metadata::extract_date(fragment)?,
        };

        Ok(ContentMetadata {
            title: entry.title.clone(),
            date,
            preview: entry.preview.clone(),
        })
    }
}

/// Parse a display date such as `Jan 5, 2024`.
///
/// Whitespace is required between month and day and after the comma;
/// `Jan 5,2024` and `Jan5, 2024` are rejected.
pub fn parse_display_date(key: &str, date: &str) -> Result<NaiveDate> {
    let parsed =
        NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|source| IndexError::DateParse {
            key: key.to_string(),
            date: date.to_string(),
            source,
        })?;

    let spaced = date.split_once(',').is_some_and(|(month_day, year)| {
        month_day.trim().contains(char::is_whitespace) && year.starts_with(char::is_whitespace)
    });
    if !spaced {
        return Err(IndexError::DateShape {
            key: key.to_string(),
            date: date.to_string(),
        });
    }

    Ok(parsed)
}

/// Sort entries newest first.
///
/// The sort is stable: entries with the same date keep their relative order.
/// Fails on the first date that does not parse.
pub fn sort_descending_by_date(entries: Vec<IndexEntry>) -> Result<Vec<IndexEntry>> {
    let mut dated = entries
        .into_iter()
        .map(|entry| Ok((parse_display_date(&entry.key, &entry.metadata.date)?, entry)))
        .collect::<Result<Vec<_>>>()?;

    dated.sort_by(|(a, _), (b, _)| newest_first(a, b));
    Ok(dated.into_iter().map(|(_, entry)| entry).collect())
}

fn newest_first(a: &NaiveDate, b: &NaiveDate) -> Ordering {
    b.cmp(a)
}

/// Entries of an indexed collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Entries sorted newest first.
    pub entries: Vec<IndexEntry>,

    /// Keys dropped because their metadata was invalid.
    pub skipped: Vec<String>,
}

/// Indexes a collection with a fixed metadata source.
#[derive(Debug, Clone)]
pub struct Indexer<S> {
    source: S,
    policy: MetadataPolicy,
}

impl<S: MetadataSource> Indexer<S> {
    /// Create an indexer that aborts on invalid metadata.
    pub fn new(source: S) -> Self {
        Self {
            source,
            policy: MetadataPolicy::Abort,
        }
    }

    /// Set what happens to items with missing or malformed metadata.
    #[must_use]
    pub fn with_policy(mut self, policy: MetadataPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The metadata source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Index fragments, in the order given.
    ///
    /// Duplicate keys are always an error. Missing metadata and malformed
    /// dates abort or skip the item according to the policy.
    pub fn index(&self, fragments: &[ContentFragment]) -> Result<IndexOutcome> {
        let mut seen = HashSet::new();
        for fragment in fragments {
            if !seen.insert(fragment.key.as_str()) {
                return Err(IndexError::DuplicateKey(fragment.key.clone()));
            }
        }

        let mut dated = Vec::with_capacity(fragments.len());
        let mut skipped = Vec::new();

        for fragment in fragments {
            match self.entry(fragment) {
                Ok(item) => dated.push(item),
                Err(err) if self.policy == MetadataPolicy::Skip => {
                    warn!(key = %fragment.key, error = %err, "skipping item with invalid metadata");
                    skipped.push(fragment.key.clone());
                }
                Err(err) => return Err(err),
            }
        }

        dated.sort_by(|(a, _), (b, _)| newest_first(a, b));
        let entries: Vec<IndexEntry> = dated.into_iter().map(|(_, entry)| entry).collect();

        debug!(entries = entries.len(), skipped = skipped.len(), "indexed collection");
        Ok(IndexOutcome { entries, skipped })
    }

    /// Every problem that indexing `fragments` would run into, regardless of
    /// the policy.
    pub fn validate(&self, fragments: &[ContentFragment]) -> Vec<IndexError> {
        let mut seen = HashSet::new();
        let mut problems = Vec::new();

        for fragment in fragments {
            if !seen.insert(fragment.key.as_str()) {
                problems.push(IndexError::DuplicateKey(fragment.key.clone()));
                continue;
            }
            if let Err(err) = self.entry(fragment) {
                problems.push(err);
            }
        }

        problems
    }

    /// Index every fragment in a repository, in key order.
    pub fn index_repository(&self, repository: &dyn ContentRepository) -> Result<IndexOutcome> {
        let fragments = repository.fragments()?;
        self.index(&fragments)
    }

    fn entry(&self, fragment: &ContentFragment) -> Result<(NaiveDate, IndexEntry)> {
        let metadata = self.source.metadata(fragment)?;
        let date = parse_display_date(&fragment.key, &metadata.date)?;
        Ok((date, IndexEntry::new(fragment.key.clone(), metadata)))
    }
}
