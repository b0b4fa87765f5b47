//! Listing metadata extraction from HTML fragments.
//!
//! A fragment is parsed once into an immutable tree. The title, the date and
//! the preview text are each selected from that tree; nothing is removed from
//! it, so the steps can run in any order.

use std::fmt;

use quire_core::{ContentFragment, ContentMetadata};
use scraper::{ElementRef, Html, Node, node::Element};
use thiserror::Error;

/// Maximum number of characters kept in a preview, before the ellipsis.
pub const PREVIEW_LENGTH: usize = 140;

/// Appended to every preview, truncated or not.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// `id` attribute of the element holding a fragment's date.
pub const DATE_ELEMENT_ID: &str = "date";

/// Elements whose text never appears in a preview.
const PREVIEW_EXCLUDED: [&str; 8] = ["h1", "h2", "h3", "h4", "h5", "h6", "script", "style"];

/// The piece of metadata that could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    /// The `<title>` element.
    Title,
    /// The element with `id="date"`.
    Date,
    /// The fragment's row in a side table.
    TableEntry,
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("<title> element"),
            Self::Date => write!(f, "element with id=\"{DATE_ELEMENT_ID}\""),
            Self::TableEntry => f.write_str("side table entry"),
        }
    }
}

/// Metadata extraction errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Required metadata is absent.
    #[error("{key}: missing {field}")]
    Missing { key: String, field: MetadataField },
}

impl MetadataError {
    /// Create a missing-metadata error.
    pub fn missing(key: impl Into<String>, field: MetadataField) -> Self {
        Self::Missing {
            key: key.into(),
            field,
        }
    }
}

/// Result type for metadata extraction.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Extract title, date and preview from a fragment.
pub fn extract_metadata(fragment: &ContentFragment) -> Result<ContentMetadata> {
    let document = Html::parse_document(&fragment.text);
    let root = document.root_element();

    let title = find_title(root)
        .ok_or_else(|| MetadataError::missing(&fragment.key, MetadataField::Title))?;
    let date = find_date(root)
        .ok_or_else(|| MetadataError::missing(&fragment.key, MetadataField::Date))?;

    Ok(ContentMetadata {
        title: title.text().collect(),
        date: element_date(date),
        preview: truncate_preview(&visible_text(root, &[title, date])),
    })
}

/// Extract only the date from a fragment.
pub fn extract_date(fragment: &ContentFragment) -> Result<String> {
    let document = Html::parse_document(&fragment.text);
    find_date(document.root_element())
        .map(element_date)
        .ok_or_else(|| MetadataError::missing(&fragment.key, MetadataField::Date))
}

/// Cut text to [`PREVIEW_LENGTH`] characters and append [`PREVIEW_ELLIPSIS`].
#[must_use]
pub fn truncate_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_LENGTH).collect();
    preview.push_str(PREVIEW_ELLIPSIS);
    preview
}

/// Join the trimmed, non-empty text nodes under `root` with single spaces.
///
/// Headings, scripts, styles and the `excluded` elements are skipped along
/// with everything inside them.
#[must_use]
pub fn visible_text(root: ElementRef<'_>, excluded: &[ElementRef<'_>]) -> String {
    let mut parts = Vec::new();
    collect_text(root, excluded, &mut parts);
    parts.join(" ")
}

fn collect_text<'a>(
    element: ElementRef<'a>,
    excluded: &[ElementRef<'_>],
    parts: &mut Vec<&'a str>,
) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
            Node::Element(el) if PREVIEW_EXCLUDED.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child)
                    && !excluded.iter().any(|ex| ex.id() == child.id())
                {
                    collect_text(child, excluded, parts);
                }
            }
            _ => {}
        }
    }
}

fn find_title(root: ElementRef<'_>) -> Option<ElementRef<'_>> {
    find_element(root, |el| el.name() == "title")
}

fn find_date(root: ElementRef<'_>) -> Option<ElementRef<'_>> {
    find_element(root, |el| el.id() == Some(DATE_ELEMENT_ID))
}

/// First element in document order matching `predicate`.
fn find_element<'a>(
    root: ElementRef<'a>,
    predicate: impl Fn(&Element) -> bool,
) -> Option<ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| predicate(el.value()))
}

fn element_date(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str) -> ContentFragment {
        ContentFragment::new("post.html", text)
    }

    #[test]
    fn test_extracts_title_date_and_preview() {
        let meta = extract_metadata(&fragment(
            r#"<title>Hello</title><p id="date">Jan 5, 2024</p><h1>Ignored</h1><p>Body text.</p>"#,
        ))
        .unwrap();

        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.date, "Jan 5, 2024");
        assert!(meta.preview.contains("Body text."));
        assert!(!meta.preview.contains("Ignored"));
        assert!(!meta.preview.contains("Jan 5, 2024"));
        assert!(!meta.preview.contains("Hello"));
    }

    #[test]
    fn test_short_preview_still_gets_ellipsis() {
        let meta = extract_metadata(&fragment(
            r#"<title>T</title><span id="date">Mar 5, 2024</span><p>Short.</p>"#,
        ))
        .unwrap();

        assert_eq!(meta.preview, "Short....");
    }

    #[test]
    fn test_empty_body_preview_is_just_ellipsis() {
        let meta = extract_metadata(&fragment(
            r#"<title>T</title><p id="date">Mar 5, 2024</p><h2>Only a heading</h2>"#,
        ))
        .unwrap();

        assert_eq!(meta.preview, "...");
    }

    #[test]
    fn test_long_preview_truncated_to_limit() {
        let body = "word ".repeat(100);
        let meta = extract_metadata(&fragment(&format!(
            r#"<title>T</title><p id="date">Mar 5, 2024</p><p>{body}</p>"#
        )))
        .unwrap();

        assert_eq!(meta.preview.chars().count(), PREVIEW_LENGTH + PREVIEW_ELLIPSIS.len());
        assert!(meta.preview.starts_with("word word"));
        assert!(meta.preview.ends_with("..."));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let text = "é".repeat(200);
        let preview = truncate_preview(&text);

        assert_eq!(preview.chars().count(), PREVIEW_LENGTH + 3);
        assert!(preview.starts_with("éé"));
    }

    #[test]
    fn test_text_nodes_are_trimmed_and_joined() {
        let meta = extract_metadata(&fragment(
            "<title>T</title><p id=\"date\">Mar 5, 2024</p>\n<div>\n  <p>  One  </p>\n  <p><em>Two</em> three</p>\n</div>",
        ))
        .unwrap();

        assert_eq!(meta.preview, "One Two three...");
    }

    #[test]
    fn test_nested_headings_and_scripts_are_excluded() {
        let meta = extract_metadata(&fragment(
            r#"<title>T</title><p id="date">Mar 5, 2024</p>
            <article><h3>Sub <em>heading</em></h3><p>Kept</p>
            <script>var hidden = 1;</script><style>p { color: red }</style></article>"#,
        ))
        .unwrap();

        assert_eq!(meta.preview, "Kept...");
    }

    #[test]
    fn test_only_first_date_element_is_removed() {
        let meta = extract_metadata(&fragment(
            r#"<title>T</title><p id="date">Mar 5, 2024</p><p id="date">Apr 1, 2024</p>"#,
        ))
        .unwrap();

        assert_eq!(meta.date, "Mar 5, 2024");
        assert_eq!(meta.preview, "Apr 1, 2024...");
    }

    #[test]
    fn test_date_text_is_trimmed() {
        let date = extract_date(&fragment(r#"<time id="date">
            Jan 5, 2024
        </time>"#))
        .unwrap();

        assert_eq!(date, "Jan 5, 2024");
    }

    #[test]
    fn test_missing_title() {
        let err = extract_metadata(&fragment(r#"<p id="date">Jan 5, 2024</p>"#)).unwrap_err();

        let MetadataError::Missing { key, field } = &err;
        assert_eq!(key, "post.html");
        assert_eq!(*field, MetadataField::Title);
        assert!(err.to_string().contains("<title>"));
    }

    #[test]
    fn test_missing_date() {
        let err = extract_metadata(&fragment("<title>T</title><p>No date.</p>")).unwrap_err();

        assert!(matches!(
            err,
            MetadataError::Missing {
                field: MetadataField::Date,
                ..
            }
        ));
        assert!(extract_date(&fragment("<p>nothing</p>")).is_err());
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let source = fragment(r#"<title>A</title><p id="date">Jan 5, 2024</p><p>Body</p>"#);

        assert_eq!(extract_metadata(&source).unwrap(), extract_metadata(&source).unwrap());
    }
}
