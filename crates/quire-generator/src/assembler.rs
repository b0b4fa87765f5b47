//! Page assembly.
//!
//! Pages are built by splicing text, never by parsing and re-serializing the
//! template or the content. The meta template is split once at its closing
//! body tag; the header fragment and page content go in between.

use std::{
    fs,
    path::{Path, PathBuf},
};

use quire_core::Page;
use thiserror::Error;
use tracing::debug;

/// The single insertion point in the meta template.
pub const INSERTION_MARKER: &str = "\n</body>";

/// Page assembly errors.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The meta template does not contain exactly one insertion marker.
    #[error("template malformed: {0}")]
    TemplateMalformed(String),

    /// A template file could not be read.
    #[error("cannot read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for assembly operations.
pub type Result<T> = std::result::Result<T, AssembleError>;

/// The meta template split at its insertion marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTemplate {
    prefix: String,
    suffix: String,
}

impl MetaTemplate {
    /// Split template text at the insertion marker.
    ///
    /// The prefix keeps the marker's leading newline and the suffix starts with
    /// it, so the newline appears on both sides of the splice.
    pub fn parse(text: &str) -> Result<Self> {
        let mut found = text.match_indices(INSERTION_MARKER).map(|(pos, _)| pos);

        let pos = found.next().ok_or_else(|| {
            AssembleError::TemplateMalformed(format!(
                "insertion marker {INSERTION_MARKER:?} not found"
            ))
        })?;

        if found.next().is_some() {
            return Err(AssembleError::TemplateMalformed(format!(
                "insertion marker {INSERTION_MARKER:?} occurs more than once"
            )));
        }

        Ok(Self {
            prefix: text[..pos + 1].to_string(),
            suffix: text[pos..].to_string(),
        })
    }

    /// Read and split a meta template file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = read(path)?;
        Self::parse(&text).map_err(|e| match e {
            AssembleError::TemplateMalformed(msg) => {
                AssembleError::TemplateMalformed(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Everything up to and including the newline before `</body>`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Everything from the newline before `</body>` to the end.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

/// Script that underlines the navigation entry `nav-{tab}`.
///
/// Does nothing in the browser when the header has no such element.
#[must_use]
pub fn nav_annotation(tab: &str) -> String {
    format!(
        r#"<script>document.getElementById("nav-{tab}").style.textDecoration = "underline";</script>"#
    )
}

/// Splice header and content into the template.
#[must_use]
pub fn assemble(
    template: &MetaTemplate,
    header: &str,
    content: &str,
    nav_tab: Option<&str>,
) -> Page {
    let annotation = nav_tab.map(nav_annotation);

    let mut html = String::with_capacity(
        template.prefix.len()
            + header.len()
            + content.len()
            + annotation.as_ref().map_or(0, String::len)
            + template.suffix.len(),
    );
    html.push_str(&template.prefix);
    html.push_str(header);
    html.push_str(content);
    if let Some(annotation) = &annotation {
        html.push_str(annotation);
    }
    html.push_str(&template.suffix);

    Page::new(html)
}

/// A meta template paired with the site header.
#[derive(Debug, Clone)]
pub struct PageAssembler {
    template: MetaTemplate,
    header: String,
}

impl PageAssembler {
    /// Create an assembler from an already split template.
    #[must_use]
    pub fn new(template: MetaTemplate, header: impl Into<String>) -> Self {
        Self {
            template,
            header: header.into(),
        }
    }

    /// Load the meta template and header fragment from disk.
    pub fn load(meta_path: &Path, header_path: &Path) -> Result<Self> {
        debug!(
            meta = %meta_path.display(),
            header = %header_path.display(),
            "loading templates"
        );
        let template = MetaTemplate::load(meta_path)?;
        let header = read(header_path)?;
        Ok(Self::new(template, header))
    }

    /// Wrap content into a finished page.
    #[must_use]
    pub fn assemble(&self, content: &str, nav_tab: Option<&str>) -> Page {
        assemble(&self.template, &self.header, content, nav_tab)
    }

    /// The split meta template.
    #[must_use]
    pub fn template(&self) -> &MetaTemplate {
        &self.template
    }

    /// The header fragment.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| AssembleError::Io {
        path: path.to_path_buf(),
        source,
    })
}
