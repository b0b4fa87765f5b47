//! Site configuration management.

use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for Quire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source, template and output locations.
    #[serde(default)]
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Loose pages written to the output root.
    #[serde(default, rename = "page")]
    pub pages: Vec<PageConfig>,

    /// Content collections.
    #[serde(default, rename = "collection")]
    pub collections: Vec<CollectionConfig>,

    /// Directory relative paths are resolved against.
    ///
    /// Set to the config file's parent directory on load.
    #[serde(skip)]
    pub root: PathBuf,
}

/// Site layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory holding content fragments.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Directory holding the meta and header templates.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Output directory for generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Meta template file name, inside `templates_dir`.
    #[serde(default = "default_meta_template")]
    pub meta_template: String,

    /// Header fragment file name, inside `templates_dir`.
    #[serde(default = "default_header_template")]
    pub header_template: String,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Write an empty `.nojekyll` marker into the output root.
    #[serde(default = "default_true")]
    pub nojekyll: bool,

    /// Files copied byte-for-byte from the source dir to the output dir.
    #[serde(default)]
    pub copy: Vec<String>,

    /// What to do with fragments whose metadata is missing or malformed.
    #[serde(default)]
    pub on_invalid_metadata: MetadataPolicy,
}

/// Handling of fragments with missing or malformed listing metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataPolicy {
    /// Fail the whole build.
    #[default]
    Abort,
    /// Log a warning and leave the item out of the listing.
    Skip,
}

/// A page assembled from a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Path of the fragment, relative to the source dir.
    pub file: String,

    /// Navigation entry to mark active.
    #[serde(default)]
    pub tab: Option<String>,
}

/// Where a collection's listing metadata comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSourceKind {
    /// Parse each fragment's title, date and body.
    #[default]
    Parsed,
    /// Look titles and previews up in a JSON side table.
    Table,
}

/// Layout of a collection's generated listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStyle {
    /// Paragraph per item, showing the date.
    #[default]
    Dated,
    /// Bullet-less list items, no date.
    Compact,
}

/// A directory of fragments sharing a navigation tab and an optional index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection name, also the default directory.
    pub name: String,

    /// Directory relative to both source and output dirs.
    #[serde(default)]
    pub dir: Option<String>,

    /// Navigation entry to mark active on every page of the collection.
    #[serde(default)]
    pub tab: Option<String>,

    /// Whether to generate a listing page.
    #[serde(default = "default_true")]
    pub index: bool,

    /// Listing page `<title>`.
    #[serde(default)]
    pub title: Option<String>,

    /// Listing page heading.
    #[serde(default = "default_heading")]
    pub heading: String,

    /// Metadata source for the listing.
    #[serde(default)]
    pub metadata: MetadataSourceKind,

    /// Side table path relative to the config root, for `metadata = "table"`.
    #[serde(default)]
    pub table: Option<String>,

    /// Listing layout.
    #[serde(default)]
    pub listing: ListingStyle,

    /// Replacement item template using `{{ key }}`, `{{ title }}`, `{{ date }}`
    /// and `{{ preview }}`.
    #[serde(default)]
    pub item_template: Option<String>,

    /// Name of the generated listing file.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl CollectionConfig {
    /// Directory of the collection, relative to source and output dirs.
    #[must_use]
    pub fn dir(&self) -> &str {
        self.dir.as_deref().unwrap_or(&self.name)
    }

    /// File names left out of the collection's pages.
    ///
    /// Only an indexed collection reserves its listing file name.
    #[must_use]
    pub fn excluded_files(&self) -> Vec<&str> {
        if self.index {
            vec![self.index_file.as_str()]
        } else {
            Vec::new()
        }
    }

    /// Listing page title, defaulting to the capitalized collection name.
    #[must_use]
    pub fn title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

// Default value functions
fn default_source_dir() -> String {
    "src".to_string()
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_output_dir() -> String {
    "docs".to_string()
}

fn default_meta_template() -> String {
    "meta.html".to_string()
}

fn default_header_template() -> String {
    "header.html".to_string()
}

fn default_heading() -> String {
    "Posts".to_string()
}

fn default_index_file() -> String {
    "index.html".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            templates_dir: default_templates_dir(),
            output_dir: default_output_dir(),
            meta_template: default_meta_template(),
            header_template: default_header_template(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            nojekyll: true,
            copy: Vec::new(),
            on_invalid_metadata: MetadataPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.root = config_root(path);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `QUIRE__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(::config::Environment::with_prefix("QUIRE").separator("__"))
            .build()?;

        let mut config: Config = settings.try_deserialize()?;
        config.root = config_root(path);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string rooted at `root`.
    pub fn from_toml_str(content: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.root = root.into();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("site.source_dir", &self.site.source_dir),
            ("site.templates_dir", &self.site.templates_dir),
            ("site.output_dir", &self.site.output_dir),
            ("site.meta_template", &self.site.meta_template),
            ("site.header_template", &self.site.header_template),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::config(format!("{field} cannot be empty")));
            }
        }

        let mut files = HashSet::new();
        for page in &self.pages {
            validate_relative(&page.file, "page.file")?;
            if !files.insert(page.file.as_str()) {
                return Err(CoreError::config(format!(
                    "page '{}' is listed more than once",
                    page.file
                )));
            }
        }

        for file in &self.build.copy {
            validate_relative(file, "build.copy")?;
        }

        let mut dirs = HashSet::new();
        for collection in &self.collections {
            if collection.name.trim().is_empty() {
                return Err(CoreError::config("collection.name cannot be empty"));
            }
            validate_relative(collection.dir(), "collection.dir")?;
            if !dirs.insert(collection.dir()) {
                return Err(CoreError::config(format!(
                    "collection dir '{}' is used more than once",
                    collection.dir()
                )));
            }
            if collection.index_file.trim().is_empty() {
                return Err(CoreError::config(format!(
                    "collection '{}': index_file cannot be empty",
                    collection.name
                )));
            }
            if collection.metadata == MetadataSourceKind::Table && collection.table.is_none() {
                return Err(CoreError::config(format!(
                    "collection '{}': metadata = \"table\" requires a table path",
                    collection.name
                )));
            }
            if collection.table.is_some() && collection.metadata != MetadataSourceKind::Table {
                tracing::warn!(
                    collection = %collection.name,
                    "table is set but metadata is not \"table\"; the table is ignored"
                );
            }
        }

        Ok(())
    }

    /// Resolve a path relative to the config root.
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Absolute source directory.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.site.source_dir)
    }

    /// Absolute output directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.site.output_dir)
    }

    /// Absolute path of the meta template.
    #[must_use]
    pub fn meta_template_path(&self) -> PathBuf {
        self.resolve(&self.site.templates_dir)
            .join(&self.site.meta_template)
    }

    /// Absolute path of the header fragment.
    #[must_use]
    pub fn header_template_path(&self) -> PathBuf {
        self.resolve(&self.site.templates_dir)
            .join(&self.site.header_template)
    }

    /// Find a collection by name.
    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }
}

fn config_root(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Reject paths that would escape the directory they are joined onto.
fn validate_relative(path_str: &str, field_name: &str) -> Result<()> {
    if path_str.trim().is_empty() {
        return Err(CoreError::config(format!(
            "Empty path in '{field_name}' field"
        )));
    }

    let path = Path::new(path_str);
    if path.is_absolute() {
        return Err(CoreError::config(format!(
            "Absolute paths not allowed in '{field_name}': '{path_str}'"
        )));
    }

    if path.components().any(|c| c == Component::ParentDir) {
        return Err(CoreError::config(format!(
            "Parent directory references (..) not allowed in '{field_name}': '{path_str}'"
        )));
    }

    Ok(())
}
