//! Build orchestration.
//!
//! Coordinates the full site build: presence check, templates, static files,
//! loose pages, then collections with their listing pages.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use quire_core::{
    Config, CoreError, SideTable,
    config::{CollectionConfig, MetadataSourceKind},
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    assembler::{AssembleError, PageAssembler},
    assets::{self, AssetCopier, AssetError},
    indexer::{IndexError, Indexer, MetadataSource, ParsedMetadata, TableMetadata},
    listing::{ListingTemplate, build_index_page},
    repository::{ContentRepository, FsRepository, RepositoryError},
    sink::OutputSink,
    template::TemplateError,
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Required inputs are absent.
    #[error("missing source files or directories:{}", list_paths(.0))]
    MissingSources(Vec<PathBuf>),

    /// Template loading or splitting failed.
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    /// Collection indexing failed.
    #[error("indexing failed: {0}")]
    Index(#[from] IndexError),

    /// Collection scan failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Listing markup is invalid.
    #[error("listing template error: {0}")]
    Template(#[from] TemplateError),

    /// Static file copy failed.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Side table could not be loaded.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Source file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of pages written, listing pages included.
    pub pages: usize,

    /// Number of collections built.
    pub collections: usize,

    /// Number of entries across all listings.
    pub indexed_items: usize,

    /// Number of static files copied.
    pub copied: usize,

    /// Keys left out of listings because of invalid metadata.
    pub skipped: Vec<String>,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Statistics for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    /// Pages written, the listing page included.
    pub pages: usize,

    /// Listing entries.
    pub indexed_items: usize,

    /// Keys left out of the listing.
    pub skipped: Vec<String>,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new builder.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration being built.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Every configured input that does not exist.
    #[must_use]
    pub fn check_sources(&self) -> Vec<PathBuf> {
        let source_dir = self.config.source_dir();
        let mut missing = Vec::new();

        let mut require_dir = |path: PathBuf| {
            if !path.is_dir() {
                missing.push(path);
            }
        };
        require_dir(source_dir.clone());
        require_dir(self.config.resolve(&self.config.site.templates_dir));
        for collection in &self.config.collections {
            require_dir(source_dir.join(collection.dir()));
        }

        let mut files = vec![
            self.config.meta_template_path(),
            self.config.header_template_path(),
        ];
        files.extend(self.config.pages.iter().map(|page| source_dir.join(&page.file)));
        files.extend(
            self.config
                .collections
                .iter()
                .filter(|c| c.metadata == MetadataSourceKind::Table)
                .filter_map(|c| c.table.as_ref())
                .map(|table| self.config.resolve(table)),
        );
        missing.extend(files.into_iter().filter(|path| !path.is_file()));

        missing.extend(
            self.config
                .build
                .copy
                .iter()
                .map(|path| source_dir.join(path))
                .filter(|path| !path.exists()),
        );

        missing
    }

    /// Execute the full build, writing everything to `sink`.
    pub fn build(&self, sink: &mut dyn OutputSink) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            source = %self.config.source_dir().display(),
            output = %self.config.output_dir().display(),
            "starting build"
        );

        // 1. Every input must exist before anything is written
        let missing = self.check_sources();
        if !missing.is_empty() {
            return Err(BuildError::MissingSources(missing));
        }

        // 2. Load templates
        let assembler = PageAssembler::load(
            &self.config.meta_template_path(),
            &self.config.header_template_path(),
        )?;

        // 3. GitHub Pages marker
        if self.config.build.nojekyll {
            assets::write_nojekyll(sink)?;
        }

        // 4. Static files
        let copied = AssetCopier::new(self.config.source_dir())
            .copy_all(self.config.build.copy.as_slice(), sink)?;
        stats.copied = copied.len();

        // 5. Loose pages
        stats.pages += self.build_pages(&assembler, sink)?;

        // 6. Collections
        for collection in &self.config.collections {
            let dir = self.config.source_dir().join(collection.dir());
            let repository = FsRepository::scan(&dir, &collection.excluded_files())?;
            let collection_stats =
                self.build_collection(&assembler, collection, &repository, sink)?;

            stats.pages += collection_stats.pages;
            stats.indexed_items += collection_stats.indexed_items;
            stats.skipped.extend(collection_stats.skipped);
            stats.collections += 1;
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = stats.pages,
            collections = stats.collections,
            indexed_items = stats.indexed_items,
            copied = stats.copied,
            skipped = stats.skipped.len(),
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Assemble the pages that sit directly in the output root.
    fn build_pages(&self, assembler: &PageAssembler, sink: &mut dyn OutputSink) -> Result<usize> {
        info!(count = self.config.pages.len(), "assembling pages");

        for page in &self.config.pages {
            let path = self.config.source_dir().join(&page.file);
            let content =
                fs::read_to_string(&path).map_err(|source| BuildError::Read { path, source })?;
            let html = assembler.assemble(&content, page.tab.as_deref());
            write_page(sink, Path::new(&page.file), &html)?;
        }

        Ok(self.config.pages.len())
    }

    /// Assemble every fragment of a collection and, if enabled, its listing.
    pub fn build_collection(
        &self,
        assembler: &PageAssembler,
        collection: &CollectionConfig,
        repository: &dyn ContentRepository,
        sink: &mut dyn OutputSink,
    ) -> Result<CollectionStats> {
        let out_dir = Path::new(collection.dir());
        let tab = collection.tab.as_deref();
        let fragments = repository.fragments()?;
        let mut stats = CollectionStats::default();

        info!(collection = %collection.name, count = fragments.len(), "assembling collection");

        for fragment in &fragments {
            let html = assembler.assemble(&fragment.text, tab);
            write_page(sink, &out_dir.join(&fragment.key), &html)?;
            stats.pages += 1;
        }

        if !collection.index {
            debug!(collection = %collection.name, "listing disabled");
            return Ok(stats);
        }

        let indexer = Indexer::new(self.metadata_source(collection)?)
            .with_policy(self.config.build.on_invalid_metadata);
        let outcome = indexer.index(&fragments)?;

        let template = ListingTemplate::for_collection(collection)?;
        let page = build_index_page(
            assembler,
            &template,
            &collection.title(),
            &collection.heading,
            &outcome.entries,
            tab,
        )?;
        write_page(sink, &out_dir.join(&collection.index_file), &page)?;

        stats.pages += 1;
        stats.indexed_items = outcome.entries.len();
        stats.skipped = outcome.skipped;
        Ok(stats)
    }

    /// Metadata source configured for a collection, loading its side table if any.
    pub fn metadata_source(
        &self,
        collection: &CollectionConfig,
    ) -> Result<Box<dyn MetadataSource>> {
        match (collection.metadata, &collection.table) {
            (MetadataSourceKind::Table, Some(table)) => {
                let table = SideTable::load(&self.config.resolve(table))?;
                debug!(collection = %collection.name, entries = table.len(), "loaded side table");
                Ok(Box::new(TableMetadata::new(table)))
            }
            (MetadataSourceKind::Table, None) => Err(BuildError::Core(CoreError::config(format!(
                "collection '{}': metadata = \"table\" requires a table path",
                collection.name
            )))),
            (MetadataSourceKind::Parsed, _) => Ok(Box::new(ParsedMetadata)),
        }
    }
}

fn write_page(sink: &mut dyn OutputSink, path: &Path, page: &quire_core::Page) -> Result<()> {
    sink.write_page(path, page).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| format!("\n\t{}", path.display()))
        .collect()
}
