//! Quire Generator Library
//!
//! Page assembly and content indexing for Quire.
//!
//! # Modules
//!
//! - [`assembler`] - Splices content into the meta template
//! - [`metadata`] - Title, date and preview extraction from fragments
//! - [`indexer`] - Metadata sources and date-ordered collection indexing
//! - [`listing`] - Listing and index page rendering
//! - [`template`] - Flat `{{ variable }}` interpolation for listing markup
//! - [`repository`] - Filesystem and in-memory content repositories
//! - [`sink`] - Output destinations for generated files
//! - [`assets`] - Copy-through of static files
//! - [`build`] - Build orchestration

pub mod assembler;
pub mod assets;
pub mod build;
pub mod indexer;
pub mod listing;
pub mod metadata;
pub mod repository;
pub mod sink;
pub mod template;

pub use assembler::{AssembleError, MetaTemplate, PageAssembler, assemble};
pub use assets::AssetCopier;
pub use build::{BuildError, BuildStats, Builder};
pub use indexer::{
    IndexError, IndexOutcome, Indexer, MetadataSource, ParsedMetadata, TableMetadata,
    sort_descending_by_date,
};
pub use listing::{ListingTemplate, build_index_page, render_listing};
pub use metadata::{MetadataError, extract_metadata};
pub use repository::{ContentRepository, FsRepository, MemoryRepository};
pub use sink::{FsSink, MemorySink, OutputSink};
pub use template::{Template, TemplateContext};
