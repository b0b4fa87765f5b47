//! Index command - writes a dated index fragment for a directory of posts

use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::eyre::{Result, WrapErr, bail};
use quire_core::{SideTable, config::ListingStyle};
use quire_generator::{FsRepository, Indexer, ListingTemplate, ParsedMetadata};

/// Options for the index command.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// `<title>` of the index fragment.
    pub title: String,
    /// Heading above the listing.
    pub heading: String,
    /// File name of the index, inside the indexed directory.
    pub output: String,
    /// Where to write the extracted metadata as a side table.
    pub table: Option<PathBuf>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            title: "Tidings".to_string(),
            heading: "Posts".to_string(),
            output: "index.html".to_string(),
            table: None,
        }
    }
}

/// Run the index command.
///
/// The written fragment is not wrapped in the meta template; it is meant to
/// be assembled later like any other page.
pub fn run(dir: &Path, options: &IndexOptions) -> Result<()> {
    tracing::info!(?dir, ?options, "Indexing posts");

    if !dir.is_dir() {
        bail!("no `{}` folder found", dir.display());
    }

    let repository = FsRepository::scan(dir, &[options.output.as_str()])
        .wrap_err_with(|| format!("Failed to read {}", dir.display()))?;
    let outcome = Indexer::new(ParsedMetadata)
        .index_repository(&repository)
        .wrap_err("Failed to index posts")?;

    let fragment = ListingTemplate::new(ListingStyle::Dated)
        .render_fragment(&options.title, &options.heading, &outcome.entries)
        .wrap_err("Failed to render index")?;

    let index_path = dir.join(&options.output);
    fs::write(&index_path, fragment)
        .wrap_err_with(|| format!("Failed to write {}", index_path.display()))?;

    if let Some(table_path) = &options.table {
        let table: SideTable = outcome.entries.iter().cloned().collect();
        fs::write(table_path, table.to_json()?)
            .wrap_err_with(|| format!("Failed to write {}", table_path.display()))?;
        println!("  Table:  {}", table_path.display());
    }

    println!("  Indexed {} post(s)", outcome.entries.len());
    println!("  Output: {}", index_path.display());

    Ok(())
}
