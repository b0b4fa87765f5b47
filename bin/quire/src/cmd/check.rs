//! Check command - validate configuration, sources and collection metadata

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use quire_core::{
    Config,
    config::{CollectionConfig, MetadataPolicy},
};
use quire_generator::{
    Builder, ContentRepository, FsRepository, Indexer, ListingTemplate, MemorySink,
};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates the configuration, the presence of every source, and the
/// metadata of every indexed collection, then does a build into memory.
/// Nothing is written to disk.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content");

    let mut result = ValidationResult::default();

    // Validate configuration
    println!("Checking configuration...");
    let config = match Config::load_with_env(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            c
        }
        Err(e) => {
            println!("  ✗ Configuration invalid: {e}");
            bail!("Configuration error: {e}");
        }
    };
    let builder = Builder::new(config);

    // Check required sources
    println!("\nChecking sources...");
    let missing = builder.check_sources();
    if missing.is_empty() {
        println!("  ✓ All sources present");
    } else {
        for path in &missing {
            result.add_error(format!("Missing source: {}", path.display()));
        }
        println!("  ✗ {} source(s) missing", missing.len());
    }

    // Check collection metadata
    for collection in &builder.config().collections {
        println!("\nChecking collection '{}'...", collection.name);
        check_collection(&builder, collection, &mut result);
    }

    // Dry run, only meaningful once every input is present
    if !result.has_errors() {
        println!("\nAssembling site in memory...");
        let mut sink = MemorySink::new();
        match builder.build(&mut sink) {
            Ok(stats) => println!(
                "  ✓ {} file(s) would be written, {} listed item(s)",
                sink.len(),
                stats.indexed_items
            ),
            Err(e) => {
                result.add_error(format!("Build error: {e}"));
                println!("  ✗ Build failed");
            }
        }
    }

    // Print summary
    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    // Determine exit status
    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Check every fragment of an indexed collection.
///
/// Item problems are errors under the abort policy and warnings under skip,
/// matching what a real build would do with them.
fn check_collection(
    builder: &Builder,
    collection: &CollectionConfig,
    result: &mut ValidationResult,
) {
    if let Err(e) = ListingTemplate::for_collection(collection) {
        result.add_error(format!("{}: {e}", collection.name));
    }

    if !collection.index {
        println!("  ✓ Listing disabled, nothing to index");
        return;
    }

    let dir = builder.config().source_dir().join(collection.dir());
    if !dir.is_dir() {
        println!("  ✗ Directory missing");
        return;
    }

    let fragments = match FsRepository::scan(&dir, &collection.excluded_files())
        .and_then(|repo| repo.fragments())
    {
        Ok(fragments) => fragments,
        Err(e) => {
            result.add_error(format!("{}: {e}", collection.name));
            println!("  ✗ Cannot read collection");
            return;
        }
    };

    let source = match builder.metadata_source(collection) {
        Ok(source) => source,
        Err(e) => {
            result.add_error(format!("{}: {e}", collection.name));
            println!("  ✗ Cannot load metadata source");
            return;
        }
    };

    let policy = builder.config().build.on_invalid_metadata;
    let problems = Indexer::new(source).validate(&fragments);

    for problem in &problems {
        let message = format!("{}: {problem}", collection.name);
        if problem.is_item_error() && policy == MetadataPolicy::Skip {
            result.add_warning(message);
        } else {
            result.add_error(message);
        }
    }

    if problems.is_empty() {
        println!("  ✓ All {} item(s) valid", fragments.len());
    } else {
        println!(
            "  ✗ {}/{} item(s) have problems",
            problems.len(),
            fragments.len()
        );
    }
}
