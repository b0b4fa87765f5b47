//! Quire CLI
//!
//! Splice-based static site assembler with dated content indexes.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Quire.
#[derive(Parser)]
#[command(
    name = "quire",
    version,
    about = "Assemble hand-written HTML fragments into a static site"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "quire.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site into the output directory
    Build {
        /// Output directory, overriding site.output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate configuration, sources and collection metadata
    Check {
        /// Treat skipped items as errors
        #[arg(long)]
        strict: bool,
    },
    /// Write a dated index fragment for a directory of posts
    Index {
        /// Directory of posts
        dir: PathBuf,
        /// Index page title
        #[arg(long, default_value = "Tidings")]
        title: String,
        /// Index page heading
        #[arg(long, default_value = "Posts")]
        heading: String,
        /// File name of the index, written inside the directory
        #[arg(short, long, default_value = "index.html")]
        output: String,
        /// Also write the extracted metadata as a side table
        #[arg(long)]
        table: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    quire::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { output } => {
            quire::cmd::build::run(&cli.config, output.as_deref())?;
        }
        Commands::Check { strict } => {
            quire::cmd::check::run(&cli.config, strict)?;
        }
        Commands::Index {
            dir,
            title,
            heading,
            output,
            table,
        } => {
            let options = quire::cmd::index::IndexOptions {
                title,
                heading,
                output,
                table,
            };
            quire::cmd::index::run(&dir, &options)?;
        }
    }

    Ok(())
}
