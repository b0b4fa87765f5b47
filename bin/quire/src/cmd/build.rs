//! Build command - assembles the site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use quire_core::Config;
use quire_generator::{Builder, FsSink};

/// Run the build command.
///
/// Writes every page, listing and static file into the output directory.
pub fn run(config_path: &Path, output: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, "Starting build");

    let mut config =
        Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;

    // Override output directory if specified
    if let Some(output) = output {
        config.site.output_dir = output.to_string_lossy().to_string();
    }

    tracing::debug!(?config, "Loaded configuration");

    let output_dir = config.output_dir();
    let mut sink = FsSink::new(&output_dir);
    let stats = Builder::new(config)
        .build(&mut sink)
        .wrap_err("Build failed")?;

    let duration = start.elapsed();

    // Print build statistics
    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Pages:       {}", stats.pages);
    println!("  Collections: {}", stats.collections);
    println!("  Indexed:     {}", stats.indexed_items);
    println!("  Copied:      {}", stats.copied);
    if !stats.skipped.is_empty() {
        println!("  Skipped:     {}", stats.skipped.join(", "));
    }
    println!();
    println!("  Duration:    {:.2}s", duration.as_secs_f64());
    println!("  Output:      {}", output_dir.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_site(root: &Path) {
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::create_dir_all(root.join("src/tidings")).unwrap();
        fs::write(
            root.join("templates/meta.html"),
            "<html><body>\n</body></html>\n",
        )
        .unwrap();
        fs::write(root.join("templates/header.html"), "<nav></nav>").unwrap();
        fs::write(root.join("src/index.html"), "<p>home</p>").unwrap();
        fs::write(
            root.join("src/tidings/first.html"),
            r#"<title>First</title><p id="date">Jan 5, 2024</p><p>Hello.</p>"#,
        )
        .unwrap();
        fs::write(
            root.join("quire.toml"),
            "[[page]]\nfile = \"index.html\"\ntab = \"home\"\n\n[[collection]]\nname = \"tidings\"\n",
        )
        .unwrap();
    }

    #[test]
    fn test_build_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path());

        run(&dir.path().join("quire.toml"), None).unwrap();

        let docs = dir.path().join("docs");
        assert!(docs.join(".nojekyll").exists());
        assert!(docs.join("tidings/first.html").exists());
        let index = fs::read_to_string(docs.join("tidings/index.html")).unwrap();
        assert!(index.contains(r#"<a href="first.html"><b>First</b></a>"#));
        let home = fs::read_to_string(docs.join("index.html")).unwrap();
        assert!(home.starts_with("<html><body>\n<nav></nav><p>home</p>"));
    }

    #[test]
    fn test_build_output_override() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path());

        run(&dir.path().join("quire.toml"), Some(Path::new("public"))).unwrap();

        assert!(dir.path().join("public/index.html").exists());
        assert!(!dir.path().join("docs").exists());
    }

    #[test]
    fn test_build_fails_without_templates() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path());
        fs::remove_file(dir.path().join("templates/header.html")).unwrap();

        let err = run(&dir.path().join("quire.toml"), None).unwrap_err();
        assert!(format!("{err:?}").contains("header.html"));
    }
}
