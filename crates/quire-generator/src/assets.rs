//! Copy-through of static files.
//!
//! Files are copied byte for byte to the same relative path in the output.
//! A listed directory is copied recursively, skipping hidden entries.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::sink::OutputSink;

/// Name of the marker file that turns off Jekyll processing on GitHub Pages.
pub const NOJEKYLL: &str = ".nojekyll";

/// Asset copy errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Listed file does not exist.
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    /// Reading a source file failed.
    #[error("cannot read asset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to the output failed.
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Copies listed files and directories from a source root into a sink.
#[derive(Debug, Clone)]
pub struct AssetCopier {
    source_dir: PathBuf,
}

impl AssetCopier {
    /// Create a copier reading from `source_dir`.
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }

    /// Copy every listed path, returning the relative paths written.
    pub fn copy_all<P: AsRef<Path>>(
        &self,
        paths: &[P],
        sink: &mut dyn OutputSink,
    ) -> Result<Vec<PathBuf>> {
        info!(source = %self.source_dir.display(), count = paths.len(), "copying static files");

        let mut copied = Vec::new();
        for path in paths {
            self.copy(path.as_ref(), sink, &mut copied)?;
        }

        info!(count = copied.len(), "static files copied");
        Ok(copied)
    }

    fn copy(
        &self,
        relative: &Path,
        sink: &mut dyn OutputSink,
        copied: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let source = self.source_dir.join(relative);

        if source.is_file() {
            return copy_file(&source, relative, sink, copied);
        }
        if !source.is_dir() {
            return Err(AssetError::NotFound(source));
        }

        let walker = WalkDir::new(&source)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let target = path
                .strip_prefix(&self.source_dir)
                .map_err(|_| AssetError::InvalidPath(path.to_path_buf()))?;
            copy_file(path, target, sink, copied)?;
        }

        Ok(())
    }
}

fn copy_file(
    source: &Path,
    target: &Path,
    sink: &mut dyn OutputSink,
    copied: &mut Vec<PathBuf>,
) -> Result<()> {
    let bytes = fs::read(source).map_err(|e| AssetError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;
    sink.write(target, &bytes).map_err(|e| AssetError::Write {
        path: target.to_path_buf(),
        source: e,
    })?;

    debug!(path = %target.display(), bytes = bytes.len(), "copied");
    copied.push(target.to_path_buf());
    Ok(())
}

/// Write the empty `.nojekyll` marker into the output root.
pub fn write_nojekyll(sink: &mut dyn OutputSink) -> Result<()> {
    let path = Path::new(NOJEKYLL);
    sink.write(path, b"").map_err(|source| AssetError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn test_copy_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path();
        fs::write(src.join(".htaccess"), "ErrorDocument 404 /404.html\n").unwrap();
        fs::create_dir_all(src.join("assets/fonts")).unwrap();
        fs::write(src.join("assets/style.css"), "body {}").unwrap();
        fs::write(src.join("assets/fonts/a.woff2"), [0u8, 1, 2]).unwrap();
        fs::write(src.join("assets/.DS_Store"), "junk").unwrap();

        let mut sink = MemorySink::new();
        let copied = AssetCopier::new(src)
            .copy_all(&[".htaccess", "assets"], &mut sink)
            .unwrap();

        assert_eq!(
            copied,
            vec![
                PathBuf::from(".htaccess"),
                PathBuf::from("assets/fonts/a.woff2"),
                PathBuf::from("assets/style.css"),
            ]
        );
        assert_eq!(sink.get_str("assets/style.css"), Some("body {}"));
        assert_eq!(sink.get("assets/fonts/a.woff2"), Some(&[0u8, 1, 2][..]));
        assert!(sink.get("assets/.DS_Store").is_none());
    }

    #[test]
    fn test_copy_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MemorySink::new();

        let err = AssetCopier::new(dir.path())
            .copy_all(&["assets/cv.pdf"], &mut sink)
            .unwrap_err();

        assert!(matches!(err, AssetError::NotFound(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_write_nojekyll() {
        let mut sink = MemorySink::new();
        write_nojekyll(&mut sink).unwrap();

        assert_eq!(sink.get(NOJEKYLL), Some(&b""[..]));
    }
}
