//! Output sinks for generated files.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use quire_core::Page;
use tracing::debug;

/// Destination for generated files, addressed by path relative to the site root.
///
/// Writing a path that was already written replaces its contents.
pub trait OutputSink {
    /// Write raw bytes.
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Write a finished page.
    fn write_page(&mut self, path: &Path, page: &Page) -> io::Result<()> {
        self.write(path, page.as_bytes())
    }
}

/// Writes files under a directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    /// Create a sink rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for FsSink {
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, contents)?;
        debug!(path = %target.display(), bytes = contents.len(), "wrote file");
        Ok(())
    }
}

/// Keeps written files in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written to `path`.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        self.files.get(path.as_ref()).map(Vec::as_slice)
    }

    /// Text written to `path`, if it is valid UTF-8.
    #[must_use]
    pub fn get_str(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.get(path).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// All written paths, in order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Number of files written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_sink_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FsSink::new(dir.path());

        sink.write_page(Path::new("blog/post.html"), &Page::new("old"))
            .unwrap();
        sink.write_page(Path::new("blog/post.html"), &Page::new("new"))
            .unwrap();

        let written = fs::read_to_string(dir.path().join("blog/post.html")).unwrap();
        assert_eq!(written, "new");
        assert_eq!(sink.root(), dir.path());
    }

    #[test]
    fn test_memory_sink_last_write_wins() {
        let mut sink = MemorySink::new();
        sink.write(Path::new("a.html"), b"one").unwrap();
        sink.write(Path::new("a.html"), b"two").unwrap();
        sink.write(Path::new(".nojekyll"), b"").unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.get_str("a.html"), Some("two"));
        assert_eq!(sink.get(".nojekyll"), Some(&b""[..]));
        assert_eq!(
            sink.paths().collect::<Vec<_>>(),
            vec![Path::new(".nojekyll"), Path::new("a.html")]
        );
    }
}
