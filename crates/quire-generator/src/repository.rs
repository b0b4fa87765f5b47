//! Content repositories.
//!
//! A repository maps fragment keys to raw text. The indexer and builder only
//! see this trait, so they run the same over a directory tree or over text
//! held in memory.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use quire_core::ContentFragment;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Repository errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Content root does not exist.
    #[error("content directory not found: {0}")]
    NotFound(PathBuf),

    /// Two fragments share a key.
    #[error("duplicate content key {key:?}: {first} and {second}")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    /// Key not present in the repository.
    #[error("unknown content key: {0}")]
    UnknownKey(String),

    /// IO error.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Read access to a collection of content fragments.
pub trait ContentRepository {
    /// All keys, in ascending order.
    fn keys(&self) -> Vec<String>;

    /// Raw text for a key.
    fn read(&self, key: &str) -> Result<String>;

    /// Every fragment, in key order.
    fn fragments(&self) -> Result<Vec<ContentFragment>> {
        self.keys()
            .into_iter()
            .map(|key| {
                let text = self.read(&key)?;
                Ok(ContentFragment::new(key, text))
            })
            .collect()
    }
}

/// Fragments read from a directory tree.
///
/// Keys are file names. Subdirectories are walked, but their structure is not
/// part of the key, so the same file name in two subdirectories is rejected.
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
    files: BTreeMap<String, PathBuf>,
}

impl FsRepository {
    /// Scan `root`, skipping hidden entries and any file named in `exclude`.
    pub fn scan(root: impl Into<PathBuf>, exclude: &[&str]) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(RepositoryError::NotFound(root));
        }

        let mut files: BTreeMap<String, PathBuf> = BTreeMap::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            if exclude.contains(&name) {
                debug!(path = %entry.path().display(), "skipping excluded file");
                continue;
            }

            let path = entry.path().to_path_buf();
            if let Some(first) = files.get(name) {
                return Err(RepositoryError::DuplicateKey {
                    key: name.to_string(),
                    first: display(first),
                    second: display(&path),
                });
            }
            files.insert(name.to_string(), path);
        }

        debug!(root = %root.display(), count = files.len(), "scanned content directory");
        Ok(Self { root, files })
    }

    /// The scanned directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the file behind a key.
    #[must_use]
    pub fn path(&self, key: &str) -> Option<&Path> {
        self.files.get(key).map(PathBuf::as_path)
    }
}

impl ContentRepository for FsRepository {
    fn keys(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn read(&self, key: &str) -> Result<String> {
        let path = self
            .files
            .get(key)
            .ok_or_else(|| RepositoryError::UnknownKey(key.to_string()))?;
        fs::read_to_string(path).map_err(|source| RepositoryError::Io {
            path: path.clone(),
            source,
        })
    }
}

/// Fragments held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    fragments: BTreeMap<String, String>,
}

impl MemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment, rejecting a key that is already present.
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) -> Result<()> {
        let key = key.into();
        if self.fragments.contains_key(&key) {
            return Err(RepositoryError::DuplicateKey {
                first: key.clone(),
                second: key.clone(),
                key,
            });
        }
        self.fragments.insert(key, text.into());
        Ok(())
    }

    /// Build a repository from key/text pairs.
    pub fn from_pairs<K, T>(pairs: impl IntoIterator<Item = (K, T)>) -> Result<Self>
    where
        K: Into<String>,
        T: Into<String>,
    {
        let mut repo = Self::new();
        for (key, text) in pairs {
            repo.insert(key, text)?;
        }
        Ok(repo)
    }

    /// Number of fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl ContentRepository for MemoryRepository {
    fn keys(&self) -> Vec<String> {
        self.fragments.keys().cloned().collect()
    }

    fn read(&self, key: &str) -> Result<String> {
        self.fragments
            .get(key)
            .cloned()
            .ok_or_else(|| RepositoryError::UnknownKey(key.to_string()))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_repository_rejects_duplicates() {
        let mut repo = MemoryRepository::new();
        repo.insert("a.html", "first").unwrap();

        let err = repo.insert("a.html", "second").unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey { ref key, .. } if key == "a.html"));
        assert_eq!(repo.read("a.html").unwrap(), "first");
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_memory_repository_orders_keys() {
        let repo = MemoryRepository::from_pairs([("b.html", "B"), ("a.html", "A")]).unwrap();

        assert_eq!(repo.keys(), vec!["a.html", "b.html"]);
        let fragments = repo.fragments().unwrap();
        assert_eq!(fragments[0], ContentFragment::new("a.html", "A"));
        assert!(matches!(
            repo.read("c.html"),
            Err(RepositoryError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_fs_repository_scan() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("one.html"), "1").unwrap();
        fs::write(root.join(".draft.html"), "hidden").unwrap();
        fs::write(root.join("index.html"), "generated").unwrap();
        fs::create_dir(root.join("2024")).unwrap();
        fs::write(root.join("2024/two.html"), "2").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/config.html"), "nope").unwrap();

        let repo = FsRepository::scan(root, &["index.html"]).unwrap();

        assert_eq!(repo.keys(), vec!["one.html", "two.html"]);
        assert_eq!(repo.read("two.html").unwrap(), "2");
        assert_eq!(repo.path("two.html"), Some(root.join("2024/two.html").as_path()));
        assert_eq!(repo.root(), root);
    }

    #[test]
    fn test_fs_repository_rejects_same_name_in_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/post.html"), "a").unwrap();
        fs::write(dir.path().join("b/post.html"), "b").unwrap();

        let err = FsRepository::scan(dir.path(), &[]).unwrap_err();
        assert!(err.to_string().contains("duplicate content key \"post.html\""));
    }

    #[test]
    fn test_fs_repository_missing_root() {
        let result = FsRepository::scan("/nonexistent/content", &[]);
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }
}
