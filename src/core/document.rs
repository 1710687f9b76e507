//! Source document handle.

use std::path::{Path, PathBuf};

/// A source PDF identified by its path.
///
/// The document name is the file name up to its first `.`, so
/// `data/metagpt.pdf` and `archive/metagpt.v2.pdf` both map to `metagpt`.
/// The name keys the on-disk index cache; same-named documents from
/// different folders share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    name: String,
}

impl Document {
    /// Creates a document handle for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = doc_name(&path);
        Self { path, name }
    }

    /// Path to the source file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cache key and default tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name component, as stored in node metadata.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn doc_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}
