//! Source text access for scanning and expansion.
//!
//! The core never touches the filesystem directly; it reads through a
//! [`SourceReader`] so the server can serve unsaved editor buffers and
//! tests can run entirely in memory.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::document::DocumentStore;

pub trait SourceReader: Send + Sync {
    fn read(
        &self,
        path: &Path,
    ) -> io::Result<String>;
}

/// Reads files from disk as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSources;

impl SourceReader for FsSources {
    fn read(
        &self,
        path: &Path,
    ) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Fixed in-memory file set.
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    files: HashMap<PathBuf, String>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Option<String> {
        self.files.insert(path.into(), text.into())
    }

    pub fn with(
        mut self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Self {
        self.insert(path, text);
        self
    }

    /// `(path, text)` pairs sorted by path, ready for a workspace scan.
    pub fn files(&self) -> Vec<(PathBuf, String)> {
        let mut files: Vec<(PathBuf, String)> =
            self.files.iter().map(|(path, text)| (path.clone(), text.clone())).collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }
}

impl SourceReader for MemorySources {
    fn read(
        &self,
        path: &Path,
    ) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} is not loaded", path.display())))
    }
}

/// Open editor buffers first, then the wrapped reader.
#[derive(Debug, Clone)]
pub struct OverlaySources<R = FsSources> {
    documents: Arc<DocumentStore>,
    fallback: R,
}

impl<R: SourceReader> OverlaySources<R> {
    pub fn new(
        documents: Arc<DocumentStore>,
        fallback: R,
    ) -> Self {
        Self {
            documents,
            fallback,
        }
    }
}

impl<R: SourceReader> SourceReader for OverlaySources<R> {
    fn read(
        &self,
        path: &Path,
    ) -> io::Result<String> {
        match self.documents.content_for_path(path) {
            Some(text) => Ok(text),
            None => self.fallback.read(path),
        }
    }
}

pub fn normalized_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
#[path = "../../tests/src/vfs/vfs_tests.rs"]
mod tests;
