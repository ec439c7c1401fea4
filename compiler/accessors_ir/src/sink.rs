//! Artifact hand-off.
//!
//! Emitters never touch the filesystem. They hand complete artifacts to an
//! [`ArtifactSink`], which decides when and how they are persisted. A write
//! request is fire-and-forget; sinks that can fail report it when they are
//! joined.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Destination for finished artifacts.
pub trait ArtifactSink: Sync {
    /// Queue `bytes` to fully replace whatever is at `path`.
    fn write_file(&self, path: PathBuf, bytes: Vec<u8>);
}

impl<S: ArtifactSink + ?Sized> ArtifactSink for &S {
    fn write_file(&self, path: PathBuf, bytes: Vec<u8>) {
        (**self).write_file(path, bytes);
    }
}

/// Sink that keeps every artifact in memory, in request order.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().iter().map(|(path, _)| path.clone()).collect()
    }

    /// Contents of the latest write to `path`.
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files
            .lock()
            .iter()
            .rev()
            .find(|(written, _)| written == path)
            .map(|(_, bytes)| bytes.clone())
    }

    pub fn into_files(self) -> Vec<(PathBuf, Vec<u8>)> {
        self.files.into_inner()
    }
}

impl ArtifactSink for MemorySink {
    fn write_file(&self, path: PathBuf, bytes: Vec<u8>) {
        self.files.lock().push((path, bytes));
    }
}
