//! Fingerprint-keyed accessor cache.
//!
//! A generation pass depends only on the ordered catalogue and on the
//! generator itself, so its output is stored under a hash of both:
//!
//! ```text
//! <root>/<fingerprint>/
//!     src/            Kotlin source
//!     bin/            class files + module descriptor
//!     manifest.json   written last; its presence marks the entry complete
//! ```
//!
//! Entries are generated into a staging directory next to their final
//! location and renamed into place, so a crashed or failed pass never
//! leaves a half-written entry behind.

use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};

use accessors_ir::PluginEntry;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::generate::{GenerateError, GenerateStats};
use crate::io::{publish_permissions, PUBLISHED_DIR_MODE};

/// Version of the generator; a new version invalidates every entry.
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Identity of a catalogue as seen by this generator version.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(entries: &[PluginEntry]) -> Self {
        let mut hasher = FxHasher::default();
        GENERATOR_VERSION.hash(&mut hasher);
        entries.hash(&mut hasher);
        Fingerprint(hasher.finish())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Source and binary roots of one generated accessor set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessorsClassPath {
    pub src: PathBuf,
    pub bin: PathBuf,
}

impl AccessorsClassPath {
    fn in_dir(dir: &Path) -> Self {
        AccessorsClassPath {
            src: dir.join("src"),
            bin: dir.join("bin"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("accessors cache I/O failed at `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot encode cache manifest `{}`: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Manifest {
    fingerprint: String,
    generator_version: String,
    stats: GenerateStats,
}

/// Directory of completed generation passes, one per [`Fingerprint`].
#[derive(Clone, Debug)]
pub struct AccessorsCache {
    root: PathBuf,
}

impl AccessorsCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        AccessorsCache { root: root.into() }
    }

    /// The completed entry for `fingerprint`, if any.
    pub fn lookup(&self, fingerprint: Fingerprint) -> Option<AccessorsClassPath> {
        let dir = self.entry_dir(fingerprint);
        let manifest = read_manifest(&dir.join(MANIFEST_FILE_NAME))?;
        if manifest.fingerprint != fingerprint.to_string()
            || manifest.generator_version != GENERATOR_VERSION
        {
            return None;
        }
        let class_path = AccessorsClassPath::in_dir(&dir);
        (class_path.src.is_dir() && class_path.bin.is_dir()).then_some(class_path)
    }

    /// Return the entry for `fingerprint`, running `generate` into a fresh
    /// entry on a miss.
    ///
    /// `generate` receives the source and binary directories to fill. When
    /// it fails, the partial entry is discarded and the next call retries.
    pub fn class_path_for<F>(
        &self,
        fingerprint: Fingerprint,
        generate: F,
    ) -> Result<AccessorsClassPath, CacheError>
    where
        F: FnOnce(&Path, &Path) -> Result<GenerateStats, GenerateError>,
    {
        if let Some(class_path) = self.lookup(fingerprint) {
            debug!(%fingerprint, "accessors cache hit");
            return Ok(class_path);
        }
        debug!(%fingerprint, "accessors cache miss");

        let entry_dir = self.entry_dir(fingerprint);
        evict(&entry_dir);
        fs::create_dir_all(&self.root).map_err(|source| CacheError::Io {
            path: self.root.clone(),
            source,
        })?;

        let staging = tempfile::Builder::new()
            .prefix(&format!("{fingerprint}."))
            .suffix(".tmp")
            .tempdir_in(&self.root)
            .map_err(|source| CacheError::Io {
                path: self.root.clone(),
                source,
            })?;
        publish_permissions(staging.path(), PUBLISHED_DIR_MODE).map_err(|source| {
            CacheError::Io {
                path: staging.path().to_path_buf(),
                source,
            }
        })?;
        let staged = AccessorsClassPath::in_dir(staging.path());
        let stats = generate(&staged.src, &staged.bin)?;
        write_manifest(
            &staging.path().join(MANIFEST_FILE_NAME),
            &Manifest {
                fingerprint: fingerprint.to_string(),
                generator_version: GENERATOR_VERSION.to_owned(),
                stats,
            },
        )?;

        // `staging` still removes its path on drop; after the rename there
        // is nothing left to remove.
        if let Err(source) = fs::rename(staging.path(), &entry_dir) {
            if self.lookup(fingerprint).is_none() {
                return Err(CacheError::Io {
                    path: entry_dir,
                    source,
                });
            }
            debug!(%fingerprint, "accessors cache entry completed concurrently");
        }
        Ok(AccessorsClassPath::in_dir(&entry_dir))
    }

    fn entry_dir(&self, fingerprint: Fingerprint) -> PathBuf {
        self.root.join(fingerprint.to_string())
    }
}

fn read_manifest(path: &Path) -> Option<Manifest> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(manifest) => Some(manifest),
        Err(error) => {
            debug!(path = %path.display(), %error, "ignoring unreadable cache manifest");
            None
        }
    }
}

fn write_manifest(path: &Path, manifest: &Manifest) -> Result<(), CacheError> {
    let text = serde_json::to_string_pretty(manifest).map_err(|source| CacheError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove a stale or incomplete entry. Failure only costs a later rename.
fn evict(dir: &Path) {
    if !dir.exists() {
        return;
    }
    debug!(dir = %dir.display(), "evicting accessors cache entry");
    if let Err(error) = fs::remove_dir_all(dir) {
        warn!(dir = %dir.display(), %error, "cannot evict accessors cache entry");
    }
}
