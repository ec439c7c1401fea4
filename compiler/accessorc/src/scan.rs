//! Plugin catalogue discovery.
//!
//! Two sources are understood:
//!
//! - exploded classpath directories, where each plugin is declared by
//!   `META-INF/gradle-plugins/<id>.properties` carrying an
//!   `implementation-class` key;
//! - a flat catalogue file with one `id = implementation.Class` per line.
//!
//! Both use the properties syntax: `#` and `!` start comments, the key ends
//! at the first `=` or `:`, and surrounding whitespace is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use accessors_ir::PluginEntry;
use tracing::debug;

const PLUGIN_DESCRIPTORS_DIR: &str = "META-INF/gradle-plugins";
const PROPERTIES_EXTENSION: &str = "properties";
const IMPLEMENTATION_CLASS_KEY: &str = "implementation-class";

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}:{line}: expected `key = value`", path.display())]
    Malformed { path: PathBuf, line: usize },
    #[error("plugin descriptor `{}` has no `implementation-class`", path.display())]
    MissingImplementationClass { path: PathBuf },
    #[error("plugin descriptor name `{}` is not valid UTF-8", path.display())]
    NonUtf8Id { path: PathBuf },
}

/// Entries declared by plugin descriptors in `dirs`.
///
/// Directories are visited in the given order, descriptors within one
/// directory by file name. Directories without descriptors contribute
/// nothing.
pub fn plugin_entries_from_dirs<P: AsRef<Path>>(dirs: &[P]) -> Result<Vec<PluginEntry>, ScanError> {
    let mut entries = Vec::new();
    for dir in dirs {
        let descriptors_dir = dir.as_ref().join(PLUGIN_DESCRIPTORS_DIR);
        if !descriptors_dir.is_dir() {
            debug!(dir = %dir.as_ref().display(), "no plugin descriptors");
            continue;
        }

        for path in descriptor_files_in(&descriptors_dir)? {
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                return Err(ScanError::NonUtf8Id { path: path.clone() });
            };
            let text = read(&path)?;
            let implementation_class = parse_properties(&path, &text)?
                .into_iter()
                .rev()
                .find(|(key, _)| key == IMPLEMENTATION_CLASS_KEY)
                .map(|(_, value)| value)
                .ok_or_else(|| ScanError::MissingImplementationClass { path: path.clone() })?;
            entries.push(PluginEntry::new(id, implementation_class));
        }
    }
    debug!(dirs = dirs.len(), plugins = entries.len(), "scanned plugin descriptors");
    Ok(entries)
}

/// Entries listed in the catalogue file at `path`, in file order.
pub fn read_catalogue_file(path: &Path) -> Result<Vec<PluginEntry>, ScanError> {
    let text = read(path)?;
    let entries: Vec<_> = parse_properties(path, &text)?
        .into_iter()
        .map(|(id, implementation_class)| PluginEntry::new(id, implementation_class))
        .collect();
    debug!(path = %path.display(), plugins = entries.len(), "read plugin catalogue");
    Ok(entries)
}

fn descriptor_files_in(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let io_error = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some(PROPERTIES_EXTENSION)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read(path: &Path) -> Result<String, ScanError> {
    fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `(key, value)` pairs of a properties text, in order.
fn parse_properties(path: &Path, text: &str) -> Result<Vec<(String, String)>, ScanError> {
    let mut pairs = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some((key, value)) = line.split_once(['=', ':']) else {
            return Err(ScanError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ScanError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
            });
        }
        pairs.push((key.to_owned(), value.trim().to_owned()));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests;
