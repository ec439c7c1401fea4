//! Generation driver.
//!
//! ```text
//! [PluginEntry] ──► PluginTree::of ──► plugin_accessors_for
//!                                            │
//!                   check_group_type_names, check_getter_signatures
//!                                            │
//!                   build_plugin_accessors_classes (in memory)
//!                                            │
//!                   with_asynchronous_io
//!                     ├── Kotlin source  → <src>/org/gradle/kotlin/dsl/PluginAccessors.kt
//!                     └── class files    → <bin>/org/gradle/kotlin/dsl/*.class
//!                                          <bin>/META-INF/<module>.kotlin_module
//! ```
//!
//! Everything that can reject the catalogue runs before the first write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use accessors_ir::{
    check_getter_signatures, check_group_type_names, plugin_accessors_for, AccessorError,
    PluginAccessor, PluginEntry, PluginTree, TreeError, TypeSpec,
};
use accessors_jvm::{build_plugin_accessors_classes, EmitError};
use accessors_kotlin::emit_plugin_accessors_source;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GenerateConfig;
use crate::io::{with_asynchronous_io, WriteError};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Accessor(#[from] AccessorError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("cannot write `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<WriteError> for GenerateError {
    fn from(error: WriteError) -> Self {
        GenerateError::Io {
            path: error.path,
            source: error.source,
        }
    }
}

/// What a generation pass produced.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateStats {
    pub plugins: usize,
    pub groups: usize,
    /// Facade plus one holder per group.
    pub class_files: usize,
}

impl GenerateStats {
    fn of(accessors: &[PluginAccessor], class_files: usize) -> Self {
        let groups = accessors
            .iter()
            .filter(|accessor| matches!(accessor, PluginAccessor::ForGroup { .. }))
            .count();
        GenerateStats {
            plugins: accessors.len() - groups,
            groups,
            class_files,
        }
    }
}

/// Build the namespace tree for `entries` and derive its validated accessors.
pub fn plugin_accessors_of(entries: &[PluginEntry]) -> Result<Vec<PluginAccessor>, GenerateError> {
    let trees = PluginTree::of(entries)?;
    debug!(top_level = trees.len(), "built plugin tree");

    let accessors: Vec<_> =
        plugin_accessors_for(&trees, TypeSpec::plugin_dependencies_spec()).collect();
    check_group_type_names(&accessors)?;
    check_getter_signatures(&accessors)?;
    debug!(accessors = accessors.len(), "derived plugin accessors");
    Ok(accessors)
}

/// [`build_plugin_accessors_for`] with the default configuration.
pub fn generate(
    entries: &[PluginEntry],
    src_dir: &Path,
    bin_dir: &Path,
) -> Result<GenerateStats, GenerateError> {
    build_plugin_accessors_for(entries, src_dir, bin_dir, &GenerateConfig::default())
}

/// Write the Kotlin source under `src_dir` and the class files plus module
/// descriptor under `bin_dir`.
///
/// Rerunning with the same catalogue rewrites byte-identical files.
pub fn build_plugin_accessors_for(
    entries: &[PluginEntry],
    src_dir: &Path,
    bin_dir: &Path,
    config: &GenerateConfig,
) -> Result<GenerateStats, GenerateError> {
    create_dir(src_dir)?;
    create_dir(bin_dir)?;

    let accessors = plugin_accessors_of(entries)?;
    let classes = build_plugin_accessors_classes(&accessors, bin_dir, &config.module_name)?;

    let class_files = with_asynchronous_io(config, |io| {
        emit_plugin_accessors_source(&accessors, src_dir, io);
        Ok::<_, GenerateError>(classes.write_to(io))
    })?;

    let stats = GenerateStats::of(&accessors, class_files);
    info!(
        plugins = stats.plugins,
        groups = stats.groups,
        class_files = stats.class_files,
        src = %src_dir.display(),
        bin = %bin_dir.display(),
        "generated plugin accessors"
    );
    Ok(stats)
}

fn create_dir(dir: &Path) -> Result<(), GenerateError> {
    fs::create_dir_all(dir).map_err(|source| GenerateError::Io {
        path: dir.to_path_buf(),
        source,
    })
}
