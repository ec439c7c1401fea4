//! Plugin Accessors IR
//!
//! The value model shared by both accessor emitters.
//!
//! # Architecture
//!
//! ```text
//! [PluginEntry]  (id + implementation class, supplied by a scanner)
//!       │
//!       ▼
//! PluginTree::of ──► PluginTrees        (dotted ids grouped by prefix)
//!       │
//!       ▼
//! plugin_accessors_for ──► PluginAccessor*   (depth-first, pre-order)
//!       │
//!       ├──► accessors_kotlin   (Kotlin source)
//!       └──► accessors_jvm      (class files + module descriptor)
//! ```
//!
//! Every type here is an immutable value that lives for a single generation
//! pass. Ordering is fully determined by the order of the input catalogue.
//!
//! # Modules
//!
//! - [`types`]: type descriptors, JVM internal names and getter signatures
//! - [`tree`]: namespace tree construction and id validation
//! - [`accessor`]: accessor derivation, holder and getter name collision checks
//! - [`sink`]: the seam through which emitters hand off finished artifacts

pub mod accessor;
pub mod sink;
pub mod tree;
pub mod types;

pub use accessor::{
    check_getter_signatures, check_group_type_names, plugin_accessors_for,
    plugin_group_type_name, AccessorError, PluginAccessor, PluginAccessors,
};
pub use sink::{ArtifactSink, MemorySink};
pub use tree::{PluginEntry, PluginTree, PluginTrees, TreeError};
pub use types::{
    capitalize, ExtensionSpec, InternalName, MethodSignature, TypeSpec, KOTLIN_DSL_PACKAGE_NAME,
    KOTLIN_DSL_PACKAGE_PATH,
};
