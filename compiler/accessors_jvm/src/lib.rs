//! JVM Accessors Emitter
//!
//! Compiles the accessor list straight to JVM class files, without going
//! through a Kotlin compiler.
//!
//! # Output
//!
//! ```text
//! <bin>/org/gradle/kotlin/dsl/
//!     PluginAccessorsKt.class        file facade, one static getter per accessor,
//!                                    annotated with @kotlin.Metadata(k = 2)
//!     <Group>PluginGroup.class       one holder class per plugin group
//! <bin>/META-INF/
//!     <module>.kotlin_module         registers the facade with the Kotlin compiler
//! ```
//!
//! # Modules
//!
//! - [`classfile`]: declarative class file builder (constant pool, bytecode,
//!   annotations)
//! - [`metadata`]: `kotlin.Metadata` payload (protobuf, JVM string table,
//!   `d1` bit encoding)
//! - [`module`]: `.kotlin_module` descriptor
//! - [`emit`]: accessor-to-class-file translation

mod bytes;
pub mod classfile;
pub mod emit;
pub mod metadata;
pub mod module;

pub use classfile::{ClassFileBuilder, ClassFileError, CodeBuilder};
pub use emit::{
    build_plugin_accessors_classes, emit_plugin_accessors_classes,
    emit_plugin_accessors_classes_in_module, ClassArtifacts, EmitError, FILE_FACADE_CLASS_NAME,
};
pub use module::{module_file_for, module_metadata_bytes_for, DEFAULT_MODULE_NAME};
