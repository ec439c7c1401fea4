//! Plugin Accessors Generator
//!
//! Turns a catalogue of dotted plugin ids into typed accessors: Kotlin
//! source for IDEs, and class files plus a `.kotlin_module` descriptor for
//! the compiler.
//!
//! # Architecture
//!
//! ```text
//! scan ──► [PluginEntry]
//!               │
//!               ▼
//! cache ── Fingerprint hit? ──yes──► AccessorsClassPath { src, bin }
//!               │ no
//!               ▼
//! generate ──► tree ──► accessors ──► validate
//!                                        │
//!                     io::with_asynchronous_io (write pool, join barrier)
//!                        ├── accessors_kotlin
//!                        └── accessors_jvm
//! ```
//!
//! # Debugging
//!
//! - `RUST_LOG=accessorc=debug`: phase-level events
//! - `RUST_LOG=accessorc::io=trace`: every queued write

pub mod cache;
pub mod config;
pub mod generate;
pub mod io;
pub mod scan;

pub use cache::{AccessorsCache, AccessorsClassPath, CacheError, Fingerprint, GENERATOR_VERSION};
pub use config::GenerateConfig;
pub use generate::{
    build_plugin_accessors_for, generate, plugin_accessors_of, GenerateError, GenerateStats,
};
pub use io::{with_asynchronous_io, AsyncIo, WriteError};
pub use scan::{plugin_entries_from_dirs, read_catalogue_file, ScanError};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env())
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .init();
        }
    });
}
