//! Kotlin source emitter for plugin accessors.
//!
//! Renders the accessor list as a single Kotlin file declaring one extension
//! property per accessor, plus one holder class per plugin group. The text
//! is what IDEs index for navigation and content assist; the compiled
//! counterpart comes from `accessors_jvm`.
//!
//! Output is deterministic: same accessors, same bytes, `\n` line endings.

mod emitter;
mod source;

pub use emitter::{Emitter, StringEmitter};
pub use source::{
    emit_plugin_accessors_source, plugin_accessors_source_path, render_plugin_accessors,
    write_plugin_accessors_source, PLUGIN_ACCESSORS_FILE_NAME,
};
