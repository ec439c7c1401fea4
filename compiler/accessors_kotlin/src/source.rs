//! Kotlin rendering of the accessor list.
//!
//! Layout of the generated file:
//!
//! ```text
//! @file:Suppress(...)              header
//! @file:org.gradle.api.Generated
//! package org.gradle.kotlin.dsl
//!
//! import ...                       PluginDependenciesSpec, PluginDependencySpec,
//!                                  then default-package implementation classes
//!
//!
//! /** ... */                       one block per accessor, in accessor order,
//! val `Recv`.`name`: ...           each preceded by two newlines
//! ```

use std::path::{Path, PathBuf};

use accessors_ir::{ArtifactSink, PluginAccessor, KOTLIN_DSL_PACKAGE_NAME, KOTLIN_DSL_PACKAGE_PATH};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::emitter::{Emitter, StringEmitter};

/// Base name of the generated source file.
pub const PLUGIN_ACCESSORS_FILE_NAME: &str = "PluginAccessors.kt";

const SUPPRESSED_WARNINGS: &[&str] = &[
    "unused",
    "nothing_to_inline",
    "useless_cast",
    "unchecked_cast",
    "extension_shadowed_by_member",
    "redundant_projection",
    "RemoveRedundantBackticks",
    "ObjectPropertyName",
    "deprecation",
];

const PLUGINS_FIELD_NAME: &str = "plugins";

/// Where the source lands under `src_dir`.
pub fn plugin_accessors_source_path(src_dir: &Path) -> PathBuf {
    src_dir
        .join(KOTLIN_DSL_PACKAGE_PATH)
        .join(PLUGIN_ACCESSORS_FILE_NAME)
}

/// Render the full source file for `accessors`.
pub fn write_plugin_accessors_source(accessors: &[PluginAccessor]) -> String {
    let mut emitter = StringEmitter::with_capacity(1024 + accessors.len() * 192);
    render_plugin_accessors(accessors, &mut emitter);
    emitter.output()
}

/// Render the source for `accessors` and queue it at its path under `src_dir`.
pub fn emit_plugin_accessors_source<S: ArtifactSink + ?Sized>(
    accessors: &[PluginAccessor],
    src_dir: &Path,
    sink: &S,
) {
    let path = plugin_accessors_source_path(src_dir);
    let text = write_plugin_accessors_source(accessors);
    debug!(
        path = %path.display(),
        accessors = accessors.len(),
        bytes = text.len(),
        "emitting plugin accessors source"
    );
    sink.write_file(path, text.into_bytes());
}

/// Render `accessors` into `out`.
pub fn render_plugin_accessors<E: Emitter>(accessors: &[PluginAccessor], out: &mut E) {
    render_header(out);

    out.emit_line("import org.gradle.plugin.use.PluginDependenciesSpec");
    out.emit_line("import org.gradle.plugin.use.PluginDependencySpec");
    for type_name in default_package_types_in(accessors) {
        out.emit_line(&format!("import {type_name}"));
    }

    for accessor in accessors {
        out.emit_newline();
        out.emit_newline();
        render_accessor(accessor, out);
    }
}

fn render_header<E: Emitter>(out: &mut E) {
    out.emit_line("@file:Suppress(");
    for (i, warning) in SUPPRESSED_WARNINGS.iter().enumerate() {
        let separator = if i + 1 < SUPPRESSED_WARNINGS.len() { "," } else { "" };
        out.emit_line(&format!("    \"{warning}\"{separator}"));
    }
    out.emit_line(")");
    out.emit_line("@file:org.gradle.api.Generated");
    out.emit_newline();
    out.emit_line(&format!("package {KOTLIN_DSL_PACKAGE_NAME}"));
    out.emit_newline();
}

fn render_accessor<E: Emitter>(accessor: &PluginAccessor, out: &mut E) {
    let extension = accessor.extension();
    let extended_type = &extension.receiver_type.source_name;
    let name = &extension.name;
    let plugins_ref = plugins_ref_for(accessor);

    match accessor {
        PluginAccessor::ForPlugin {
            id,
            implementation_class,
            ..
        } => {
            render_kdoc(
                out,
                &format!("The `{id}` plugin implemented by [{implementation_class}]."),
            );
            out.emit_line(&format!("val `{extended_type}`.`{name}`: PluginDependencySpec"));
            out.emit_line(&format!(
                "    get() = {plugins_ref}.id({})",
                string_literal(id)
            ));
        }
        PluginAccessor::ForGroup { id, .. } => {
            let group_type = &extension.return_type.source_name;
            render_kdoc(out, &format!("The `{id}` plugin group."));
            out.emit_line(&format!(
                "class `{group_type}`(internal val {PLUGINS_FIELD_NAME}: PluginDependenciesSpec)"
            ));
            out.emit_newline();
            out.emit_newline();
            render_kdoc(out, &format!("Plugin ids starting with `{id}`."));
            out.emit_line(&format!("val `{extended_type}`.`{name}`: `{group_type}`"));
            out.emit_line(&format!("    get() = `{group_type}`({plugins_ref})"));
        }
    }
}

fn render_kdoc<E: Emitter>(out: &mut E, text: &str) {
    out.emit_line("/**");
    out.emit_line(&format!(" * {}", text.replace("*/", "*&#47;")));
    out.emit_line(" */");
}

/// `this` on the top-level receiver, the holder's field on a group.
fn plugins_ref_for(accessor: &PluginAccessor) -> &'static str {
    if accessor.extension().receiver_type.is_plugin_dependencies_spec() {
        "this"
    } else {
        PLUGINS_FIELD_NAME
    }
}

/// Implementation classes in the default package need an import for the
/// KDoc links to resolve. Distinct, first-seen order.
fn default_package_types_in(accessors: &[PluginAccessor]) -> Vec<&str> {
    let mut seen = FxHashSet::default();
    accessors
        .iter()
        .filter_map(|accessor| match accessor {
            PluginAccessor::ForPlugin {
                implementation_class,
                ..
            } => Some(implementation_class.as_str()),
            PluginAccessor::ForGroup { .. } => None,
        })
        .filter(|class| !class.is_empty() && !class.contains('.'))
        .filter(|class| seen.insert(*class))
        .collect()
}

/// Quote `value` as a Kotlin string literal.
fn string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '"' => literal.push_str("\\\""),
            '$' => literal.push_str("\\$"),
            _ => literal.push(c),
        }
    }
    literal.push('"');
    literal
}
