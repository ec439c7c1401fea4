//! Accessor derivation.
//!
//! Walks a [`PluginTrees`] forest depth-first, pre-order, producing one
//! [`PluginAccessor`] per node. The walk is an explicit stack so arbitrarily
//! deep namespaces never recurse, and [`PluginAccessors`] can be cloned to
//! restart from the same position.

use std::slice;

use rustc_hash::FxHashMap;

use crate::tree::{PluginTree, PluginTrees};
use crate::types::{capitalize, ExtensionSpec, MethodSignature, TypeSpec};

/// A single typed accessor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PluginAccessor {
    /// Yields the plugin handle for `id`.
    ForPlugin {
        id: String,
        implementation_class: String,
        extension: ExtensionSpec,
    },
    /// Yields the holder of every plugin whose id starts with `id`.
    ForGroup { id: String, extension: ExtensionSpec },
}

impl PluginAccessor {
    pub fn id(&self) -> &str {
        match self {
            PluginAccessor::ForPlugin { id, .. } | PluginAccessor::ForGroup { id, .. } => id,
        }
    }

    pub fn extension(&self) -> &ExtensionSpec {
        match self {
            PluginAccessor::ForPlugin { extension, .. }
            | PluginAccessor::ForGroup { extension, .. } => extension,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AccessorError {
    #[error(
        "plugin groups `{first_id}` and `{second_id}` both map to the type name `{type_name}`"
    )]
    NameCollision {
        first_id: String,
        second_id: String,
        type_name: String,
    },
    #[error("plugin accessors `{first_id}` and `{second_id}` both compile to the getter `{getter}`")]
    GetterCollision {
        first_id: String,
        second_id: String,
        getter: String,
    },
}

/// Holder type name for the group at `path`: `["org", "example"]` becomes
/// `OrgExamplePluginGroup`.
pub fn plugin_group_type_name<S: AsRef<str>>(path: &[S]) -> String {
    let mut name: String = path.iter().map(|s| capitalize(s.as_ref())).collect();
    name.push_str("PluginGroup");
    name
}

/// Lazily derive the accessors for `trees`, with top-level accessors
/// extending `receiver`.
pub fn plugin_accessors_for(trees: &PluginTrees, receiver: TypeSpec) -> PluginAccessors<'_> {
    PluginAccessors {
        stack: vec![(receiver, trees.iter())],
    }
}

/// Iterator returned by [`plugin_accessors_for`].
#[derive(Clone, Debug)]
pub struct PluginAccessors<'a> {
    stack: Vec<(TypeSpec, slice::Iter<'a, (String, PluginTree)>)>,
}

impl Iterator for PluginAccessors<'_> {
    type Item = PluginAccessor;

    fn next(&mut self) -> Option<PluginAccessor> {
        loop {
            let (receiver, children) = self.stack.last_mut()?;
            let Some((segment, tree)) = children.next() else {
                self.stack.pop();
                continue;
            };

            match tree {
                PluginTree::PluginSpec {
                    id,
                    implementation_class,
                } => {
                    return Some(PluginAccessor::ForPlugin {
                        id: id.clone(),
                        implementation_class: implementation_class.clone(),
                        extension: ExtensionSpec::new(
                            segment.clone(),
                            receiver.clone(),
                            TypeSpec::plugin_dependency_spec(),
                        ),
                    });
                }
                PluginTree::PluginGroup { path, plugins } => {
                    let group_type = TypeSpec::for_plugin_group(&plugin_group_type_name(path));
                    let accessor = PluginAccessor::ForGroup {
                        id: path.join("."),
                        extension: ExtensionSpec::new(
                            segment.clone(),
                            receiver.clone(),
                            group_type.clone(),
                        ),
                    };
                    self.stack.push((group_type, plugins.iter()));
                    return Some(accessor);
                }
            }
        }
    }
}

/// Reject catalogues where two distinct groups synthesize the same holder
/// type, e.g. `a.b` and `aB`.
pub fn check_group_type_names(accessors: &[PluginAccessor]) -> Result<(), AccessorError> {
    let mut seen: FxHashMap<&str, &str> = FxHashMap::default();
    for accessor in accessors {
        let PluginAccessor::ForGroup { id, extension } = accessor else {
            continue;
        };
        let type_name = extension.return_type.source_name.as_str();
        if let Some(first_id) = seen.insert(type_name, id.as_str()) {
            return Err(AccessorError::NameCollision {
                first_id: first_id.to_owned(),
                second_id: id.clone(),
                type_name: type_name.to_owned(),
            });
        }
    }
    Ok(())
}

/// Reject catalogues where two accessors share a JVM getter, e.g. the
/// siblings `foo` and `Foo`, which both become `getFoo` on the same receiver.
pub fn check_getter_signatures(accessors: &[PluginAccessor]) -> Result<(), AccessorError> {
    let mut seen: FxHashMap<MethodSignature, &str> = FxHashMap::default();
    for accessor in accessors {
        let getter = MethodSignature::getter_for(accessor.extension());
        if let Some(first_id) = seen.get(&getter) {
            return Err(AccessorError::GetterCollision {
                first_id: (*first_id).to_owned(),
                second_id: accessor.id().to_owned(),
                getter: getter.to_string(),
            });
        }
        seen.insert(getter, accessor.id());
    }
    Ok(())
}

#[cfg(test)]
mod tests;
