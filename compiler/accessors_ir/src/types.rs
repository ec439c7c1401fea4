//! Type and signature descriptors.
//!
//! A [`TypeSpec`] pairs the name a type is written with in Kotlin source
//! with its JVM internal name. Both emitters consume the same specs, so the
//! textual and compiled accessors always agree on what they extend and return.

use std::fmt;

/// Package the generated accessors live in.
pub const KOTLIN_DSL_PACKAGE_NAME: &str = "org.gradle.kotlin.dsl";

/// [`KOTLIN_DSL_PACKAGE_NAME`] in internal (slash separated) form.
pub const KOTLIN_DSL_PACKAGE_PATH: &str = "org/gradle/kotlin/dsl";

const PLUGIN_DEPENDENCIES_SPEC: &str = "org/gradle/plugin/use/PluginDependenciesSpec";
const PLUGIN_DEPENDENCY_SPEC: &str = "org/gradle/plugin/use/PluginDependencySpec";

/// A JVM internal class name such as `org/gradle/plugin/use/PluginDependencySpec`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternalName(String);

impl InternalName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Field descriptor for a reference to this class (`La/b/C;`).
    pub fn descriptor(&self) -> String {
        format!("L{};", self.0)
    }

    /// Package part of the name in internal form, empty for the default package.
    pub fn package_path(&self) -> &str {
        self.0.rfind('/').map_or("", |slash| &self.0[..slash])
    }

    /// Class name without its package.
    pub fn simple_name(&self) -> &str {
        self.0.rfind('/').map_or(&self.0, |slash| &self.0[slash + 1..])
    }
}

impl fmt::Display for InternalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A type as seen by both emitters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeSpec {
    /// Name used in the generated Kotlin source.
    pub source_name: String,
    /// Name used in the generated class files.
    pub internal_name: InternalName,
}

impl TypeSpec {
    pub fn new(source_name: impl Into<String>, internal_name: InternalName) -> Self {
        Self {
            source_name: source_name.into(),
            internal_name,
        }
    }

    /// The `plugins {}` block receiver every top-level accessor extends.
    pub fn plugin_dependencies_spec() -> Self {
        Self::new(
            "PluginDependenciesSpec",
            InternalName::new(PLUGIN_DEPENDENCIES_SPEC),
        )
    }

    /// The handle returned by a plugin accessor.
    pub fn plugin_dependency_spec() -> Self {
        Self::new(
            "PluginDependencySpec",
            InternalName::new(PLUGIN_DEPENDENCY_SPEC),
        )
    }

    /// Holder type synthesized for a plugin group, placed in the accessors package.
    pub fn for_plugin_group(type_name: &str) -> Self {
        Self::new(
            type_name,
            InternalName::new(format!("{KOTLIN_DSL_PACKAGE_PATH}/{type_name}")),
        )
    }

    /// Whether this is the top-level receiver rather than a group holder.
    pub fn is_plugin_dependencies_spec(&self) -> bool {
        self.internal_name.as_str() == PLUGIN_DEPENDENCIES_SPEC
    }
}

/// A member `name` available on values of `receiver_type`, producing `return_type`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExtensionSpec {
    pub name: String,
    pub receiver_type: TypeSpec,
    pub return_type: TypeSpec,
}

impl ExtensionSpec {
    pub fn new(name: impl Into<String>, receiver_type: TypeSpec, return_type: TypeSpec) -> Self {
        Self {
            name: name.into(),
            receiver_type,
            return_type,
        }
    }
}

/// A JVM method name plus descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: String,
    pub desc: String,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
        }
    }

    /// Static getter backing an extension property.
    ///
    /// The receiver is the only parameter: `getFoo(LReceiver;)LReturn;`.
    pub fn getter_for(extension: &ExtensionSpec) -> Self {
        Self::new(
            format!("get{}", capitalize(&extension.name)),
            format!(
                "({}){}",
                extension.receiver_type.internal_name.descriptor(),
                extension.return_type.internal_name.descriptor()
            ),
        )
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.desc)
    }
}

/// Upper-case the first character, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
