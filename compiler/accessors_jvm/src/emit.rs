//! Accessor-to-bytecode translation.
//!
//! Every accessor becomes a `public static` getter on the file facade. The
//! getter first loads the `PluginDependenciesSpec` (the receiver itself at
//! top level, the holder's `plugins` field inside a group), then either
//! asks it for the plugin id or wraps it in the next group's holder.

use std::path::{Path, PathBuf};

use accessors_ir::{
    ArtifactSink, InternalName, MethodSignature, PluginAccessor, TypeSpec, KOTLIN_DSL_PACKAGE_PATH,
};
use tracing::debug;

use crate::classfile::{
    ClassFileBuilder, ClassFileError, CodeBuilder, MethodAccess, JAVA_LANG_OBJECT,
};
use crate::metadata::{AccessorFlags, FileFacadeHeaderWriter};
use crate::module::{module_file_for, module_metadata_bytes_for, DEFAULT_MODULE_NAME};

/// Simple name of the file facade class.
pub const FILE_FACADE_CLASS_NAME: &str = "PluginAccessorsKt";

const PLUGINS_FIELD_NAME: &str = "plugins";
const PLUGIN_ID_METHOD: &str = "id";
const PLUGIN_ID_METHOD_DESC: &str =
    "(Ljava/lang/String;)Lorg/gradle/plugin/use/PluginDependencySpec;";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("cannot emit class `{class}`: {source}")]
    ClassFile {
        class: String,
        #[source]
        source: ClassFileError,
    },
}

/// Class files and module descriptor for one accessor set, in write order:
/// the module descriptor, every group holder, then the facade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassArtifacts {
    files: Vec<(PathBuf, Vec<u8>)>,
    class_files: usize,
}

impl ClassArtifacts {
    /// Hand every artifact to `sink`. Returns the number of class files,
    /// the facade plus one holder per group.
    pub fn write_to<S: ArtifactSink + ?Sized>(self, sink: &S) -> usize {
        for (path, bytes) in self.files {
            sink.write_file(path, bytes);
        }
        self.class_files
    }
}

/// Emit the facade, one holder per group, and the module descriptor into
/// `bin_dir`, registered under [`DEFAULT_MODULE_NAME`].
pub fn emit_plugin_accessors_classes<S: ArtifactSink + ?Sized>(
    accessors: &[PluginAccessor],
    bin_dir: &Path,
    sink: &S,
) -> Result<usize, EmitError> {
    emit_plugin_accessors_classes_in_module(accessors, bin_dir, DEFAULT_MODULE_NAME, sink)
}

/// As [`emit_plugin_accessors_classes`], for an explicit module name.
///
/// Nothing reaches `sink` unless every class assembles. Returns the number
/// of class files written.
pub fn emit_plugin_accessors_classes_in_module<S: ArtifactSink + ?Sized>(
    accessors: &[PluginAccessor],
    bin_dir: &Path,
    module_name: &str,
    sink: &S,
) -> Result<usize, EmitError> {
    let artifacts = build_plugin_accessors_classes(accessors, bin_dir, module_name)?;
    Ok(artifacts.write_to(sink))
}

/// Assemble the facade, the group holders and the module descriptor
/// without writing anything.
pub fn build_plugin_accessors_classes(
    accessors: &[PluginAccessor],
    bin_dir: &Path,
    module_name: &str,
) -> Result<ClassArtifacts, EmitError> {
    let facade = InternalName::new(format!("{KOTLIN_DSL_PACKAGE_PATH}/{FILE_FACADE_CLASS_NAME}"));

    let mut classes = Vec::new();
    let mut header = FileFacadeHeaderWriter::new(module_name);
    let mut facade_class = ClassFileBuilder::public_final_class(facade.as_str());

    for accessor in accessors {
        let extension = accessor.extension();
        if let PluginAccessor::ForGroup { .. } = accessor {
            let group_type = &extension.return_type.internal_name;
            classes.push((group_type.clone(), build_group_class(group_type)?));
        }

        let getter = MethodSignature::getter_for(extension);
        header.write_property_of(
            &extension.receiver_type.internal_name,
            &extension.return_type.internal_name,
            &extension.name,
            &getter,
            AccessorFlags::NON_INLINE_GETTER,
        );
        facade_class.method(
            MethodAccess::PUBLIC | MethodAccess::STATIC,
            &getter.name,
            &getter.desc,
            accessor_method_body(accessor),
        );
    }

    facade_class.annotation(header.finish().annotation());
    let facade_bytes = facade_class
        .build()
        .map_err(|source| class_error(&facade, source))?;
    classes.push((facade.clone(), facade_bytes));

    debug!(
        bin_dir = %bin_dir.display(),
        module = module_name,
        classes = classes.len(),
        "assembled plugin accessors classes"
    );

    let class_files = classes.len();
    let mut files = Vec::with_capacity(class_files + 1);
    files.push((
        module_file_for(bin_dir, module_name),
        module_metadata_bytes_for(&[facade]),
    ));
    files.extend(
        classes
            .into_iter()
            .map(|(name, bytes)| (bin_dir.join(format!("{name}.class")), bytes)),
    );
    Ok(ClassArtifacts { files, class_files })
}

/// `public class <Group> { PluginDependenciesSpec plugins; public <Group>(PluginDependenciesSpec) }`
fn build_group_class(class_name: &InternalName) -> Result<Vec<u8>, EmitError> {
    let spec_desc = plugin_dependencies_spec_desc();
    let constructor_desc = format!("({spec_desc})V");

    let mut constructor = CodeBuilder::new();
    constructor
        .aload(0)
        .invokespecial(JAVA_LANG_OBJECT, "<init>", "()V")
        .aload(0)
        .aload(1)
        .putfield(class_name.as_str(), PLUGINS_FIELD_NAME, &spec_desc)
        .return_void();

    let mut class = ClassFileBuilder::public_class(class_name.as_str());
    class
        .field(PLUGINS_FIELD_NAME, &spec_desc)
        .method(MethodAccess::PUBLIC, "<init>", &constructor_desc, constructor);
    class.build().map_err(|source| class_error(class_name, source))
}

fn accessor_method_body(accessor: &PluginAccessor) -> CodeBuilder {
    let extension = accessor.extension();
    let mut code = CodeBuilder::new();
    match accessor {
        PluginAccessor::ForGroup { .. } => {
            let group_type = extension.return_type.internal_name.as_str();
            code.new_instance(group_type).dup();
            load_plugins(&mut code, &extension.receiver_type);
            code.invokespecial(
                group_type,
                "<init>",
                &format!("({})V", plugin_dependencies_spec_desc()),
            )
            .areturn();
        }
        PluginAccessor::ForPlugin { id, .. } => {
            load_plugins(&mut code, &extension.receiver_type);
            code.ldc_string(id)
                .invokeinterface(
                    TypeSpec::plugin_dependencies_spec().internal_name.as_str(),
                    PLUGIN_ID_METHOD,
                    PLUGIN_ID_METHOD_DESC,
                )
                .areturn();
        }
    }
    code
}

/// Push the `PluginDependenciesSpec` reachable from the receiver in local 0.
fn load_plugins(code: &mut CodeBuilder, receiver_type: &TypeSpec) {
    code.aload(0);
    if !receiver_type.is_plugin_dependencies_spec() {
        code.getfield(
            receiver_type.internal_name.as_str(),
            PLUGINS_FIELD_NAME,
            &plugin_dependencies_spec_desc(),
        );
    }
}

fn plugin_dependencies_spec_desc() -> String {
    TypeSpec::plugin_dependencies_spec().internal_name.descriptor()
}

fn class_error(class: &InternalName, source: ClassFileError) -> EmitError {
    EmitError::ClassFile {
        class: class.to_string(),
        source,
    }
}
