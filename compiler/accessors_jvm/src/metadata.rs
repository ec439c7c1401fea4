//! Kotlin metadata for the file facade.
//!
//! A class file is only seen as Kotlin declarations when it carries a
//! `@kotlin.Metadata` annotation. For a file facade (`k = 2`) the payload is
//! a `Package` message listing top-level declarations, here one extension
//! property per accessor:
//!
//! ```text
//! d1 = encode( StringTableTypes (delimited) ++ Package )
//! d2 = string table
//! ```

mod bit_encoding;
pub(crate) mod protobuf;
mod string_table;

use accessors_ir::{InternalName, MethodSignature};
use bitflags::bitflags;

use crate::classfile::{Annotation, ElementValue};
use protobuf::ProtoWriter;

pub use bit_encoding::{encode_bytes, UTF8_MODE_MARKER};
pub use string_table::JvmStringTable;

/// Descriptor of the `kotlin.Metadata` annotation type.
pub const KOTLIN_METADATA_DESC: &str = "Lkotlin/Metadata;";

/// Metadata format version understood by the consuming compiler.
pub const METADATA_VERSION: [i32; 3] = [1, 1, 16];

/// Bytecode interface version paired with [`METADATA_VERSION`].
pub const BYTECODE_VERSION: [i32; 3] = [1, 0, 3];

/// `k` value for a file facade class.
pub const KIND_FILE_FACADE: i32 = 2;

/// Module name the compiler assumes when none is recorded.
const IMPLICIT_MODULE_NAME: &str = "main";

// Package
const PACKAGE_PROPERTY: u32 = 4;
const PACKAGE_MODULE_NAME: u32 = 101;

// Property
const PROPERTY_NAME: u32 = 2;
const PROPERTY_RETURN_TYPE: u32 = 3;
const PROPERTY_RECEIVER_TYPE: u32 = 5;
const PROPERTY_GETTER_FLAGS: u32 = 7;
const PROPERTY_SIGNATURE: u32 = 100;

// Type
const TYPE_CLASS_NAME: u32 = 6;

// JvmPropertySignature / JvmMethodSignature
const JVM_PROPERTY_GETTER: u32 = 3;
const JVM_METHOD_NAME: u32 = 1;
const JVM_METHOD_DESC: u32 = 2;

bitflags! {
    /// Flags of a property accessor.
    ///
    /// Visibility occupies bits 1..=3 as an enum, so `PUBLIC` is a two-bit
    /// pattern rather than a single flag.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct AccessorFlags: i32 {
        const PUBLIC = 3 << 1;
        const IS_NOT_DEFAULT = 1 << 6;
    }
}

impl AccessorFlags {
    /// A public getter with a real body, as every accessor has.
    pub const NON_INLINE_GETTER: Self = Self::PUBLIC.union(Self::IS_NOT_DEFAULT);
}

/// The `d1`/`d2` pair of a `kotlin.Metadata` annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KotlinMetadata {
    pub kind: i32,
    pub data1: Vec<String>,
    pub data2: Vec<String>,
}

impl KotlinMetadata {
    pub fn annotation(&self) -> Annotation {
        Annotation::new(KOTLIN_METADATA_DESC)
            .with_element("mv", ElementValue::ints(&METADATA_VERSION))
            .with_element("bv", ElementValue::ints(&BYTECODE_VERSION))
            .with_element("k", ElementValue::Int(self.kind))
            .with_element("d1", ElementValue::strings(&self.data1))
            .with_element("d2", ElementValue::strings(&self.data2))
    }
}

/// Collects the top-level declarations of a file facade.
#[derive(Debug)]
pub struct FileFacadeHeaderWriter {
    strings: JvmStringTable,
    package: ProtoWriter,
    module_name: String,
}

impl FileFacadeHeaderWriter {
    pub fn new(module_name: &str) -> Self {
        Self {
            strings: JvmStringTable::new(),
            package: ProtoWriter::new(),
            module_name: module_name.to_owned(),
        }
    }

    /// Declare `val <receiver>.<name>: <return_type>` backed by `getter`.
    pub fn write_property_of(
        &mut self,
        receiver_type: &InternalName,
        return_type: &InternalName,
        name: &str,
        getter: &MethodSignature,
        getter_flags: AccessorFlags,
    ) {
        let mut property = ProtoWriter::new();
        property.int32_field(PROPERTY_NAME, self.strings.string_index(name));
        property.message_field(PROPERTY_RETURN_TYPE, self.class_type(return_type));
        property.message_field(PROPERTY_RECEIVER_TYPE, self.class_type(receiver_type));
        property.int32_field(PROPERTY_GETTER_FLAGS, getter_flags.bits());
        // `flags` stays absent: readers then assume a public `val` with a getter.

        let mut method = ProtoWriter::new();
        method.int32_field(JVM_METHOD_NAME, self.strings.string_index(&getter.name));
        method.int32_field(JVM_METHOD_DESC, self.strings.string_index(&getter.desc));
        let mut signature = ProtoWriter::new();
        signature.message_field(JVM_PROPERTY_GETTER, method);
        property.message_field(PROPERTY_SIGNATURE, signature);

        self.package.message_field(PACKAGE_PROPERTY, property);
    }

    fn class_type(&mut self, class: &InternalName) -> ProtoWriter {
        let mut ty = ProtoWriter::new();
        ty.int32_field(
            TYPE_CLASS_NAME,
            self.strings.qualified_class_name_index(class.as_str()),
        );
        ty
    }

    pub fn finish(mut self) -> KotlinMetadata {
        if self.module_name != IMPLICIT_MODULE_NAME {
            let index = self.strings.string_index(&self.module_name);
            self.package.int32_field(PACKAGE_MODULE_NAME, index);
        }

        let mut payload = ProtoWriter::new();
        payload.write_delimited(self.strings.types_message());
        payload.append(self.package);

        KotlinMetadata {
            kind: KIND_FILE_FACADE,
            data1: encode_bytes(&payload.finish()),
            data2: self.strings.strings().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests;
