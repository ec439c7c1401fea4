//! Class file builder.
//!
//! Describes a class declaratively and serializes it in the version 52
//! (Java 8) class file format:
//!
//! ```text
//! ┌──────────┬───────────────┬───────────────┬──────────────────────────┐
//! │ CAFEBABE │ minor │ major │ constant pool │ access │ this │ super │ … │
//! └──────────┴───────────────┴───────────────┴──────────────────────────┘
//!   … interfaces (none) │ fields │ methods (+ Code) │ class attributes
//! ```
//!
//! The constant pool must be complete before it is written, so the body is
//! serialized first into a scratch buffer while constants are interned, and
//! the header and pool are prepended afterwards.

mod code;
mod constant_pool;
#[cfg(test)]
pub(crate) mod reader;

use bitflags::bitflags;

use crate::bytes::ByteWriter;

pub use code::{AssembledCode, CodeBuilder};
pub use constant_pool::{modified_utf8, ConstantPool};

const MAGIC: u32 = 0xCAFE_BABE;
const MAJOR_VERSION_JAVA_8: u16 = 52;

/// Internal name of `java.lang.Object`.
pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClassFileError {
    #[error("constant pool exceeds 65535 entries")]
    ConstantPoolOverflow,

    #[error("constant of {len} bytes exceeds the 65535 byte limit")]
    Utf8TooLong { len: usize },

    #[error("method body of {len} bytes exceeds the 65535 byte limit")]
    CodeTooLarge { len: usize },

    #[error("malformed descriptor `{descriptor}`")]
    MalformedDescriptor { descriptor: String },

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("too many {what} (limit is 65535)")]
    TooMany { what: &'static str },
}

bitflags! {
    /// `access_flags` of a class.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct ClassAccess: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
    }
}

bitflags! {
    /// `access_flags` of a method.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct MethodAccess: u16 {
        const PUBLIC = 0x0001;
        const STATIC = 0x0008;
    }
}

/// Value of an annotation element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementValue {
    Int(i32),
    String(String),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    pub fn ints(values: &[i32]) -> Self {
        ElementValue::Array(values.iter().copied().map(ElementValue::Int).collect())
    }

    pub fn strings<S: AsRef<str>>(values: &[S]) -> Self {
        ElementValue::Array(
            values
                .iter()
                .map(|s| ElementValue::String(s.as_ref().to_owned()))
                .collect(),
        )
    }
}

/// A runtime-visible annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// Field descriptor of the annotation type, e.g. `Lkotlin/Metadata;`.
    pub type_desc: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub fn new(type_desc: impl Into<String>) -> Self {
        Self {
            type_desc: type_desc.into(),
            elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_element(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.elements.push((name.into(), value));
        self
    }
}

#[derive(Clone, Debug)]
struct FieldDef {
    name: String,
    desc: String,
}

#[derive(Clone, Debug)]
struct MethodDef {
    access: MethodAccess,
    name: String,
    desc: String,
    code: CodeBuilder,
}

/// A class under construction.
#[derive(Clone, Debug)]
pub struct ClassFileBuilder {
    access: ClassAccess,
    name: String,
    super_name: String,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    annotations: Vec<Annotation>,
}

impl ClassFileBuilder {
    /// A class extending `java.lang.Object`.
    pub fn new(access: ClassAccess, name: &str) -> Self {
        Self {
            access,
            name: name.to_owned(),
            super_name: JAVA_LANG_OBJECT.to_owned(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn public_class(name: &str) -> Self {
        Self::new(ClassAccess::PUBLIC | ClassAccess::SUPER, name)
    }

    pub fn public_final_class(name: &str) -> Self {
        Self::new(
            ClassAccess::PUBLIC | ClassAccess::FINAL | ClassAccess::SUPER,
            name,
        )
    }

    /// Add a package-private instance field.
    pub fn field(&mut self, name: &str, desc: &str) -> &mut Self {
        self.fields.push(FieldDef {
            name: name.to_owned(),
            desc: desc.to_owned(),
        });
        self
    }

    pub fn method(
        &mut self,
        access: MethodAccess,
        name: &str,
        desc: &str,
        code: CodeBuilder,
    ) -> &mut Self {
        self.methods.push(MethodDef {
            access,
            name: name.to_owned(),
            desc: desc.to_owned(),
            code,
        });
        self
    }

    pub fn annotation(&mut self, annotation: Annotation) -> &mut Self {
        self.annotations.push(annotation);
        self
    }

    /// Serialize the class.
    pub fn build(&self) -> Result<Vec<u8>, ClassFileError> {
        let mut pool = ConstantPool::new();
        let mut body = ByteWriter::new();

        body.write_u16(self.access.bits());
        body.write_u16(pool.class(&self.name)?);
        body.write_u16(pool.class(&self.super_name)?);
        body.write_u16(0); // interfaces

        body.write_u16(count_u16(self.fields.len(), "fields")?);
        for field in &self.fields {
            body.write_u16(0); // access_flags: package-private
            body.write_u16(pool.utf8(&field.name)?);
            body.write_u16(pool.utf8(&field.desc)?);
            body.write_u16(0); // attributes
        }

        body.write_u16(count_u16(self.methods.len(), "methods")?);
        for method in &self.methods {
            write_method(method, &mut pool, &mut body)?;
        }

        if self.annotations.is_empty() {
            body.write_u16(0);
        } else {
            body.write_u16(1);
            write_annotations(&self.annotations, &mut pool, &mut body)?;
        }

        let body = body.finish();
        let mut out = ByteWriter::with_capacity(body.len() + 1024);
        out.write_u32(MAGIC);
        out.write_u16(0);
        out.write_u16(MAJOR_VERSION_JAVA_8);
        pool.write(&mut out);
        out.write_bytes(&body);
        Ok(out.finish())
    }
}

fn write_method(
    method: &MethodDef,
    pool: &mut ConstantPool,
    out: &mut ByteWriter,
) -> Result<(), ClassFileError> {
    out.write_u16(method.access.bits());
    out.write_u16(pool.utf8(&method.name)?);
    out.write_u16(pool.utf8(&method.desc)?);
    out.write_u16(1); // attributes: Code

    let (arguments, _) = code::method_slots(&method.desc)?;
    let receiver = u16::from(!method.access.contains(MethodAccess::STATIC));
    let code = method
        .code
        .assemble(pool, arguments.saturating_add(receiver))?;

    out.write_u16(pool.utf8("Code")?);
    // max_stack, max_locals, code_length, code, exception_table_length, attributes_count
    let attribute_len = 2 + 2 + 4 + code.bytes.len() + 2 + 2;
    out.write_u32(count_u32(attribute_len)?);
    out.write_u16(code.max_stack);
    out.write_u16(code.max_locals);
    out.write_u32(count_u32(code.bytes.len())?);
    out.write_bytes(&code.bytes);
    out.write_u16(0); // exception table
    out.write_u16(0); // attributes
    Ok(())
}

fn write_annotations(
    annotations: &[Annotation],
    pool: &mut ConstantPool,
    out: &mut ByteWriter,
) -> Result<(), ClassFileError> {
    let mut payload = ByteWriter::new();
    payload.write_u16(count_u16(annotations.len(), "annotations")?);
    for annotation in annotations {
        payload.write_u16(pool.utf8(&annotation.type_desc)?);
        payload.write_u16(count_u16(annotation.elements.len(), "annotation elements")?);
        for (name, value) in &annotation.elements {
            payload.write_u16(pool.utf8(name)?);
            write_element_value(value, pool, &mut payload)?;
        }
    }

    let payload = payload.finish();
    out.write_u16(pool.utf8("RuntimeVisibleAnnotations")?);
    out.write_u32(count_u32(payload.len())?);
    out.write_bytes(&payload);
    Ok(())
}

fn write_element_value(
    value: &ElementValue,
    pool: &mut ConstantPool,
    out: &mut ByteWriter,
) -> Result<(), ClassFileError> {
    match value {
        ElementValue::Int(value) => {
            out.write_u8(b'I');
            out.write_u16(pool.integer(*value)?);
        }
        ElementValue::String(value) => {
            out.write_u8(b's');
            out.write_u16(pool.utf8(value)?);
        }
        ElementValue::Array(values) => {
            out.write_u8(b'[');
            out.write_u16(count_u16(values.len(), "array elements")?);
            for value in values {
                write_element_value(value, pool, out)?;
            }
        }
    }
    Ok(())
}

fn count_u16(len: usize, what: &'static str) -> Result<u16, ClassFileError> {
    u16::try_from(len).map_err(|_| ClassFileError::TooMany { what })
}

fn count_u32(len: usize) -> Result<u32, ClassFileError> {
    u32::try_from(len).map_err(|_| ClassFileError::TooMany {
        what: "attribute bytes",
    })
}
