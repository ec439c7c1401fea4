//! Constant pool with structural deduplication.
//!
//! Entries are interned by value, so requesting the same constant twice
//! yields the same index. Index 0 is reserved by the format; the first
//! entry is 1. Only single-slot entry kinds exist here.

use rustc_hash::FxHashMap;

use super::ClassFileError;
use crate::bytes::ByteWriter;

const CONSTANT_UTF8: u8 = 1;
const CONSTANT_INTEGER: u8 = 3;
const CONSTANT_CLASS: u8 = 7;
const CONSTANT_STRING: u8 = 8;
const CONSTANT_FIELDREF: u8 = 9;
const CONSTANT_METHODREF: u8 = 10;
const CONSTANT_INTERFACE_METHODREF: u8 = 11;
const CONSTANT_NAME_AND_TYPE: u8 = 12;

/// Largest usable index: the pool count is a `u16` holding `entries + 1`.
const MAX_INDEX: usize = u16::MAX as usize - 1;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Constant {
    Utf8(Vec<u8>),
    Integer(i32),
    Class(u16),
    String(u16),
    NameAndType { name: u16, descriptor: u16 },
    Fieldref { class: u16, name_and_type: u16 },
    Methodref { class: u16, name_and_type: u16 },
    InterfaceMethodref { class: u16, name_and_type: u16 },
}

#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
    index: FxHashMap<Constant, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the `constant_pool_count` header field.
    pub fn count(&self) -> u16 {
        // Bounded by MAX_INDEX in `intern`.
        u16::try_from(self.entries.len() + 1).unwrap_or(u16::MAX)
    }

    pub fn utf8(&mut self, value: &str) -> Result<u16, ClassFileError> {
        let bytes = modified_utf8(value);
        if bytes.len() > usize::from(u16::MAX) {
            return Err(ClassFileError::Utf8TooLong { len: bytes.len() });
        }
        self.intern(Constant::Utf8(bytes))
    }

    pub fn integer(&mut self, value: i32) -> Result<u16, ClassFileError> {
        self.intern(Constant::Integer(value))
    }

    /// `internal_name` in slash form, e.g. `java/lang/Object`.
    pub fn class(&mut self, internal_name: &str) -> Result<u16, ClassFileError> {
        let name = self.utf8(internal_name)?;
        self.intern(Constant::Class(name))
    }

    pub fn string(&mut self, value: &str) -> Result<u16, ClassFileError> {
        let utf8 = self.utf8(value)?;
        self.intern(Constant::String(utf8))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, ClassFileError> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.intern(Constant::NameAndType { name, descriptor })
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, desc: &str) -> Result<u16, ClassFileError> {
        let (class, name_and_type) = self.member(owner, name, desc)?;
        self.intern(Constant::Fieldref {
            class,
            name_and_type,
        })
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, desc: &str) -> Result<u16, ClassFileError> {
        let (class, name_and_type) = self.member(owner, name, desc)?;
        self.intern(Constant::Methodref {
            class,
            name_and_type,
        })
    }

    pub fn interface_method_ref(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Result<u16, ClassFileError> {
        let (class, name_and_type) = self.member(owner, name, desc)?;
        self.intern(Constant::InterfaceMethodref {
            class,
            name_and_type,
        })
    }

    fn member(&mut self, owner: &str, name: &str, desc: &str) -> Result<(u16, u16), ClassFileError> {
        let class = self.class(owner)?;
        let name_and_type = self.name_and_type(name, desc)?;
        Ok((class, name_and_type))
    }

    fn intern(&mut self, constant: Constant) -> Result<u16, ClassFileError> {
        if let Some(&index) = self.index.get(&constant) {
            return Ok(index);
        }
        let next = self.entries.len() + 1;
        if next > MAX_INDEX {
            return Err(ClassFileError::ConstantPoolOverflow);
        }
        let index = u16::try_from(next).map_err(|_| ClassFileError::ConstantPoolOverflow)?;
        self.entries.push(constant.clone());
        self.index.insert(constant, index);
        Ok(index)
    }

    pub(crate) fn write(&self, out: &mut ByteWriter) {
        out.write_u16(self.count());
        for constant in &self.entries {
            match constant {
                Constant::Utf8(bytes) => {
                    out.write_u8(CONSTANT_UTF8);
                    // Length checked in `utf8`.
                    out.write_u16(u16::try_from(bytes.len()).unwrap_or(u16::MAX));
                    out.write_bytes(bytes);
                }
                Constant::Integer(value) => {
                    out.write_u8(CONSTANT_INTEGER);
                    out.write_i32(*value);
                }
                Constant::Class(name) => {
                    out.write_u8(CONSTANT_CLASS);
                    out.write_u16(*name);
                }
                Constant::String(utf8) => {
                    out.write_u8(CONSTANT_STRING);
                    out.write_u16(*utf8);
                }
                Constant::NameAndType { name, descriptor } => {
                    out.write_u8(CONSTANT_NAME_AND_TYPE);
                    out.write_u16(*name);
                    out.write_u16(*descriptor);
                }
                Constant::Fieldref {
                    class,
                    name_and_type,
                } => {
                    out.write_u8(CONSTANT_FIELDREF);
                    out.write_u16(*class);
                    out.write_u16(*name_and_type);
                }
                Constant::Methodref {
                    class,
                    name_and_type,
                } => {
                    out.write_u8(CONSTANT_METHODREF);
                    out.write_u16(*class);
                    out.write_u16(*name_and_type);
                }
                Constant::InterfaceMethodref {
                    class,
                    name_and_type,
                } => {
                    out.write_u8(CONSTANT_INTERFACE_METHODREF);
                    out.write_u16(*class);
                    out.write_u16(*name_and_type);
                }
            }
        }
    }
}

/// Encode `value` in the JVM's modified UTF-8.
///
/// Differs from standard UTF-8 in two ways: U+0000 takes two bytes
/// (`C0 80`), and supplementary characters are written as a surrogate pair
/// with each half encoded separately in three bytes.
#[expect(
    clippy::cast_possible_truncation,
    reason = "every shifted value is masked to its byte range first"
)]
pub fn modified_utf8(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => bytes.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                bytes.push(0xC0 | (unit >> 6) as u8);
                bytes.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                bytes.push(0xE0 | (unit >> 12) as u8);
                bytes.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                bytes.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    bytes
}
