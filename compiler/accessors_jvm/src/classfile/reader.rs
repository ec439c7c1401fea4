//! Minimal class file reader for checking emitted bytes in tests.
//!
//! Understands exactly the subset the builder produces and panics on
//! anything else.

#![allow(clippy::expect_used)]

use super::ElementValue;

#[derive(Clone, Debug)]
enum Entry {
    Unused,
    Utf8(String),
    Integer(i32),
    Class(u16),
    String(u16),
    NameAndType(u16, u16),
    Member(u16, u16),
}

#[derive(Clone, Debug)]
pub struct Field {
    pub access: u16,
    pub name: String,
    pub desc: String,
}

#[derive(Clone, Debug)]
pub struct Method {
    pub access: u16,
    pub name: String,
    pub desc: String,
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct ClassFile {
    pub major_version: u16,
    pub access: u16,
    pub this_class: String,
    pub super_class: String,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub annotations: Vec<(String, Vec<(String, ElementValue)>)>,
    pool: Vec<Entry>,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn u8(&mut self) -> u8 {
        let value = self.bytes[self.pos];
        self.pos += 1;
        value
    }

    fn u16(&mut self) -> u16 {
        u16::from_be_bytes([self.u8(), self.u8()])
    }

    fn u32(&mut self) -> u32 {
        u32::from_be_bytes([self.u8(), self.u8(), self.u8(), self.u8()])
    }

    fn take(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        slice
    }
}

/// Decode JVM modified UTF-8.
pub fn decode_modified_utf8(bytes: &[u8]) -> String {
    let mut units = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = u16::from(bytes[i]);
        if b & 0x80 == 0 {
            units.push(b);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            units.push(((b & 0x1F) << 6) | (u16::from(bytes[i + 1]) & 0x3F));
            i += 2;
        } else {
            units.push(
                ((b & 0x0F) << 12)
                    | ((u16::from(bytes[i + 1]) & 0x3F) << 6)
                    | (u16::from(bytes[i + 2]) & 0x3F),
            );
            i += 3;
        }
    }
    String::from_utf16(&units).expect("valid UTF-16")
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> ClassFile {
        let mut c = Cursor { bytes, pos: 0 };
        assert_eq!(c.u32(), 0xCAFE_BABE, "bad magic");
        let _minor = c.u16();
        let major_version = c.u16();

        let count = c.u16();
        let mut pool = vec![Entry::Unused];
        for _ in 1..count {
            let entry = match c.u8() {
                1 => {
                    let len = usize::from(c.u16());
                    Entry::Utf8(decode_modified_utf8(c.take(len)))
                }
                3 => Entry::Integer(i32::from_be_bytes([c.u8(), c.u8(), c.u8(), c.u8()])),
                7 => Entry::Class(c.u16()),
                8 => Entry::String(c.u16()),
                9 | 10 | 11 => Entry::Member(c.u16(), c.u16()),
                12 => Entry::NameAndType(c.u16(), c.u16()),
                tag => panic!("unexpected constant tag {tag}"),
            };
            pool.push(entry);
        }

        let mut class = ClassFile {
            major_version,
            access: 0,
            this_class: String::new(),
            super_class: String::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            pool,
        };

        class.access = c.u16();
        let this_index = c.u16();
        class.this_class = class.class_name(this_index);
        let super_index = c.u16();
        class.super_class = class.class_name(super_index);
        assert_eq!(c.u16(), 0, "interfaces");

        for _ in 0..c.u16() {
            let access = c.u16();
            let name = class.utf8(c.u16());
            let desc = class.utf8(c.u16());
            assert_eq!(c.u16(), 0, "field attributes");
            class.fields.push(Field { access, name, desc });
        }

        for _ in 0..c.u16() {
            let access = c.u16();
            let name = class.utf8(c.u16());
            let desc = class.utf8(c.u16());
            assert_eq!(c.u16(), 1, "method attributes");
            assert_eq!(class.utf8(c.u16()), "Code");
            let _len = c.u32();
            let max_stack = c.u16();
            let max_locals = c.u16();
            let code_len = c.u32() as usize;
            let code = c.take(code_len).to_vec();
            assert_eq!(c.u16(), 0, "exception table");
            assert_eq!(c.u16(), 0, "code attributes");
            class.methods.push(Method {
                access,
                name,
                desc,
                max_stack,
                max_locals,
                code,
            });
        }

        for _ in 0..c.u16() {
            assert_eq!(class.utf8(c.u16()), "RuntimeVisibleAnnotations");
            let _len = c.u32();
            for _ in 0..c.u16() {
                let type_desc = class.utf8(c.u16());
                let mut elements = Vec::new();
                for _ in 0..c.u16() {
                    let name = class.utf8(c.u16());
                    elements.push((name, class.element_value(&mut c)));
                }
                class.annotations.push((type_desc, elements));
            }
        }

        assert_eq!(c.pos, bytes.len(), "trailing bytes");
        class
    }

    fn element_value(&self, c: &mut Cursor<'_>) -> ElementValue {
        match c.u8() {
            b'I' => match &self.pool[usize::from(c.u16())] {
                Entry::Integer(value) => ElementValue::Int(*value),
                other => panic!("expected integer, found {other:?}"),
            },
            b's' => ElementValue::String(self.utf8(c.u16())),
            b'[' => {
                let count = c.u16();
                ElementValue::Array((0..count).map(|_| self.element_value(c)).collect())
            }
            tag => panic!("unexpected element tag {tag}"),
        }
    }

    pub fn utf8(&self, index: u16) -> String {
        match &self.pool[usize::from(index)] {
            Entry::Utf8(value) => value.clone(),
            other => panic!("expected Utf8 at {index}, found {other:?}"),
        }
    }

    pub fn class_name(&self, index: u16) -> String {
        match &self.pool[usize::from(index)] {
            Entry::Class(name) => self.utf8(*name),
            other => panic!("expected Class at {index}, found {other:?}"),
        }
    }

    fn member(&self, index: u16) -> String {
        match &self.pool[usize::from(index)] {
            Entry::Member(class, name_and_type) => match &self.pool[usize::from(*name_and_type)] {
                Entry::NameAndType(name, desc) => format!(
                    "{}.{}:{}",
                    self.class_name(*class),
                    self.utf8(*name),
                    self.utf8(*desc)
                ),
                other => panic!("expected NameAndType, found {other:?}"),
            },
            other => panic!("expected member ref at {index}, found {other:?}"),
        }
    }

    fn string(&self, index: u16) -> String {
        match &self.pool[usize::from(index)] {
            Entry::String(utf8) => self.utf8(*utf8),
            other => panic!("expected String at {index}, found {other:?}"),
        }
    }

    pub fn method(&self, name: &str) -> &Method {
        self.methods
            .iter()
            .find(|method| method.name == name)
            .unwrap_or_else(|| panic!("no method `{name}`"))
    }

    pub fn annotation(&self, type_desc: &str) -> &[(String, ElementValue)] {
        self.annotations
            .iter()
            .find(|(desc, _)| desc == type_desc)
            .map(|(_, elements)| elements.as_slice())
            .unwrap_or_else(|| panic!("no annotation `{type_desc}`"))
    }

    /// Decode `method` into `(opcode, operand)` pairs. `aload` operands are
    /// local indices, `invokeinterface` carries its pool index only.
    fn instructions(&self, method: &Method) -> Vec<(u8, u16)> {
        let mut c = Cursor {
            bytes: &method.code,
            pos: 0,
        };
        let mut instructions = Vec::new();
        while c.pos < method.code.len() {
            let op = c.u8();
            let instruction = match op {
                0x2a..=0x2d => (0x19, u16::from(op - 0x2a)),
                0x19 | 0x12 => (op, u16::from(c.u8())),
                0xc4 => {
                    assert_eq!(c.u8(), 0x19);
                    (0x19, c.u16())
                }
                0x13 => (0x12, c.u16()),
                0x59 | 0xb0 | 0xb1 => (op, 0),
                0xb4 | 0xb5 | 0xb7 | 0xbb => (op, c.u16()),
                0xb9 => {
                    let index = c.u16();
                    let _count = c.u8();
                    assert_eq!(c.u8(), 0);
                    (op, index)
                }
                op => panic!("unexpected opcode {op:#x}"),
            };
            instructions.push(instruction);
        }
        instructions
    }

    /// Disassemble `method`, one instruction per entry.
    pub fn disassemble(&self, method: &Method) -> Vec<String> {
        self.instructions(method)
            .into_iter()
            .map(|(op, operand)| match op {
                0x19 => format!("aload {operand}"),
                0x12 => format!("ldc {:?}", self.string(operand)),
                0x59 => "dup".to_owned(),
                0xb0 => "areturn".to_owned(),
                0xb1 => "return".to_owned(),
                0xb4 => format!("getfield {}", self.member(operand)),
                0xb5 => format!("putfield {}", self.member(operand)),
                0xb7 => format!("invokespecial {}", self.member(operand)),
                0xb9 => format!("invokeinterface {}", self.member(operand)),
                0xbb => format!("new {}", self.class_name(operand)),
                op => panic!("unexpected opcode {op:#x}"),
            })
            .collect()
    }

    /// Every string loaded by `ldc` in `method`.
    pub fn ldc_strings(&self, method: &Method) -> Vec<String> {
        self.instructions(method)
            .into_iter()
            .filter(|(op, _)| *op == 0x12)
            .map(|(_, index)| self.string(index))
            .collect()
    }
}
