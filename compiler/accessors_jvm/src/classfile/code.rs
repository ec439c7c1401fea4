//! Bytecode builder.
//!
//! Instructions are recorded symbolically and only assembled once the
//! owning class has a constant pool. Assembly tracks the operand stack, so
//! `max_stack` and `max_locals` are derived from the instruction stream.
//! The generated methods are straight-line code, so no stack map frames
//! are needed.

use super::constant_pool::ConstantPool;
use super::ClassFileError;
use crate::bytes::ByteWriter;

const ALOAD: u8 = 0x19;
const ALOAD_0: u8 = 0x2a;
const LDC: u8 = 0x12;
const LDC_W: u8 = 0x13;
const DUP: u8 = 0x59;
const ARETURN: u8 = 0xb0;
const RETURN: u8 = 0xb1;
const GETFIELD: u8 = 0xb4;
const PUTFIELD: u8 = 0xb5;
const INVOKESPECIAL: u8 = 0xb7;
const INVOKEINTERFACE: u8 = 0xb9;
const NEW: u8 = 0xbb;
const WIDE: u8 = 0xc4;

/// Largest `code` array a method may carry.
const MAX_CODE_LENGTH: usize = u16::MAX as usize;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Instruction {
    ALoad(u16),
    New(String),
    Dup,
    GetField { owner: String, name: String, desc: String },
    PutField { owner: String, name: String, desc: String },
    InvokeSpecial { owner: String, name: String, desc: String },
    InvokeInterface { owner: String, name: String, desc: String },
    LdcString(String),
    AReturn,
    Return,
}

/// Body of a method under construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeBuilder {
    instructions: Vec<Instruction>,
}

/// Output of [`CodeBuilder::assemble`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledCode {
    pub bytes: Vec<u8>,
    pub max_stack: u16,
    pub max_locals: u16,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aload(&mut self, local: u16) -> &mut Self {
        self.push(Instruction::ALoad(local))
    }

    pub fn new_instance(&mut self, class: &str) -> &mut Self {
        self.push(Instruction::New(class.to_owned()))
    }

    pub fn dup(&mut self) -> &mut Self {
        self.push(Instruction::Dup)
    }

    pub fn getfield(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.push(Instruction::GetField {
            owner: owner.to_owned(),
            name: name.to_owned(),
            desc: desc.to_owned(),
        })
    }

    pub fn putfield(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.push(Instruction::PutField {
            owner: owner.to_owned(),
            name: name.to_owned(),
            desc: desc.to_owned(),
        })
    }

    pub fn invokespecial(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.push(Instruction::InvokeSpecial {
            owner: owner.to_owned(),
            name: name.to_owned(),
            desc: desc.to_owned(),
        })
    }

    pub fn invokeinterface(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.push(Instruction::InvokeInterface {
            owner: owner.to_owned(),
            name: name.to_owned(),
            desc: desc.to_owned(),
        })
    }

    /// Push a `java.lang.String` constant.
    pub fn ldc_string(&mut self, value: &str) -> &mut Self {
        self.push(Instruction::LdcString(value.to_owned()))
    }

    pub fn areturn(&mut self) -> &mut Self {
        self.push(Instruction::AReturn)
    }

    pub fn return_void(&mut self) -> &mut Self {
        self.push(Instruction::Return)
    }

    fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Encode the instructions, interning every referenced constant.
    ///
    /// `parameter_slots` is the size of the incoming locals: the declared
    /// parameters plus the receiver for instance methods.
    pub fn assemble(
        &self,
        pool: &mut ConstantPool,
        parameter_slots: u16,
    ) -> Result<AssembledCode, ClassFileError> {
        let mut out = ByteWriter::with_capacity(self.instructions.len() * 3);
        let mut stack = StackTracker::default();
        let mut max_locals = parameter_slots;

        for instruction in &self.instructions {
            match instruction {
                Instruction::ALoad(local) => {
                    match u8::try_from(*local) {
                        Ok(n @ 0..=3) => out.write_u8(ALOAD_0 + n),
                        Ok(n) => {
                            out.write_u8(ALOAD);
                            out.write_u8(n);
                        }
                        Err(_) => {
                            out.write_u8(WIDE);
                            out.write_u8(ALOAD);
                            out.write_u16(*local);
                        }
                    }
                    max_locals = max_locals.max(local.saturating_add(1));
                    stack.push(1);
                }
                Instruction::New(class) => {
                    out.write_u8(NEW);
                    out.write_u16(pool.class(class)?);
                    stack.push(1);
                }
                Instruction::Dup => {
                    out.write_u8(DUP);
                    stack.pop(1)?;
                    stack.push(2);
                }
                Instruction::GetField { owner, name, desc } => {
                    out.write_u8(GETFIELD);
                    out.write_u16(pool.field_ref(owner, name, desc)?);
                    stack.pop(1)?;
                    stack.push(field_slots(desc)?);
                }
                Instruction::PutField { owner, name, desc } => {
                    out.write_u8(PUTFIELD);
                    out.write_u16(pool.field_ref(owner, name, desc)?);
                    stack.pop(1 + field_slots(desc)?)?;
                }
                Instruction::InvokeSpecial { owner, name, desc } => {
                    let (arguments, result) = method_slots(desc)?;
                    out.write_u8(INVOKESPECIAL);
                    out.write_u16(pool.method_ref(owner, name, desc)?);
                    stack.pop(1 + arguments)?;
                    stack.push(result);
                }
                Instruction::InvokeInterface { owner, name, desc } => {
                    let (arguments, result) = method_slots(desc)?;
                    let count = u8::try_from(1 + arguments).map_err(|_| {
                        ClassFileError::MalformedDescriptor {
                            descriptor: desc.clone(),
                        }
                    })?;
                    out.write_u8(INVOKEINTERFACE);
                    out.write_u16(pool.interface_method_ref(owner, name, desc)?);
                    out.write_u8(count);
                    out.write_u8(0);
                    stack.pop(1 + arguments)?;
                    stack.push(result);
                }
                Instruction::LdcString(value) => {
                    let index = pool.string(value)?;
                    match u8::try_from(index) {
                        Ok(narrow) => {
                            out.write_u8(LDC);
                            out.write_u8(narrow);
                        }
                        Err(_) => {
                            out.write_u8(LDC_W);
                            out.write_u16(index);
                        }
                    }
                    stack.push(1);
                }
                Instruction::AReturn => {
                    out.write_u8(ARETURN);
                    stack.pop(1)?;
                }
                Instruction::Return => out.write_u8(RETURN),
            }
        }

        if out.len() > MAX_CODE_LENGTH {
            return Err(ClassFileError::CodeTooLarge { len: out.len() });
        }
        Ok(AssembledCode {
            bytes: out.finish(),
            max_stack: stack.max,
            max_locals,
        })
    }
}

#[derive(Default)]
struct StackTracker {
    depth: u16,
    max: u16,
}

impl StackTracker {
    fn push(&mut self, slots: u16) {
        self.depth = self.depth.saturating_add(slots);
        self.max = self.max.max(self.depth);
    }

    fn pop(&mut self, slots: u16) -> Result<(), ClassFileError> {
        self.depth = self
            .depth
            .checked_sub(slots)
            .ok_or(ClassFileError::StackUnderflow)?;
        Ok(())
    }
}

/// Stack slots taken by a value of field type `desc`.
fn field_slots(desc: &str) -> Result<u16, ClassFileError> {
    let mut chars = desc.chars().peekable();
    let slots = parse_field_type(&mut chars).ok_or_else(|| malformed(desc))?;
    if chars.next().is_some() {
        return Err(malformed(desc));
    }
    Ok(slots)
}

/// Slots taken by the arguments and by the result of method type `desc`.
pub(crate) fn method_slots(desc: &str) -> Result<(u16, u16), ClassFileError> {
    let mut chars = desc.chars().peekable();
    if chars.next() != Some('(') {
        return Err(malformed(desc));
    }
    let mut arguments = 0u16;
    loop {
        if chars.peek() == Some(&')') {
            chars.next();
            break;
        }
        let slots = parse_field_type(&mut chars).ok_or_else(|| malformed(desc))?;
        arguments = arguments.checked_add(slots).ok_or_else(|| malformed(desc))?;
    }
    let result = if chars.peek() == Some(&'V') {
        chars.next();
        0
    } else {
        parse_field_type(&mut chars).ok_or_else(|| malformed(desc))?
    };
    if chars.next().is_some() {
        return Err(malformed(desc));
    }
    Ok((arguments, result))
}

fn parse_field_type(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<u16> {
    match chars.next()? {
        'B' | 'C' | 'F' | 'I' | 'S' | 'Z' => Some(1),
        'J' | 'D' => Some(2),
        'L' => {
            let mut empty = true;
            loop {
                match chars.next()? {
                    ';' if !empty => return Some(1),
                    ';' => return None,
                    _ => empty = false,
                }
            }
        }
        '[' => parse_field_type(chars).map(|_| 1),
        _ => None,
    }
}

fn malformed(desc: &str) -> ClassFileError {
    ClassFileError::MalformedDescriptor {
        descriptor: desc.to_owned(),
    }
}
