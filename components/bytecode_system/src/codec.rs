//! Binary instruction codec and compiled-unit files
//!
//! Operand encodings:
//!
//! - register: one byte
//! - long: sign byte (`0x00` or `0xFF`) followed by four little-endian
//!   magnitude bytes
//! - string: raw UTF-8 bytes where a NUL is written `0x00 0x2E`, terminated
//!   by `0x00 0x00`
//! - function index: four little-endian bytes
//!
//! A compiled file is a header (magic, version, field mask, optional module
//! and package names) followed by one length-prefixed block per method until
//! end of input.

use log::debug;
use thiserror::Error;

use crate::instruction::{FunctionIndex, Instruction, InstructionError, Operand};
use crate::opcode::{Opcode, OperandKind, Reg};

/// Leading bytes of a compiled unit file.
pub const MAGIC: &[u8; 4] = b"PVMC";

/// Current compiled-file format version.
pub const FORMAT_VERSION: u8 = 1;

const FIELD_MODULE: u8 = 0x01;
const FIELD_PACKAGE: u8 = 0x02;

/// Codec failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input ended inside an instruction or header
    #[error("unexpected end of input at byte {0}")]
    Truncated(usize),
    /// Opcode byte outside the instruction set
    #[error("unknown opcode byte {0:#04x}")]
    UnknownOpcode(u8),
    /// Register byte outside the register set
    #[error("unknown register byte {0:#04x}")]
    BadRegister(u8),
    /// Long sign byte other than `0x00`/`0xFF`
    #[error("bad sign byte {0:#04x}")]
    BadSign(u8),
    /// Long whose magnitude does not fit in 32 bits
    #[error("long {0} out of encodable range")]
    LongOutOfRange(i64),
    /// `0x00` followed by something other than `0x00` or `.`
    #[error("bad string escape byte {0:#04x}")]
    BadEscape(u8),
    /// String bytes are not UTF-8
    #[error("string operand is not valid UTF-8")]
    InvalidUtf8,
    /// Decoded operands do not match the opcode
    #[error(transparent)]
    Instruction(#[from] InstructionError),
    /// Missing magic or unsupported version
    #[error("bad unit header: {0}")]
    BadHeader(String),
}

/// Optional metadata stored at the start of a compiled unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitHeader {
    /// Module name
    pub module: Option<String>,
    /// Package name
    pub package: Option<String>,
}

/// Appends the encoding of `inst` to `out`.
pub fn encode_instruction(inst: &Instruction, out: &mut Vec<u8>) -> Result<(), CodecError> {
    out.push(inst.opcode().byte());
    for operand in inst.operands() {
        match operand {
            Operand::Reg(reg) => out.push(reg.byte()),
            Operand::Long(n) => encode_long(*n, out)?,
            Operand::Str(s) => encode_string(s, out),
            Operand::Func(FunctionIndex(i)) => out.extend_from_slice(&i.to_le_bytes()),
        }
    }
    Ok(())
}

/// Encodes a whole instruction sequence.
pub fn encode_sequence(code: &[Instruction]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(code.len() * 4);
    for inst in code {
        encode_instruction(inst, &mut out)?;
    }
    Ok(out)
}

/// Decodes a byte sequence produced by [`encode_sequence`].
pub fn decode_sequence(bytes: &[u8]) -> Result<Vec<Instruction>, CodecError> {
    let mut reader = Reader::new(bytes);
    let mut code = Vec::new();
    while !reader.at_end() {
        code.push(reader.instruction()?);
    }
    Ok(code)
}

/// Serializes a compiled unit.
pub fn encode_unit<'a, I>(header: &UnitHeader, methods: I) -> Result<Vec<u8>, CodecError>
where
    I: IntoIterator<Item = &'a [Instruction]>,
{
    let mut out = Vec::with_capacity(256);
    out.extend_from_slice(MAGIC);
    out.push(FORMAT_VERSION);
    let mut fields = 0;
    if header.module.is_some() {
        fields |= FIELD_MODULE;
    }
    if header.package.is_some() {
        fields |= FIELD_PACKAGE;
    }
    out.push(fields);
    if let Some(module) = &header.module {
        encode_string(module, &mut out);
    }
    if let Some(package) = &header.package {
        encode_string(package, &mut out);
    }
    for method in methods {
        let block = encode_sequence(method)?;
        let len = u32::try_from(block.len())
            .map_err(|_| CodecError::BadHeader("method block too large".to_string()))?;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&block);
    }
    Ok(out)
}

/// Parses a compiled unit into its header and method bodies.
pub fn decode_unit(bytes: &[u8]) -> Result<(UnitHeader, Vec<Vec<Instruction>>), CodecError> {
    if !is_compiled(bytes) {
        return Err(CodecError::BadHeader("missing magic".to_string()));
    }
    let mut reader = Reader::new(bytes);
    reader.pos = MAGIC.len();
    let version = reader.byte()?;
    if version != FORMAT_VERSION {
        return Err(CodecError::BadHeader(format!(
            "unsupported version {}",
            version
        )));
    }
    let fields = reader.byte()?;
    let mut header = UnitHeader::default();
    if fields & FIELD_MODULE != 0 {
        header.module = Some(reader.string()?);
    }
    if fields & FIELD_PACKAGE != 0 {
        header.package = Some(reader.string()?);
    }
    let mut methods = Vec::new();
    while !reader.at_end() {
        let len = u32::from_le_bytes(reader.array()?) as usize;
        let block = reader.take(len)?;
        methods.push(decode_sequence(block)?);
    }
    debug!(
        "decoded unit with {} method(s), module {:?}",
        methods.len(),
        header.module
    );
    Ok((header, methods))
}

/// Returns `true` when `bytes` starts with the compiled-unit magic.
pub fn is_compiled(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

fn encode_long(n: i64, out: &mut Vec<u8>) -> Result<(), CodecError> {
    let magnitude = u32::try_from(n.unsigned_abs()).map_err(|_| CodecError::LongOutOfRange(n))?;
    out.push(if n < 0 { 0xFF } else { 0x00 });
    out.extend_from_slice(&magnitude.to_le_bytes());
    Ok(())
}

fn encode_string(s: &str, out: &mut Vec<u8>) {
    for &b in s.as_bytes() {
        if b == 0 {
            out.extend_from_slice(&[0x00, b'.']);
        } else {
            out.push(b);
        }
    }
    out.extend_from_slice(&[0x00, 0x00]);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn byte(&mut self) -> Result<u8, CodecError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(CodecError::Truncated(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(CodecError::Truncated(self.bytes.len()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array(&mut self) -> Result<[u8; 4], CodecError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(buf)
    }

    fn long(&mut self) -> Result<i64, CodecError> {
        let sign = self.byte()?;
        let magnitude = i64::from(u32::from_le_bytes(self.array()?));
        match sign {
            0x00 => Ok(magnitude),
            0xFF => Ok(-magnitude),
            other => Err(CodecError::BadSign(other)),
        }
    }

    fn string(&mut self) -> Result<String, CodecError> {
        let mut raw = Vec::new();
        loop {
            match self.byte()? {
                0x00 => match self.byte()? {
                    0x00 => break,
                    b'.' => raw.push(0),
                    other => return Err(CodecError::BadEscape(other)),
                },
                b => raw.push(b),
            }
        }
        String::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8)
    }

    fn register(&mut self) -> Result<Reg, CodecError> {
        let b = self.byte()?;
        Reg::from_byte(b).ok_or(CodecError::BadRegister(b))
    }

    fn instruction(&mut self) -> Result<Instruction, CodecError> {
        let b = self.byte()?;
        let opcode = Opcode::from_byte(b).ok_or(CodecError::UnknownOpcode(b))?;
        let mut operands = Vec::with_capacity(2);
        for kind in opcode.operand_kinds() {
            let operand = match kind {
                OperandKind::ObjectReg | OperandKind::StackReg | OperandKind::AnyReg => {
                    Operand::Reg(self.register()?)
                }
                OperandKind::Long => Operand::Long(self.long()?),
                OperandKind::Str => Operand::Str(self.string()?),
                OperandKind::Function => {
                    Operand::Func(FunctionIndex(u32::from_le_bytes(self.array()?)))
                }
            };
            operands.push(operand);
        }
        Ok(Instruction::new(opcode, operands)?)
    }
}
