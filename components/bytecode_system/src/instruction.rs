//! Bytecode instruction representation
//!
//! An instruction is an opcode plus at most two typed operands. Construction
//! goes through the validator, so an `Instruction` value is always well-formed.

use std::fmt;

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::opcode::{Opcode, OperandKind, Reg};

/// Index of a method inside a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FunctionIndex(pub u32);

impl fmt::Display for FunctionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single instruction operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Signed integer
    Long(i64),
    /// String (may contain NUL)
    Str(String),
    /// Register reference
    Reg(Reg),
    /// Method index
    Func(FunctionIndex),
}

impl Operand {
    /// Returns `true` when this operand may fill a slot of `kind`.
    pub fn fits(&self, kind: OperandKind) -> bool {
        match self {
            Operand::Long(_) => kind == OperandKind::Long,
            Operand::Str(_) => kind == OperandKind::Str,
            Operand::Reg(reg) => reg.fits(kind),
            Operand::Func(_) => kind == OperandKind::Function,
        }
    }
}

impl From<i64> for Operand {
    fn from(n: i64) -> Self {
        Operand::Long(n)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Str(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Str(s)
    }
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

impl From<FunctionIndex> for Operand {
    fn from(index: FunctionIndex) -> Self {
        Operand::Func(index)
    }
}

/// Operand validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstructionError {
    /// Wrong number of operands
    #[error("{opcode} expects {expected} operand(s), got {found}")]
    Arity {
        /// The opcode being built
        opcode: Opcode,
        /// Operands the opcode takes
        expected: usize,
        /// Operands supplied
        found: usize,
    },
    /// An operand of the wrong kind
    #[error("{opcode} operand {position} should be {expected:?}")]
    Kind {
        /// The opcode being built
        opcode: Opcode,
        /// Zero-based operand position
        position: usize,
        /// Kind the opcode expects there
        expected: OperandKind,
    },
    /// A long whose magnitude does not fit the four-byte encoding
    #[error("long operand {0} does not fit in 32 bits of magnitude")]
    LongOutOfRange(i64),
}

/// A validated instruction.
///
/// # Examples
///
/// ```
/// use bytecode_system::{Instruction, Opcode, Reg};
///
/// let push = Instruction::new(Opcode::Push, vec![Reg::Ptr.into(), Reg::Arg.into()]).unwrap();
/// assert_eq!(push.to_string(), "PUSH %ptr, %arg");
///
/// assert!(Instruction::new(Opcode::Push, vec![Reg::Lex.into(), Reg::Arg.into()]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    opcode: Opcode,
    operands: ArrayVec<Operand, 2>,
}

impl Instruction {
    /// Builds an instruction, checking operands against the opcode.
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Result<Self, InstructionError> {
        let kinds = opcode.operand_kinds();
        if kinds.len() != operands.len() {
            return Err(InstructionError::Arity {
                opcode,
                expected: kinds.len(),
                found: operands.len(),
            });
        }
        for (position, (operand, &kind)) in operands.iter().zip(kinds).enumerate() {
            if !operand.fits(kind) {
                return Err(InstructionError::Kind {
                    opcode,
                    position,
                    expected: kind,
                });
            }
            if let Operand::Long(n) = *operand {
                if u32::try_from(n.unsigned_abs()).is_err() {
                    return Err(InstructionError::LongOutOfRange(n));
                }
            }
        }
        Ok(Self {
            opcode,
            operands: operands.into_iter().collect(),
        })
    }

    /// An instruction with no operands.
    pub fn bare(opcode: Opcode) -> Result<Self, InstructionError> {
        Self::new(opcode, Vec::new())
    }

    /// The opcode.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// All operands in order.
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Operand `i` as a long.
    pub fn long(&self, i: usize) -> Option<i64> {
        match self.operands.get(i) {
            Some(Operand::Long(n)) => Some(*n),
            _ => None,
        }
    }

    /// Operand `i` as a string.
    pub fn string(&self, i: usize) -> Option<&str> {
        match self.operands.get(i) {
            Some(Operand::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Operand `i` as a register.
    pub fn reg(&self, i: usize) -> Option<Reg> {
        match self.operands.get(i) {
            Some(Operand::Reg(r)) => Some(*r),
            _ => None,
        }
    }

    /// Operand `i` as a function index.
    pub fn function(&self, i: usize) -> Option<FunctionIndex> {
        match self.operands.get(i) {
            Some(Operand::Func(f)) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Long(n) => write!(f, "{}", n),
            Operand::Reg(r) => write!(f, "{}", r),
            Operand::Func(i) => write!(f, "{}", i),
            Operand::Str(s) => {
                f.write_str("\"")?;
                for ch in s.chars() {
                    match ch {
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\\' => f.write_str("\\\\")?,
                        '"' => f.write_str("\\\"")?,
                        '\0' => f.write_str("\\0")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for (i, operand) in self.operands.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{}", operand)?;
        }
        Ok(())
    }
}
