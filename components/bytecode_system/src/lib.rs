//! Bytecode system for the prototype VM
//!
//! This crate defines the instruction set the execution engine runs, the
//! containers that hold compiled code, and the two external forms of that
//! code: a compact binary encoding and a line-oriented assembly text.
//!
//! # Features
//!
//! - Closed opcode set with a per-opcode operand validator
//! - Append-only translation units shared by reference
//! - Bit-exact binary codec and compiled-unit files
//! - Text assembler and disassembler
//!
//! # Example
//!
//! ```
//! use bytecode_system::{asm, codec, Method, FunctionIndex, TranslationUnit};
//!
//! let methods = asm::assemble("INT 40\nRET\n").unwrap();
//! let bytes = codec::encode_sequence(&methods[0]).unwrap();
//! assert_eq!(codec::decode_sequence(&bytes).unwrap(), methods[0]);
//!
//! let unit = TranslationUnit::from_methods(methods);
//! let mut cursor = Method::new(unit, FunctionIndex(0)).seek();
//! assert_eq!(cursor.advance().unwrap().to_string(), "INT 40");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asm;
pub mod codec;
pub mod instruction;
pub mod opcode;
pub mod unit;

// Re-export main types at crate root
pub use asm::AsmError;
pub use codec::{CodecError, UnitHeader};
pub use instruction::{FunctionIndex, Instruction, InstructionError, Operand};
pub use opcode::{Opcode, OperandKind, Reg};
pub use unit::{Method, MethodSeek, TranslationUnit};
