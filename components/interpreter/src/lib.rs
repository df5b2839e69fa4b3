//! Interpreter - register machine for the prototype object model
//!
//! This crate provides:
//! - The register file, split into persistent, transient and read-only parts
//! - Instruction dispatch for the full opcode set
//! - Method calls with lexical/dynamic scope frames and backtraces
//! - First-class continuations with dynamic-wind thunks
//! - Exception raising through ground routines and handler stacks
//! - Native callbacks, register dumps and collector pacing
//!
//! # Example
//!
//! ```
//! use bytecode_system::{asm, TranslationUnit};
//! use interpreter::Vm;
//!
//! let mut vm = Vm::new().unwrap();
//! let code = asm::assemble(
//!     "INT 50\nNSWAP\nINT 8\nNSWAP\nARITH 2\nYLDC 5 %ptr\nLOAD %num0\nMOV %ptr %ret\nUNTR\n",
//! )
//! .unwrap();
//! vm.eval(TranslationUnit::from_methods(code));
//! vm.run().unwrap();
//! assert_eq!(vm.ret_number(), Some(42i64.into()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod continuation;
pub(crate) mod dispatch;
pub mod dump;
pub mod error;
pub mod ground;
pub mod literals;
pub mod natives;
pub mod persistent;
pub mod state;
pub mod vm;
pub mod wind;

pub use config::VmConfig;
pub use continuation::Snapshot;
pub use dump::{CursorDump, StateDump};
pub use error::VmError;
pub use ground::Gtu;
pub use literals::Lit;
pub use persistent::PList;
pub use state::{IntState, NativeFn, ReadOnlyState, TransientState};
pub use vm::{HaltReason, Vm};
pub use wind::{resolve_thunks, Thunk, WindFrame};
