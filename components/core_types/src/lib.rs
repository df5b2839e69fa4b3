//! Shared value-level types for the prototype VM.
//!
//! This crate holds the pieces every other component needs and that carry
//! no object-graph state of their own.
//!
//! # Overview
//!
//! - [`Symbol`] / [`SymbolTable`] - interned identifiers
//! - [`Protection`] - slot protection bits
//! - [`Number`] / [`ArithOp`] - the numeric tower
//! - [`Stream`] / [`ProcessHandle`] - opaque OS handles
//! - [`TraceFrame`] - backtrace entries
//! - [`ErrorKind`], [`ProtectionError`], [`NumberError`] - error types
//!
//! # Examples
//!
//! ```
//! use core_types::{ArithOp, Number, Protection, Symbol, SymbolTable};
//!
//! let mut symbols = SymbolTable::new();
//! let x = symbols.intern("x");
//! assert_ne!(x, Symbol::PARENT);
//!
//! let sum = Number::Small(40).apply(ArithOp::Add, &Number::Small(2)).unwrap();
//! assert_eq!(sum.to_string(), "42");
//!
//! assert!((Protection::ASSIGN | Protection::DELETE).is_protected(Protection::DELETE));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod number;
mod process;
mod protection;
mod source;
mod stream;
mod symbol;

pub use error::{ErrorKind, NumberError, ProtectionError};
pub use number::{ArithOp, Number};
pub use process::{ProcessHandle, ProcessPtr};
pub use protection::Protection;
pub use source::TraceFrame;
pub use stream::{Stream, StreamPtr};
pub use symbol::{Symbol, SymbolKind, SymbolTable};
