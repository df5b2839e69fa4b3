//! Shared error types.
//!
//! Host-level failures are Rust errors built with `thiserror`. Language-level
//! errors raised inside the VM are objects; [`ErrorKind`] names the prototype
//! under the `err` literal that such an object is cloned from.

use thiserror::Error;

use crate::Symbol;

/// The language-level error prototypes known to the engine.
///
/// # Examples
///
/// ```
/// use core_types::ErrorKind;
///
/// assert_eq!(ErrorKind::TypeError.name(), "TypeError");
/// assert_eq!(ErrorKind::ALL.len(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Root of the error hierarchy
    Exception,
    /// Faults detected by the engine itself
    SystemError,
    /// Operand of the wrong kind
    TypeError,
    /// Write or delete of a protected slot
    ProtectedError,
    /// Wrong number or shape of arguments
    ArgError,
    /// Stream input failure
    InputError,
    /// A slot operation named a slot that does not exist
    SlotError,
}

impl ErrorKind {
    /// Every kind, in bootstrap order. Each kind's prototype is a clone of
    /// the one before it in the hierarchy returned by [`ErrorKind::parent`].
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Exception,
        ErrorKind::SystemError,
        ErrorKind::TypeError,
        ErrorKind::ProtectedError,
        ErrorKind::ArgError,
        ErrorKind::InputError,
        ErrorKind::SlotError,
    ];

    /// The slot name of the prototype under `err`.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Exception => "Exception",
            ErrorKind::SystemError => "SystemError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ProtectedError => "ProtectedError",
            ErrorKind::ArgError => "ArgError",
            ErrorKind::InputError => "InputError",
            ErrorKind::SlotError => "SlotError",
        }
    }

    /// The kind this prototype is cloned from (`None` for `Exception`).
    pub fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::Exception => None,
            ErrorKind::SystemError => Some(ErrorKind::Exception),
            _ => Some(ErrorKind::SystemError),
        }
    }
}

/// A write or delete was attempted on a protected slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtectionError {
    /// The slot carries the assign bit
    #[error("assign-protected variable {0}")]
    Assign(Symbol),
    /// The slot carries the delete bit
    #[error("delete-protected variable {0}")]
    Delete(Symbol),
}

impl ProtectionError {
    /// The message used when the engine raises this as a `ProtectedError`.
    pub fn message(&self) -> &'static str {
        match self {
            ProtectionError::Assign(_) => "Assign-protected variable",
            ProtectionError::Delete(_) => "Delete-protected variable",
        }
    }
}

/// Arithmetic failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NumberError {
    /// Integer division or modulo by zero
    #[error("integer division by zero")]
    DivisionByZero,
    /// Bitwise operation on a float or complex operand
    #[error("bitwise operation requires integer operands")]
    NotIntegral,
    /// Operation undefined for the operand kinds (e.g. ordering complex numbers)
    #[error("unsupported numeric operation")]
    Unsupported,
    /// An integer power whose result would be unreasonably large
    #[error("integer power too large")]
    TooLarge,
    /// Arithmetic code outside 1..=9
    #[error("unknown arithmetic operation {0}")]
    UnknownOp(i64),
}
