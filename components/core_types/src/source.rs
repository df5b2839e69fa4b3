//! Backtrace frames.
//!
//! The engine keeps a persistent list of these; `LOCRT` turns it into a chain
//! of stack-frame objects when an error is raised.

use std::fmt;

/// A (line, file) pair recorded at call time.
///
/// # Examples
///
/// ```
/// use core_types::TraceFrame;
///
/// let frame = TraceFrame::new(12, "main.pvm");
/// assert_eq!(frame.to_string(), "main.pvm:12");
/// assert!(TraceFrame::sentinel().is_sentinel());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraceFrame {
    /// Line number active at the call site
    pub line: i64,
    /// File name active at the call site
    pub file: String,
}

impl TraceFrame {
    /// Creates a frame.
    pub fn new(line: i64, file: impl Into<String>) -> Self {
        TraceFrame {
            line,
            file: file.into(),
        }
    }

    /// The `(0, "")` frame pushed by `NRET`.
    pub fn sentinel() -> Self {
        TraceFrame::default()
    }

    /// Returns `true` for the `(0, "")` frame.
    pub fn is_sentinel(&self) -> bool {
        self.line == 0 && self.file.is_empty()
    }
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
