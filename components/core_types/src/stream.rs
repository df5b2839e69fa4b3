//! Stream handles.
//!
//! A stream travels through the VM as an opaque primitive. The standard
//! streams write straight through to the process; buffers keep their output
//! in memory, which is what tests and embedders read back.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// A shared stream handle.
pub type StreamPtr = Rc<RefCell<Stream>>;

/// An input or output stream.
///
/// # Examples
///
/// ```
/// use core_types::Stream;
///
/// let mut s = Stream::buffer();
/// s.write_str("hello").unwrap();
/// assert_eq!(s.contents(), Some("hello".to_string()));
/// ```
#[derive(Debug)]
pub enum Stream {
    /// Process standard output
    Stdout,
    /// Process standard error
    Stderr,
    /// Process standard input
    Stdin,
    /// In-memory stream; writes append to `output`, reads consume `input`
    Buffer {
        /// Bytes written so far
        output: String,
        /// Lines waiting to be read
        input: VecDeque<String>,
    },
}

impl Stream {
    /// An empty in-memory stream.
    pub fn buffer() -> Stream {
        Stream::Buffer {
            output: String::new(),
            input: VecDeque::new(),
        }
    }

    /// An in-memory stream pre-loaded with input text.
    pub fn with_input(text: &str) -> Stream {
        Stream::Buffer {
            output: String::new(),
            input: text.lines().map(str::to_string).collect(),
        }
    }

    /// Wraps `self` in a shared handle.
    pub fn shared(self) -> StreamPtr {
        Rc::new(RefCell::new(self))
    }

    /// Writes `text`. Fails on `Stdin` and on OS write errors.
    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        match self {
            Stream::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(text.as_bytes())?;
                out.flush()
            }
            Stream::Stderr => io::stderr().lock().write_all(text.as_bytes()),
            Stream::Stdin => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "cannot write to stdin",
            )),
            Stream::Buffer { output, .. } => {
                output.push_str(text);
                Ok(())
            }
        }
    }

    /// Reads one line without its terminator. `Ok(None)` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        match self {
            Stream::Stdin => {
                let mut line = String::new();
                let n = io::stdin().lock().read_line(&mut line)?;
                if n == 0 {
                    return Ok(None);
                }
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Ok(Some(line))
            }
            Stream::Buffer { input, .. } => Ok(input.pop_front()),
            Stream::Stdout | Stream::Stderr => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "cannot read from an output stream",
            )),
        }
    }

    /// The accumulated output of a buffer stream.
    pub fn contents(&self) -> Option<String> {
        match self {
            Stream::Buffer { output, .. } => Some(output.clone()),
            _ => None,
        }
    }
}
