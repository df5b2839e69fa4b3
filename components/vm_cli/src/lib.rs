//! Command-line driver library
//!
//! Provides the [`Runtime`] wrapper and supporting modules for `protovm`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod repl;
pub mod runtime;

pub use cli::{Cli, Command};
pub use error::{CliError, CliResult};
pub use runtime::Runtime;
