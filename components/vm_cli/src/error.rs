//! Error types for the CLI

use std::path::PathBuf;

use bytecode_system::{AsmError, CodecError, InstructionError};
use interpreter::VmError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O error
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// Assembly text did not parse
    #[error("assembly error: {0}")]
    Asm(#[from] AsmError),

    /// Compiled unit did not decode
    #[error("bad compiled unit: {0}")]
    Codec(#[from] CodecError),

    /// An instruction the driver built was rejected
    #[error("bad instruction: {0}")]
    Instruction(#[from] InstructionError),

    /// The engine stopped with an error
    #[error("{0}")]
    Vm(#[from] VmError),

    /// A `--config` document could not be read
    #[error("config file {}: {source}", path.display())]
    Config {
        /// The offending file
        path: PathBuf,
        /// What went wrong
        source: VmError,
    },

    /// A source file was neither a compiled unit nor UTF-8 text
    #[error("{} is neither a compiled unit nor assembly text", .0.display())]
    NotSource(PathBuf),

    /// Register dump could not be serialized
    #[error("dump error: {0}")]
    Dump(#[from] serde_json::Error),

    /// REPL error
    #[error("REPL error: {0}")]
    Repl(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
