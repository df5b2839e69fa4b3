//! Host-level engine errors
//!
//! Faults inside the running program are language-level: they set `%err0`
//! or throw an object. [`VmError`] covers the ways the host's view of a run
//! can fail.

use bytecode_system::InstructionError;
use thiserror::Error;

/// Errors returned by [`crate::Vm`] entry points.
#[derive(Debug, Error)]
pub enum VmError {
    /// An internal routine failed validation while building the engine
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] InstructionError),

    /// `max_steps` instructions ran without the engine going idle
    #[error("step limit of {0} exceeded")]
    StepLimit(u64),

    /// The program was hard-killed
    #[error("engine terminated")]
    Terminated,

    /// The program panicked
    #[error("engine panicked")]
    Panicked,

    /// A configuration document could not be read
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
