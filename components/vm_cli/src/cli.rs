//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use interpreter::VmConfig;

use crate::error::{CliError, CliResult};

/// Prototype-object VM driver
#[derive(Debug, Parser)]
#[command(name = "protovm", version, about = "Runs, assembles and inspects prototype VM units")]
pub struct Cli {
    /// JSON engine configuration
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Stop after this many instructions
    #[arg(long, global = true)]
    pub max_steps: Option<u64>,

    /// Initial collector soft limit
    #[arg(long, global = true)]
    pub gc_limit: Option<usize>,

    /// Log collector activity
    #[arg(long, global = true)]
    pub gc_trace: bool,

    /// Print the register dump as JSON after the run
    #[arg(long, global = true)]
    pub dump: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Run a unit, assembly text or compiled
    Run {
        /// Unit to run
        file: PathBuf,
        /// Arguments bound to `argv` after the file name
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Compile assembly text into a unit file
    Asm {
        /// Assembly source
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Module name stored in the header
        #[arg(long)]
        module: Option<String>,
        /// Package name stored in the header
        #[arg(long)]
        package: Option<String>,
    },
    /// Print a unit as assembly text
    Disasm {
        /// Unit to print
        file: PathBuf,
    },
    /// Interactive prompt
    Repl,
}

impl Cli {
    /// Engine configuration: the `--config` document, then flag overrides.
    pub fn vm_config(&self) -> CliResult<VmConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                VmConfig::from_json_str(&text).map_err(|source| CliError::Config {
                    path: path.clone(),
                    source,
                })?
            }
            None => VmConfig::default(),
        };
        if let Some(max) = self.max_steps {
            config.max_steps = Some(max);
        }
        if let Some(limit) = self.gc_limit {
            config.gc_limit = limit;
        }
        if self.gc_trace {
            config.gc_tracing = true;
        }
        Ok(config)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.gc_trace {
            "info"
        } else {
            "warn"
        }
    }
}
