//! Engine configuration

use serde::{Deserialize, Serialize};

use memory_manager::{DEFAULT_COUNTDOWN, DEFAULT_LIMIT};

use crate::error::VmError;

/// Tunables read at construction.
///
/// Missing fields take their defaults, so `{}` is a valid document.
///
/// # Example
///
/// ```
/// use interpreter::VmConfig;
///
/// let config = VmConfig::from_json_str(r#"{ "gc_limit": 64 }"#).unwrap();
/// assert_eq!(config.gc_limit, 64);
/// assert_eq!(config.gc_countdown, 65536);
/// assert!(config.max_steps.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Instructions between collection checks
    pub gc_countdown: u64,
    /// Initial soft limit on live objects
    pub gc_limit: usize,
    /// Log collector activity at `info`
    pub gc_tracing: bool,
    /// Stop `run` after this many instructions
    pub max_steps: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            gc_countdown: DEFAULT_COUNTDOWN,
            gc_limit: DEFAULT_LIMIT,
            gc_tracing: false,
            max_steps: None,
        }
    }
}

impl VmConfig {
    /// Parses a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, VmError> {
        Ok(serde_json::from_str(text)?)
    }
}
