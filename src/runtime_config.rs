//! # Runtime Configuration Module
//!
//! Environment-variable configuration for how detached handlers are run.
//!
//! ## Environment Variables
//!
//! ### `PROTOROUTER_STACK_SIZE`
//!
//! Stack size for the `may` coroutine that runs each detached handler. Accepts:
//! - Decimal: `65536` (64 KB)
//! - Hexadecimal: `0x10000` (64 KB)
//!
//! Default: `0x10000` (64 KB). Unparseable values fall back to the default.
//!
//! ```bash
//! export PROTOROUTER_STACK_SIZE=0x20000
//! ```
//!
//! Inline handlers run on the caller's thread and are not affected.

use std::env;

/// Default coroutine stack size for detached handlers.
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for detached handler coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = env::var("PROTOROUTER_STACK_SIZE")
            .ok()
            .and_then(|val| parse_size(&val))
            .unwrap_or(DEFAULT_STACK_SIZE);
        RuntimeConfig { stack_size }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
