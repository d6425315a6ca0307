//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the bus runtime.
//!
//! ## Environment Variables
//!
//! ### `PATHBUS_STACK_SIZE`
//!
//! Sets the stack size for dispatch and handler coroutines. Accepts values in:
//! - Decimal: `65536` (64 KB)
//! - Hexadecimal: `0x10000` (64 KB)
//!
//! Default: `0x10000` (64 KB)
//!
//! Larger stacks support deeper call chains inside handlers; smaller stacks
//! reduce memory usage when many publications are in flight. Total virtual
//! memory is roughly `stack_size * concurrent handler invocations`.
//!
//! ## Usage
//!
//! ```rust
//! use pathbus::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup using [`RuntimeConfig::from_env()`] to configure
/// the coroutine runtime behavior.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 64 KB / 0x10000)
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// Stack sizes are made odd (if even) to enable may's internal stack
    /// usage tracking, which measures actual usage rather than allocation
    /// size.
    pub fn from_env() -> Self {
        let mut stack_size = match env::var("PATHBUS_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x10000)
                } else {
                    val.parse().unwrap_or(0x10000)
                }
            }
            Err(_) => 0x10000,
        };

        if stack_size % 2 == 0 {
            stack_size += 1;
            tracing::debug!(
                stack_size = stack_size,
                "Adjusted stack size to odd value to enable usage tracking"
            );
        }

        RuntimeConfig { stack_size }
    }
}
