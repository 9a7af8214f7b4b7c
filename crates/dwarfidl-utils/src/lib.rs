//! # dwarfidl Utilities
//!
//! Logging setup for the `dwarfidl` command line binary.
//!
//! ```rust
//! use dwarfidl_utils::{LogFormat, LogLevel, LoggingConfig};
//!
//! let config = LoggingConfig::default().with_level(Some(LogLevel::Debug));
//! assert_eq!(config.level, Some(LogLevel::Debug));
//! assert_eq!(config.format, LogFormat::Pretty);
//! ```

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    LogFormat, LogLevel, LoggingConfig, LoggingError, LoggingGuard, init_logging, init_logging_to_dir,
    init_logging_with, init_logging_with_level, log_file_in,
};
pub use tracing::{debug, error, info, trace, warn};
