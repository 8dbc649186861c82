//! Logging utilities.
//!
//! Centralizes logger initialization. Library code only uses the `log`
//! facade; the binary decides the backend by calling [`init_logging`].

mod init;

pub use init::{init_logging, LoggingConfig};
