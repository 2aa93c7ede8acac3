//! Logging bootstrap.
//!
//! The crate logs through the `log` facade only; this module installs
//! `env_logger` for binaries that do not bring their own logger.

mod init;

pub use init::{LoggingConfig, init_logging};
