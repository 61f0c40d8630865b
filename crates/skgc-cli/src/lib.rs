//! skgc-cli library
//!
//! Exposes argument parsing and command dispatch so tests can drive the CLI
//! without spawning the binary.

pub mod cli;
pub(crate) mod commands;
pub(crate) mod console;
pub mod dispatch;
pub mod error;
pub mod logger;


pub use cli::Cli;
pub use dispatch::run;
pub use error::{CliError, Result};
