//! CLI support for graphquery
//!
//! Provides programmatic access to the `gq` commands for embedding in other
//! tools.

mod check;
mod ops;

pub use check::{execute_check, CheckOptions, CheckResult};
pub use ops::list_operations;

use std::io;

use thiserror::Error;

use crate::CompileError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input, --file or pipe a document to stdin.")]
    NoInput,
}
