//! Run an expression against a document

use std::{fs, path::PathBuf};

use super::CliError;
use crate::{compile, Response};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to run
    pub expression: String,
    /// Document text
    pub input: Option<String>,
    /// Document file, used when `input` is absent
    pub file: Option<PathBuf>,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed; carries the normalised expression
    SyntaxValid(String),
    /// Expression ran, possibly with recorded errors
    Success(Response),
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let program = compile(&options.expression)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid(program.to_string()));
    }

    let document = match (&options.input, &options.file) {
        (Some(input), _) => input.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Err(CliError::NoInput),
    };

    Ok(CheckResult::Success(program.run(&document)))
}
