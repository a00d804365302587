//! Runs a node's operation list over a selection.
//!
//! Each step renders the self placeholder in its arguments against the
//! selection it receives, then hands both to the registered operation. The
//! first failing step aborts the rest.
use thiserror::Error;

use crate::{
    ast::Pipe,
    registry::Registry,
    selection::{SelectionError, SelectionRef},
};

/// Stands for the live selection inside an argument. Template rendering
/// leaves it behind for `{$}` and `{$own_name}`, because a node's own text is
/// only known once its pipeline runs.
pub const SELF_PLACEHOLDER: &str = "\u{1a}{$}\u{1a}";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("undefined method: {0}")]
    Undefined(String),

    #[error("method {name} expects {expected} parameters, but {received} received")]
    Arity {
        name: String,
        expected: usize,
        received: usize,
    },

    #[error("operation {0} is already registered")]
    AlreadyRegistered(String),

    #[error("invalid argument for {operation}: {message}")]
    InvalidArgument {
        operation: &'static str,
        message: String,
    },

    #[error("unable to resolve url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Substitutes [`SELF_PLACEHOLDER`] with the raw form of `selection`.
///
/// The raw form is computed at most once, however many arguments use it.
pub fn render_placeholder(selection: &SelectionRef, args: &[String]) -> Vec<String> {
    let mut raw: Option<String> = None;
    args.iter()
        .map(|arg| {
            if !arg.contains(SELF_PLACEHOLDER) {
                return arg.clone();
            }
            let raw = raw.get_or_insert_with(|| selection.raw());
            arg.replace(SELF_PLACEHOLDER, raw.as_str())
        })
        .collect()
}

/// Folds `pipeline` over `selection` left to right.
pub fn run(
    selection: SelectionRef,
    pipeline: &[Pipe],
    registry: &Registry,
) -> Result<SelectionRef, PipelineError> {
    let mut current = selection;
    for pipe in pipeline {
        let args = render_placeholder(&current, &pipe.args);
        log::trace!("{}{:?} on {} selection", pipe.name, args, current.kind());
        current = registry.invoke(&pipe.name, &current, &args)?;
    }
    Ok(current)
}
