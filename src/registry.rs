//! Named pipeline operations.
//!
//! A [`Registry`] maps an operation name to its arity and a plain function.
//! The built-in set is assembled once into [`Registry::global`]; callers
//! that need extra operations build their own from [`Registry::builtin`].
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use url::{Position, Url};

use crate::{
    pipeline::PipelineError,
    selection::{coerce, SelectionError, SelectionKind, SelectionRef, TextSelection},
};

/// Signature of every operation: the current selection and the rendered
/// arguments in, the next selection out.
pub type Callee = fn(&SelectionRef, &[String]) -> Result<SelectionRef, PipelineError>;

#[derive(Debug, Clone, Copy)]
pub struct Processor {
    pub arity: usize,
    pub call: Callee,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    processors: IndexMap<String, Processor>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::builtin);

impl Registry {
    pub fn empty() -> Self {
        Registry::default()
    }

    /// The thirteen built-in operations.
    pub fn builtin() -> Self {
        let mut processors = IndexMap::new();
        let builtins: [(&str, usize, Callee); 13] = [
            ("css", 1, css),
            ("json", 1, json),
            ("xpath", 1, xpath),
            ("regex", 1, regex),
            ("trim", 0, trim),
            ("template", 1, template),
            ("attr", 1, attr),
            ("eq", 1, eq),
            ("string", 0, string),
            ("text", 0, text),
            ("link", 1, link),
            ("replace", 2, replace),
            ("absolute", 1, absolute),
        ];
        for (name, arity, call) in builtins {
            processors.insert(name.to_string(), Processor { arity, call });
        }
        Registry { processors }
    }

    /// The shared built-in registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        arity: usize,
        call: Callee,
    ) -> Result<(), PipelineError> {
        let name = name.into();
        if self.processors.contains_key(&name) {
            return Err(PipelineError::AlreadyRegistered(name));
        }
        self.processors.insert(name, Processor { arity, call });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Processor> {
        self.processors.get(name)
    }

    /// Registered names with their arities, in registration order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, usize)> {
        self.processors
            .iter()
            .map(|(name, processor)| (name.as_str(), processor.arity))
    }

    /// Looks up `name`, checks the argument count and calls it.
    pub fn invoke(
        &self,
        name: &str,
        selection: &SelectionRef,
        args: &[String],
    ) -> Result<SelectionRef, PipelineError> {
        let processor = self
            .get(name)
            .ok_or_else(|| PipelineError::Undefined(name.to_string()))?;
        if args.len() != processor.arity {
            return Err(PipelineError::Arity {
                name: name.to_string(),
                expected: processor.arity,
                received: args.len(),
            });
        }
        (processor.call)(selection, args)
    }
}

fn find_as(
    selection: &SelectionRef,
    kind: SelectionKind,
    expression: &str,
) -> Result<SelectionRef, PipelineError> {
    Ok(coerce(selection, kind)?.find(expression)?)
}

fn css(selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    find_as(selection, SelectionKind::Css, &args[0])
}

fn json(selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    find_as(selection, SelectionKind::Json, &args[0])
}

fn xpath(selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    find_as(selection, SelectionKind::Xpath, &args[0])
}

fn regex(selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    find_as(selection, SelectionKind::Regex, &args[0])
}

fn trim(selection: &SelectionRef, _args: &[String]) -> Result<SelectionRef, PipelineError> {
    Ok(TextSelection::shared(selection.raw().trim()))
}

fn template(_selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    Ok(TextSelection::shared(args[0].as_str()))
}

fn attr(selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    Ok(TextSelection::shared(selection.attribute(&args[0])?))
}

fn eq(selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    let index: usize = args[0]
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| PipelineError::InvalidArgument {
            operation: "eq",
            message: format!("{:?} is not an index: {}", args[0], e),
        })?;
    selection.at(index).ok_or_else(|| {
        SelectionError::NotFound {
            index,
            len: selection.len(),
        }
        .into()
    })
}

fn string(selection: &SelectionRef, _args: &[String]) -> Result<SelectionRef, PipelineError> {
    Ok(TextSelection::shared(selection.raw()))
}

fn text(selection: &SelectionRef, _args: &[String]) -> Result<SelectionRef, PipelineError> {
    Ok(TextSelection::shared(selection.text()))
}

/// The evaluator has already replaced the argument with the referenced
/// node's text.
fn link(_selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    Ok(TextSelection::shared(args[0].as_str()))
}

fn replace(selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    Ok(TextSelection::shared(
        selection.raw().replace(args[0].as_str(), &args[1]),
    ))
}

fn absolute(selection: &SelectionRef, args: &[String]) -> Result<SelectionRef, PipelineError> {
    let href = selection.raw();
    let resolved = match Url::parse(&args[0]) {
        Ok(base) => String::from(base.join(&href)?),
        Err(url::ParseError::RelativeUrlWithoutBase) => resolve_relative(&args[0], &href)?,
        Err(e) => return Err(e.into()),
    };
    Ok(TextSelection::shared(resolved))
}

/// Host used to resolve against a base with no scheme, such as `/shop/`.
const RELATIVE_ORIGIN: &str = "http://relative.invalid/";

/// The result keeps only its path, query and fragment unless `href` itself
/// names another origin.
fn resolve_relative(base: &str, href: &str) -> Result<String, url::ParseError> {
    let origin = Url::parse(RELATIVE_ORIGIN)?;
    let resolved = origin.join(base)?.join(href)?;
    if resolved.origin() != origin.origin() {
        return Ok(resolved.into());
    }
    Ok(resolved[Position::BeforePath..].to_string())
}
