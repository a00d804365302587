//! The selection capability and its backends.
//!
//! A selection is an opaque, possibly multi-element match set against some
//! document. The evaluator and the pipeline never look inside one; they only
//! call the methods of [`Selection`]. Each backend owns its native document
//! form, and [`coerce`] crosses between backends by re-parsing the raw text.
pub mod css;
pub mod json;
pub mod regex;
pub mod text;
pub mod xpath;

use std::{fmt, rc::Rc, str::FromStr};

use thiserror::Error;

pub use self::css::CssSelection;
pub use self::json::JsonSelection;
pub use self::regex::RegexSelection;
pub use self::text::TextSelection;
pub use self::xpath::XpathSelection;

/// Shared handle to a selection.
pub type SelectionRef = Rc<dyn Selection>;

/// Errors reported by selection backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("invalid {backend} expression {expression:?}: {message}")]
    Syntax {
        backend: SelectionKind,
        expression: String,
        message: String,
    },

    #[error("unable to read document as {backend}: {message}")]
    Document {
        backend: SelectionKind,
        message: String,
    },

    #[error("the {backend} selector does not support {operation}")]
    Unsupported {
        backend: SelectionKind,
        operation: &'static str,
    },

    #[error("no element at index {index}, selection has {len}")]
    NotFound { index: usize, len: usize },

    #[error("attr requires a non-empty attribute name")]
    EmptyAttribute,
}

/// The backend family a selection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionKind {
    Css,
    Xpath,
    Json,
    Regex,
    Text,
}

impl SelectionKind {
    pub fn name(self) -> &'static str {
        match self {
            SelectionKind::Css => "CSS",
            SelectionKind::Xpath => "XPATH",
            SelectionKind::Json => "JSON",
            SelectionKind::Regex => "REGEX",
            SelectionKind::Text => "STRING",
        }
    }

    /// Builds a fresh selection of this kind over `document`.
    pub fn parse(self, document: &str) -> Result<SelectionRef, SelectionError> {
        Ok(match self {
            SelectionKind::Css => Rc::new(CssSelection::parse(document)),
            SelectionKind::Xpath => Rc::new(XpathSelection::parse(document)),
            SelectionKind::Json => Rc::new(JsonSelection::parse(document)?),
            SelectionKind::Regex => Rc::new(RegexSelection::new(document)),
            SelectionKind::Text => Rc::new(TextSelection::new(document)),
        })
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SelectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CSS" => Ok(SelectionKind::Css),
            "XPATH" => Ok(SelectionKind::Xpath),
            "JSON" => Ok(SelectionKind::Json),
            "REGEX" => Ok(SelectionKind::Regex),
            "STRING" | "TEXT" => Ok(SelectionKind::Text),
            other => Err(format!("undefined selection type: {}", other)),
        }
    }
}

/// The capability every backend implements.
pub trait Selection: fmt::Debug {
    fn kind(&self) -> SelectionKind;

    /// Narrows the match set. An empty selector returns the same elements.
    fn find(&self, selector: &str) -> Result<SelectionRef, SelectionError>;

    /// The single element at a zero-based index.
    fn at(&self, index: usize) -> Option<SelectionRef>;

    /// Number of elements [`for_each`](Selection::for_each) visits.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visits elements in document order until `visit` returns `false`.
    fn for_each(&self, visit: &mut dyn FnMut(usize, SelectionRef) -> bool);

    /// Attribute text of the first element.
    fn attribute(&self, name: &str) -> Result<String, SelectionError>;

    /// Text content with markup stripped.
    fn text(&self) -> String;

    /// Full markup or serialised form.
    fn raw(&self) -> String;
}

/// Collects every element of a selection.
pub fn elements(selection: &dyn Selection) -> Vec<SelectionRef> {
    let mut elements = Vec::with_capacity(selection.len());
    selection.for_each(&mut |_, element| {
        elements.push(element);
        true
    });
    elements
}

/// Reinterprets a selection as another backend.
///
/// Selections already of the requested kind are returned unchanged; anything
/// else starts over from its raw text.
pub fn coerce(selection: &SelectionRef, kind: SelectionKind) -> Result<SelectionRef, SelectionError> {
    if selection.kind() == kind {
        return Ok(Rc::clone(selection));
    }
    kind.parse(&selection.raw())
}
