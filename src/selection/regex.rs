use std::rc::Rc;

use regex::{Regex, RegexBuilder};

use super::{Selection, SelectionError, SelectionKind, SelectionRef};

/// Strings matched by regular expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexSelection {
    nodes: Vec<String>,
}

/// A parsed `/pattern/flags` expression.
///
/// Flags:
/// - `w` - emit capture group 1 instead of the whole match ("without outer")
/// - `i` - case insensitive
/// - `m` - `^`/`$` match at line boundaries
/// - `s` - `.` matches newlines
///
/// An expression that is not slash-delimited is used as a bare pattern.
#[derive(Debug)]
pub struct RegexSelector {
    pub regex: Regex,
    pub group: usize,
}

impl RegexSelector {
    pub fn parse(expression: &str) -> Result<Self, SelectionError> {
        let (pattern, flags) = match expression.rfind('/') {
            Some(tail) if tail > 0 && expression.starts_with('/') => {
                (&expression[1..tail], &expression[tail + 1..])
            }
            _ => (expression, ""),
        };
        if let Some(flag) = flags.chars().find(|c| !"wims".contains(*c)) {
            return Err(syntax_error(expression, format!("unknown modifier '{}'", flag)));
        }
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()
            .map_err(|e| syntax_error(expression, e.to_string()))?;
        Ok(RegexSelector {
            regex,
            group: usize::from(flags.contains('w')),
        })
    }
}

fn syntax_error(expression: &str, message: String) -> SelectionError {
    SelectionError::Syntax {
        backend: SelectionKind::Regex,
        expression: expression.to_string(),
        message,
    }
}

impl RegexSelection {
    pub fn new(document: impl Into<String>) -> Self {
        RegexSelection {
            nodes: vec![document.into()],
        }
    }

    fn single(node: &str) -> SelectionRef {
        Rc::new(RegexSelection::new(node))
    }
}

impl Selection for RegexSelection {
    fn kind(&self) -> SelectionKind {
        SelectionKind::Regex
    }

    fn find(&self, selector: &str) -> Result<SelectionRef, SelectionError> {
        if selector.is_empty() {
            return Ok(Rc::new(self.clone()));
        }
        let selector = RegexSelector::parse(selector)?;
        let mut nodes = Vec::new();
        for node in &self.nodes {
            for captures in selector.regex.captures_iter(node) {
                if selector.group < captures.len() {
                    let text = captures.get(selector.group).map_or("", |m| m.as_str());
                    nodes.push(text.to_string());
                }
            }
        }
        Ok(Rc::new(RegexSelection { nodes }))
    }

    fn at(&self, index: usize) -> Option<SelectionRef> {
        self.nodes.get(index).map(|node| RegexSelection::single(node))
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn for_each(&self, visit: &mut dyn FnMut(usize, SelectionRef) -> bool) {
        for (i, node) in self.nodes.iter().enumerate() {
            if !visit(i, RegexSelection::single(node)) {
                break;
            }
        }
    }

    fn attribute(&self, _name: &str) -> Result<String, SelectionError> {
        Err(SelectionError::Unsupported {
            backend: SelectionKind::Regex,
            operation: "attr",
        })
    }

    fn text(&self) -> String {
        self.raw()
    }

    fn raw(&self) -> String {
        self.nodes.concat()
    }
}
