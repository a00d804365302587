use std::rc::Rc;

use serde_json::Value as Json;

use super::{CssSelection, Selection, SelectionError, SelectionKind, SelectionRef};

/// A JSON document, or one value inside it.
///
/// `None` is the result of a path that matched nothing; it renders as an
/// empty string and has no elements.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSelection {
    value: Option<Json>,
}

impl JsonSelection {
    pub fn parse(document: &str) -> Result<Self, SelectionError> {
        let value = serde_json::from_str(document.trim()).map_err(|e| SelectionError::Document {
            backend: SelectionKind::Json,
            message: e.to_string(),
        })?;
        Ok(JsonSelection { value: Some(value) })
    }

    pub fn from_value(value: Option<Json>) -> Self {
        JsonSelection { value }
    }

    pub fn value(&self) -> Option<&Json> {
        self.value.as_ref()
    }

    fn shared(value: Option<Json>) -> SelectionRef {
        Rc::new(JsonSelection { value })
    }
}

/// Splits a dotted path, honouring `\.` escapes.
fn segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '.' => segments.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// Resolves a dotted path against a value.
///
/// - `a.b` - object keys
/// - `items.0` - array index
/// - `items.#` - array length
/// - `items.#.name` - `name` of every item that has one
pub fn get(value: &Json, path: &str) -> Option<Json> {
    resolve(value, &segments(path))
}

fn resolve(value: &Json, segments: &[String]) -> Option<Json> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(value.clone());
    };
    match value {
        Json::Object(map) => map.get(segment).and_then(|v| resolve(v, rest)),
        Json::Array(items) if segment == "#" => {
            if rest.is_empty() {
                Some(Json::from(items.len()))
            } else {
                Some(Json::Array(
                    items.iter().filter_map(|item| resolve(item, rest)).collect(),
                ))
            }
        }
        Json::Array(items) => {
            let index: usize = segment.parse().ok()?;
            items.get(index).and_then(|v| resolve(v, rest))
        }
        _ => None,
    }
}

/// Renders a value the way it reads in text: strings unquoted, containers as
/// compact JSON, null as nothing.
pub fn render(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

impl Selection for JsonSelection {
    fn kind(&self) -> SelectionKind {
        SelectionKind::Json
    }

    fn find(&self, selector: &str) -> Result<SelectionRef, SelectionError> {
        if selector.is_empty() {
            return Ok(Rc::new(self.clone()));
        }
        let found = self.value.as_ref().and_then(|v| get(v, selector));
        Ok(JsonSelection::shared(found))
    }

    fn at(&self, index: usize) -> Option<SelectionRef> {
        match &self.value {
            Some(Json::Array(items)) => items
                .get(index)
                .map(|item| JsonSelection::shared(Some(item.clone()))),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        match &self.value {
            None => 0,
            Some(Json::Array(items)) => items.len(),
            Some(Json::Object(map)) => map.len(),
            Some(_) => 1,
        }
    }

    /// Arrays yield their items, objects their values, scalars themselves.
    fn for_each(&self, visit: &mut dyn FnMut(usize, SelectionRef) -> bool) {
        let items: Vec<Json> = match &self.value {
            None => return,
            Some(Json::Array(items)) => items.clone(),
            Some(Json::Object(map)) => map.values().cloned().collect(),
            Some(scalar) => vec![scalar.clone()],
        };
        for (i, item) in items.into_iter().enumerate() {
            if !visit(i, JsonSelection::shared(Some(item))) {
                break;
            }
        }
    }

    fn attribute(&self, _name: &str) -> Result<String, SelectionError> {
        Err(SelectionError::Unsupported {
            backend: SelectionKind::Json,
            operation: "attr",
        })
    }

    /// Strings holding markup come back as their text content.
    fn text(&self) -> String {
        CssSelection::parse(&self.raw()).text()
    }

    fn raw(&self) -> String {
        self.value.as_ref().map(render).unwrap_or_default()
    }
}
