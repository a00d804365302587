use indexmap::IndexMap;
use thiserror::Error;

use crate::ast::NodeType;

/// Fields of an object value, in the order they were written.
pub type Fields = IndexMap<String, Value>;

/// A typed value built while evaluating a program.
///
/// Every value is created empty from the type of the node that produces it
/// and then filled through the mutators below. The mutators check the value's
/// own tag and never coerce: setting text on an object, or pushing into a
/// string, is a [`ValueError::WrongType`].
///
/// # Examples
///
/// ```
/// use graphquery::ast::NodeType;
/// use graphquery::Value;
///
/// let mut title = Value::empty(NodeType::String);
/// title.set_scalar("Article").unwrap();
///
/// let mut page = Value::empty(NodeType::Object);
/// page.insert("title", title).unwrap();
///
/// assert_eq!(page.type_name(), "object");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text of a string scalar
    String(String),

    /// Number scalar, parsed from text
    Number(f64),

    /// Named fields
    Object(Fields),

    /// Flat list, one entry per child per element
    Array(Vec<Value>),

    /// List of objects, one per element
    ObjectArray(Vec<Fields>),
}

/// Errors raised by the value mutators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("call the {operation} method on {found} value")]
    WrongType {
        operation: &'static str,
        found: &'static str,
    },

    #[error("graph data push overflow: index {index} past length {len}")]
    Overflow { index: usize, len: usize },

    #[error("invalid number {text:?}: {message}")]
    Number { text: String, message: String },
}

impl Value {
    /// The empty value for a node type: `""`, `0`, `{}` or `[]`.
    pub fn empty(node_type: NodeType) -> Self {
        match node_type {
            NodeType::String => Value::String(String::new()),
            NodeType::Number => Value::Number(0.0),
            NodeType::Object => Value::Object(Fields::new()),
            NodeType::Array => Value::Array(Vec::new()),
            NodeType::ObjectArray => Value::ObjectArray(Vec::new()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::ObjectArray(_) => "object array",
        }
    }

    fn wrong_type(&self, operation: &'static str) -> ValueError {
        ValueError::WrongType {
            operation,
            found: self.type_name(),
        }
    }

    /// Sets the text of a scalar. Numbers are parsed from the trimmed text.
    pub fn set_scalar(&mut self, text: &str) -> Result<(), ValueError> {
        match self {
            Value::String(s) => {
                *s = text.to_string();
                Ok(())
            }
            Value::Number(n) => {
                *n = text
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| ValueError::Number {
                        text: text.to_string(),
                        message: e.to_string(),
                    })?;
                Ok(())
            }
            _ => Err(self.wrong_type("set")),
        }
    }

    /// Writes a named field of an object. An existing field is replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), ValueError> {
        match self {
            Value::Object(fields) => {
                fields.insert(key.into(), value);
                Ok(())
            }
            _ => Err(self.wrong_type("insert")),
        }
    }

    /// Adds a child's value for the element at `index`.
    ///
    /// Arrays ignore `index` and `key` and append. Object arrays append a new
    /// object when `index` equals their length, write into the existing
    /// object when it is smaller, and overflow when it is larger.
    pub fn push(&mut self, index: usize, key: &str, value: Value) -> Result<(), ValueError> {
        match self {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            Value::ObjectArray(objects) => {
                let len = objects.len();
                if index > len {
                    return Err(ValueError::Overflow { index, len });
                }
                if index == len {
                    objects.push(Fields::new());
                }
                objects[index].insert(key.to_string(), value);
                Ok(())
            }
            _ => Err(self.wrong_type("push")),
        }
    }
}
