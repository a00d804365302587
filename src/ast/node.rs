/// The output shape of a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    /// Top level is a `{ ... }` block; the result is a map of its fields.
    ///
    /// ```text
    /// { title `css("h1")` author `css(".author")` }
    /// ```
    Object,

    /// Top level is a single node; the result is that node's bare value.
    ///
    /// ```text
    /// title `css("h1")`
    /// ```
    Atom,
}

/// The value type a node produces, decided by its trailing syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Scalar text. Nodes without children parse to this type.
    String,

    /// Scalar number parsed from the selection text.
    ///
    /// The textual grammar never produces it; use [`Node::number`].
    Number,

    /// `name { ... }`
    Object,

    /// `name [ ... ]`
    Array,

    /// `name [{ ... }]`
    ObjectArray,
}

impl NodeType {
    pub fn is_scalar(self) -> bool {
        matches!(self, NodeType::String | NodeType::Number)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeType::String => "string",
            NodeType::Number => "number",
            NodeType::Object => "object",
            NodeType::Array => "array",
            NodeType::ObjectArray => "object array",
        }
    }
}

/// One pipeline operation as written in the expression.
///
/// Arguments are kept verbatim; `{$name}` templates are rendered only during
/// evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipe {
    pub name: String,
    pub args: Vec<String>,
}

impl Pipe {
    pub fn new(name: impl Into<String>, args: &[&str]) -> Self {
        Pipe {
            name: name.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// A declared field: the owned tree produced by the parser.
///
/// Parent links do not exist here; they are derived once the tree is loaded
/// into a [`Program`](crate::Program).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub node_type: NodeType,
    pub pipeline: Vec<Pipe>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Node {
            name: name.into(),
            node_type,
            pipeline: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A string scalar.
    pub fn string(name: impl Into<String>) -> Self {
        Node::new(name, NodeType::String)
    }

    /// A number scalar.
    pub fn number(name: impl Into<String>) -> Self {
        Node::new(name, NodeType::Number)
    }

    /// Appends a pipeline operation.
    pub fn pipe(mut self, name: &str, args: &[&str]) -> Self {
        self.pipeline.push(Pipe::new(name, args));
        self
    }

    /// Appends a child node.
    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }
}
