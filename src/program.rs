use std::fmt;

use crate::{
    ast::{GraphKind, Node, NodeType, Pipe},
    evaluator::Evaluator,
    output::Response,
    registry::Registry,
};

/// Name of the synthetic root node.
pub const ROOT_NAME: &str = "__ROOT__";

/// Index of a node inside a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node loaded into a program, with its parent link derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramNode {
    pub name: String,
    pub node_type: NodeType,
    pub pipeline: Vec<Pipe>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl ProgramNode {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Virtual nodes (`__name__`) are resolvable but never projected.
    pub fn is_virtual(&self) -> bool {
        is_virtual_key(&self.name)
    }
}

/// Whether `name` is wrapped in the virtual-key marker.
pub fn is_virtual_key(name: &str) -> bool {
    name.len() >= 4 && name.starts_with("__") && name.ends_with("__")
}

/// A compiled expression.
///
/// Nodes live in an arena addressed by [`NodeId`]; the tree shape never
/// changes after construction, and all evaluation state lives in the
/// [`Evaluator`], so one program can be run any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    kind: GraphKind,
    nodes: Vec<ProgramNode>,
    root: NodeId,
}

impl Program {
    /// Loads a declaration tree under a synthetic root and derives every
    /// parent link.
    pub fn from_nodes(kind: GraphKind, nodes: Vec<Node>) -> Self {
        let mut program = Program {
            kind,
            nodes: vec![ProgramNode {
                name: ROOT_NAME.to_string(),
                node_type: NodeType::Object,
                pipeline: Vec::new(),
                children: Vec::new(),
                parent: None,
            }],
            root: NodeId(0),
        };
        let root = program.root;
        program.nodes[root.0].children = program.derive(root, nodes);
        log::debug!(
            "compiled {:?} program with {} nodes",
            program.kind,
            program.nodes.len() - 1
        );
        program
    }

    fn derive(&mut self, parent: NodeId, nodes: Vec<Node>) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(nodes.len());
        for node in nodes {
            let id = NodeId(self.nodes.len());
            self.nodes.push(ProgramNode {
                name: node.name,
                node_type: node.node_type,
                pipeline: node.pipeline,
                children: Vec::new(),
                parent: Some(parent),
            });
            let children = self.derive(id, node.children);
            self.nodes[id.0].children = children;
            ids.push(id);
        }
        ids
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The top-level user nodes.
    pub fn top_level(&self) -> &[NodeId] {
        &self.nodes[self.root.0].children
    }

    pub fn node(&self, id: NodeId) -> &ProgramNode {
        &self.nodes[id.0]
    }

    /// Number of nodes, including the synthetic root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top_level().is_empty()
    }

    /// Visits the subtree rooted at `id` in pre-order.
    pub fn traverse(&self, id: NodeId, visit: &mut impl FnMut(NodeId)) {
        visit(id);
        for &child in self.node(id).children() {
            self.traverse(child, visit);
        }
    }

    /// Finds the first node named `name` among the children of `id`'s
    /// parent that come before `id`.
    fn previous_sibling(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        for &sibling in self.node(parent).children() {
            if sibling == id {
                return None;
            }
            if self.node(sibling).name == name {
                return Some(sibling);
            }
        }
        None
    }

    /// Resolves `name` as seen from `id`.
    ///
    /// Earlier siblings are searched first, then the earlier siblings of each
    /// ancestor in turn. Later siblings, descendants and the node itself are
    /// never visible.
    pub fn lookup(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut current = id;
        loop {
            if let Some(found) = self.previous_sibling(current, name) {
                return Some(found);
            }
            current = self.node(current).parent?;
        }
    }

    /// Evaluates the program against `document` with the built-in operations.
    pub fn run(&self, document: &str) -> Response {
        self.run_with(document, Registry::global())
    }

    /// Evaluates the program against `document` with a custom registry.
    pub fn run_with(&self, document: &str, registry: &Registry) -> Response {
        Evaluator::new(self, registry, document).run()
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let node = self.node(id);
        write!(f, "{}{}", "    ".repeat(depth), node.name)?;
        if !node.pipeline.is_empty() {
            let pipes: Vec<String> = node
                .pipeline
                .iter()
                .map(|pipe| {
                    let args: Vec<String> =
                        pipe.args.iter().map(|a| format!("\"{}\"", a)).collect();
                    format!("{}({})", pipe.name, args.join(", "))
                })
                .collect();
            write!(f, " `{}`", pipes.join("; "))?;
        }
        let (open, close) = match node.node_type {
            NodeType::String | NodeType::Number => return writeln!(f),
            NodeType::Object => ("{", "}"),
            NodeType::Array => ("[", "]"),
            NodeType::ObjectArray => ("[{", "}]"),
        };
        writeln!(f, " {}", open)?;
        for &child in node.children() {
            self.write_node(f, child, depth + 1)?;
        }
        writeln!(f, "{}{}", "    ".repeat(depth), close)
    }
}

/// Prints normalised expression source.
///
/// A program produced by [`compile`](crate::compile) compiles back to an equal
/// program. The grammar has no number scalars, so a `Number` node built with
/// [`Program::from_nodes`] prints like a string scalar and re-parses as one.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            GraphKind::Object => {
                writeln!(f, "{{")?;
                for &id in self.top_level() {
                    self.write_node(f, id, 1)?;
                }
                write!(f, "}}")
            }
            GraphKind::Atom => match self.top_level().first() {
                Some(&id) => self.write_node(f, id, 0),
                None => Ok(()),
            },
        }
    }
}
