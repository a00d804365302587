//! A location-path subset of XPath 1.0 over an HTML tree.
//!
//! Supported:
//! - absolute (`/a/b`), relative (`a/b`) and descendant (`//a`, `a//b`) paths
//! - abbreviated steps `.`, `..`, `*`, `@name`, `@*`
//! - node tests: names, `*`, `text()`, `node()`, `comment()`
//! - axes `child`, `descendant`, `descendant-or-self`, `self`, `parent`,
//!   `attribute`
//! - predicates `[n]`, `[last()]`, `[@a]`, `[@a='v']`
//!
//! Anything else is a syntax error.
use std::{collections::HashSet, rc::Rc};

use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};

use super::{
    css::{outer_html, text_content},
    Selection, SelectionError, SelectionKind, SelectionRef,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum XNode {
    Node(NodeId),
    Attribute(NodeId, String),
}

/// Nodes of a parsed HTML document matched by XPath location paths.
#[derive(Debug, Clone)]
pub struct XpathSelection {
    document: Rc<Html>,
    nodes: Vec<XNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Attribute,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "self" => Axis::SelfAxis,
            "parent" => Axis::Parent,
            "attribute" => Axis::Attribute,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(String),
    Wildcard,
    Text,
    Comment,
    Node,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Last,
    HasAttribute(String),
    AttributeEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Step {
            axis,
            test,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocationPath {
    is_absolute: bool,
    steps: Vec<Step>,
}

struct PathParser<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> PathParser<'a> {
    fn parse(expression: &'a str) -> Result<LocationPath, String> {
        let mut parser = PathParser {
            input: expression.as_bytes(),
            position: 0,
        };
        parser.location_path()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        if self.input[self.position..].starts_with(token.as_bytes()) {
            self.position += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), String> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {:?}", token)))
        }
    }

    fn unexpected(&self, context: &str) -> String {
        match self.peek() {
            Some(b) => format!("{}, found {:?} at offset {}", context, b as char, self.position),
            None => format!("{}, found end of expression", context),
        }
    }

    fn name(&mut self) -> Option<String> {
        self.skip_whitespace();
        let start = self.position;
        if !self.peek().is_some_and(|b| b.is_ascii_alphabetic() || b == b'_') {
            return None;
        }
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
        {
            self.position += 1;
        }
        Some(String::from_utf8_lossy(&self.input[start..self.position]).into_owned())
    }

    fn location_path(&mut self) -> Result<LocationPath, String> {
        self.skip_whitespace();
        let mut path = LocationPath {
            is_absolute: self.peek() == Some(b'/'),
            steps: Vec::new(),
        };
        if self.eat("//") {
            path.steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
        } else if self.eat("/") {
            self.skip_whitespace();
            if self.peek().is_none() {
                return Ok(path);
            }
        }
        loop {
            path.steps.push(self.step()?);
            if self.eat("//") {
                path.steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
            } else if !self.eat("/") {
                self.skip_whitespace();
                return match self.peek() {
                    None => Ok(path),
                    Some(_) => Err(self.unexpected("expected \"/\" or end of path")),
                };
            }
        }
    }

    fn step(&mut self) -> Result<Step, String> {
        if self.eat("..") {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }
        if self.eat(".") {
            return Ok(Step::new(Axis::SelfAxis, NodeTest::Node));
        }
        let mut step = if self.eat("@") {
            Step::new(Axis::Attribute, self.node_test()?)
        } else {
            let start = self.position;
            let axis = match self.name() {
                Some(name) if self.eat("::") => Axis::from_name(&name)
                    .ok_or_else(|| format!("unsupported axis {:?}", name))?,
                _ => {
                    self.position = start;
                    Axis::Child
                }
            };
            Step::new(axis, self.node_test()?)
        };
        while self.eat("[") {
            step.predicates.push(self.predicate()?);
            self.expect("]")?;
        }
        Ok(step)
    }

    fn node_test(&mut self) -> Result<NodeTest, String> {
        if self.eat("*") {
            return Ok(NodeTest::Wildcard);
        }
        let Some(name) = self.name() else {
            return Err(self.unexpected("expected a node test"));
        };
        if !self.eat("(") {
            return Ok(NodeTest::Name(name));
        }
        self.expect(")")?;
        match name.as_str() {
            "text" => Ok(NodeTest::Text),
            "node" => Ok(NodeTest::Node),
            "comment" => Ok(NodeTest::Comment),
            other => Err(format!("unsupported node test {}()", other)),
        }
    }

    fn predicate(&mut self) -> Result<Predicate, String> {
        self.skip_whitespace();
        if self.peek().is_some_and(|b| b.is_ascii_digit()) {
            let start = self.position;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.position += 1;
            }
            let digits = String::from_utf8_lossy(&self.input[start..self.position]);
            return digits
                .parse()
                .map(Predicate::Position)
                .map_err(|e| format!("invalid position {}: {}", digits, e));
        }
        if self.eat("last()") {
            return Ok(Predicate::Last);
        }
        if !self.eat("@") {
            return Err(self.unexpected("expected a position or attribute predicate"));
        }
        let Some(name) = self.name() else {
            return Err(self.unexpected("expected an attribute name"));
        };
        if !self.eat("=") {
            return Ok(Predicate::HasAttribute(name));
        }
        self.skip_whitespace();
        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(self.unexpected("expected a quoted literal")),
        };
        self.position += 1;
        let start = self.position;
        while self.peek().is_some_and(|b| b != quote) {
            self.position += 1;
        }
        if self.peek().is_none() {
            return Err("unterminated literal".to_string());
        }
        let value = String::from_utf8_lossy(&self.input[start..self.position]).into_owned();
        self.position += 1;
        Ok(Predicate::AttributeEquals(name, value))
    }
}

fn matches(test: &NodeTest, node: NodeRef<'_, Node>) -> bool {
    match (test, node.value()) {
        (NodeTest::Node, _) => true,
        (NodeTest::Wildcard, Node::Element(_)) => true,
        (NodeTest::Name(name), Node::Element(element)) => element.name().eq_ignore_ascii_case(name),
        (NodeTest::Text, Node::Text(_)) => true,
        (NodeTest::Comment, Node::Comment(_)) => true,
        _ => false,
    }
}

impl XpathSelection {
    /// Parses `document` leniently as HTML and starts at the document node.
    pub fn parse(document: &str) -> Self {
        let html = Html::parse_document(document);
        let root = html.tree.root().id();
        XpathSelection {
            document: Rc::new(html),
            nodes: vec![XNode::Node(root)],
        }
    }

    fn with_nodes(&self, nodes: Vec<XNode>) -> SelectionRef {
        Rc::new(XpathSelection {
            document: Rc::clone(&self.document),
            nodes,
        })
    }

    fn attribute_of(&self, node: &XNode, name: &str) -> Option<&str> {
        match node {
            XNode::Node(id) => self.document.tree.get(*id)?.value().as_element()?.attr(name),
            XNode::Attribute(..) => None,
        }
    }

    fn evaluate(&self, path: &LocationPath) -> Vec<XNode> {
        let mut current = if path.is_absolute {
            vec![XNode::Node(self.document.tree.root().id())]
        } else {
            self.nodes.clone()
        };
        for step in &path.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for node in &current {
                let mut candidates = self.axis(node, step);
                for predicate in &step.predicates {
                    candidates = self.filter(predicate, candidates);
                }
                for candidate in candidates {
                    if seen.insert(candidate.clone()) {
                        next.push(candidate);
                    }
                }
            }
            current = next;
        }
        current
    }

    fn axis(&self, node: &XNode, step: &Step) -> Vec<XNode> {
        let id = match node {
            XNode::Node(id) => *id,
            XNode::Attribute(owner, _) => {
                return match step.axis {
                    Axis::Parent => self
                        .document
                        .tree
                        .get(*owner)
                        .filter(|n| matches(&step.test, *n))
                        .map(|_| vec![XNode::Node(*owner)])
                        .unwrap_or_default(),
                    Axis::SelfAxis if step.test == NodeTest::Node => vec![node.clone()],
                    _ => Vec::new(),
                };
            }
        };
        let Some(start) = self.document.tree.get(id) else {
            return Vec::new();
        };
        let test = &step.test;
        let pick = |n: NodeRef<'_, Node>| matches(test, n).then(|| XNode::Node(n.id()));
        match step.axis {
            Axis::Child => start.children().filter_map(pick).collect(),
            Axis::Descendant => start.descendants().skip(1).filter_map(pick).collect(),
            Axis::DescendantOrSelf => start.descendants().filter_map(pick).collect(),
            Axis::SelfAxis => pick(start).into_iter().collect(),
            Axis::Parent => start.parent().and_then(pick).into_iter().collect(),
            Axis::Attribute => {
                let Some(element) = start.value().as_element() else {
                    return Vec::new();
                };
                element
                    .attrs()
                    .filter(|(name, _)| match test {
                        NodeTest::Name(wanted) => name.eq_ignore_ascii_case(wanted),
                        NodeTest::Wildcard | NodeTest::Node => true,
                        _ => false,
                    })
                    .map(|(name, _)| XNode::Attribute(id, name.to_string()))
                    .collect()
            }
        }
    }

    fn filter(&self, predicate: &Predicate, mut candidates: Vec<XNode>) -> Vec<XNode> {
        match predicate {
            Predicate::Position(n) => n
                .checked_sub(1)
                .and_then(|i| candidates.into_iter().nth(i))
                .into_iter()
                .collect(),
            Predicate::Last => candidates.pop().into_iter().collect(),
            Predicate::HasAttribute(name) => {
                candidates.retain(|c| self.attribute_of(c, name).is_some());
                candidates
            }
            Predicate::AttributeEquals(name, value) => {
                candidates.retain(|c| self.attribute_of(c, name) == Some(value.as_str()));
                candidates
            }
        }
    }

    fn attribute_value(&self, node: &XNode) -> String {
        match node {
            XNode::Attribute(owner, name) => self
                .attribute_of(&XNode::Node(*owner), name)
                .unwrap_or_default()
                .to_string(),
            XNode::Node(_) => String::new(),
        }
    }
}

impl Selection for XpathSelection {
    fn kind(&self) -> SelectionKind {
        SelectionKind::Xpath
    }

    fn find(&self, selector: &str) -> Result<SelectionRef, SelectionError> {
        if selector.is_empty() {
            return Ok(Rc::new(self.clone()));
        }
        let path = PathParser::parse(selector).map_err(|message| SelectionError::Syntax {
            backend: SelectionKind::Xpath,
            expression: selector.to_string(),
            message,
        })?;
        Ok(self.with_nodes(self.evaluate(&path)))
    }

    fn at(&self, index: usize) -> Option<SelectionRef> {
        self.nodes
            .get(index)
            .map(|node| self.with_nodes(vec![node.clone()]))
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn for_each(&self, visit: &mut dyn FnMut(usize, SelectionRef) -> bool) {
        for (i, node) in self.nodes.iter().enumerate() {
            if !visit(i, self.with_nodes(vec![node.clone()])) {
                break;
            }
        }
    }

    /// Unknown or malformed names read as empty rather than failing.
    fn attribute(&self, name: &str) -> Result<String, SelectionError> {
        Ok(self
            .nodes
            .first()
            .and_then(|node| self.attribute_of(node, name))
            .unwrap_or_default()
            .to_string())
    }

    fn text(&self) -> String {
        self.nodes
            .iter()
            .map(|node| match node {
                XNode::Node(id) => self.document.tree.get(*id).map(text_content).unwrap_or_default(),
                XNode::Attribute(..) => self.attribute_value(node),
            })
            .collect()
    }

    fn raw(&self) -> String {
        self.nodes
            .iter()
            .map(|node| match node {
                XNode::Node(id) => self.document.tree.get(*id).map(outer_html).unwrap_or_default(),
                XNode::Attribute(..) => self.attribute_value(node),
            })
            .collect()
    }
}
