use std::{collections::HashSet, rc::Rc};

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};

use super::{Selection, SelectionError, SelectionKind, SelectionRef};

/// Elements of a parsed HTML document matched by CSS selectors.
#[derive(Debug, Clone)]
pub struct CssSelection {
    document: Rc<Html>,
    nodes: Vec<NodeId>,
}

impl CssSelection {
    /// Parses `document` as HTML. Parsing is lenient, so this never fails;
    /// fragments are wrapped in `<html><head></head><body>`.
    pub fn parse(document: &str) -> Self {
        let html = Html::parse_document(document);
        let root = html.root_element().id();
        CssSelection {
            document: Rc::new(html),
            nodes: vec![root],
        }
    }

    fn with_nodes(&self, nodes: Vec<NodeId>) -> SelectionRef {
        Rc::new(CssSelection {
            document: Rc::clone(&self.document),
            nodes,
        })
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.nodes
            .iter()
            .filter_map(|&id| self.document.tree.get(id))
            .filter_map(ElementRef::wrap)
    }
}

impl Selection for CssSelection {
    fn kind(&self) -> SelectionKind {
        SelectionKind::Css
    }

    /// Matches descendants of every current element. An element reachable
    /// from two starting points is kept once, at its first position.
    fn find(&self, selector: &str) -> Result<SelectionRef, SelectionError> {
        if selector.is_empty() {
            return Ok(Rc::new(self.clone()));
        }
        let compiled = Selector::parse(selector).map_err(|e| SelectionError::Syntax {
            backend: SelectionKind::Css,
            expression: selector.to_string(),
            message: e.to_string(),
        })?;

        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for element in self.elements() {
            for found in element.select(&compiled) {
                if seen.insert(found.id()) {
                    nodes.push(found.id());
                }
            }
        }
        Ok(self.with_nodes(nodes))
    }

    fn at(&self, index: usize) -> Option<SelectionRef> {
        self.nodes.get(index).map(|&id| self.with_nodes(vec![id]))
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn for_each(&self, visit: &mut dyn FnMut(usize, SelectionRef) -> bool) {
        for (i, &id) in self.nodes.iter().enumerate() {
            if !visit(i, self.with_nodes(vec![id])) {
                break;
            }
        }
    }

    fn attribute(&self, name: &str) -> Result<String, SelectionError> {
        if name.is_empty() {
            return Err(SelectionError::EmptyAttribute);
        }
        Ok(self
            .elements()
            .next()
            .and_then(|element| element.value().attr(name))
            .unwrap_or_default()
            .to_string())
    }

    fn text(&self) -> String {
        self.elements().flat_map(|element| element.text()).collect()
    }

    fn raw(&self) -> String {
        self.elements().map(|element| element.html()).collect()
    }
}

/// Serialises any tree node: elements as outer HTML, text as itself,
/// comments with their delimiters.
pub(crate) fn outer_html(node: NodeRef<'_, Node>) -> String {
    match node.value() {
        Node::Text(text) => String::from(&*text.text),
        Node::Comment(comment) => format!("<!--{}-->", &*comment.comment),
        _ => match ElementRef::wrap(node) {
            Some(element) => element.html(),
            None => node.children().map(outer_html).collect(),
        },
    }
}

/// Text content of any tree node. A comment's content counts as its text.
pub(crate) fn text_content(node: NodeRef<'_, Node>) -> String {
    if let Node::Comment(comment) = node.value() {
        return String::from(&*comment.comment);
    }
    node.descendants()
        .filter_map(|n| match n.value() {
            Node::Text(text) => Some(&*text.text),
            _ => None,
        })
        .collect()
}
