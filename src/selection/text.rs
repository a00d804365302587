use std::rc::Rc;

use super::{Selection, SelectionError, SelectionKind, SelectionRef};

/// Plain strings. The whole input document starts out as one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSelection {
    nodes: Vec<String>,
}

impl TextSelection {
    pub fn new(document: impl Into<String>) -> Self {
        TextSelection {
            nodes: vec![document.into()],
        }
    }

    pub fn shared(document: impl Into<String>) -> SelectionRef {
        Rc::new(TextSelection::new(document))
    }
}

impl Selection for TextSelection {
    fn kind(&self) -> SelectionKind {
        SelectionKind::Text
    }

    /// Strings have no structure to search, so this is the identity.
    fn find(&self, _selector: &str) -> Result<SelectionRef, SelectionError> {
        Ok(Rc::new(self.clone()))
    }

    fn at(&self, index: usize) -> Option<SelectionRef> {
        self.nodes
            .get(index)
            .map(|node| TextSelection::shared(node.clone()))
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn for_each(&self, visit: &mut dyn FnMut(usize, SelectionRef) -> bool) {
        for (i, node) in self.nodes.iter().enumerate() {
            if !visit(i, TextSelection::shared(node.clone())) {
                break;
            }
        }
    }

    fn attribute(&self, _name: &str) -> Result<String, SelectionError> {
        Ok(String::new())
    }

    fn text(&self) -> String {
        self.raw()
    }

    fn raw(&self) -> String {
        self.nodes.concat()
    }
}
