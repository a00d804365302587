use std::{fmt, rc::Rc};

use indexmap::IndexMap;
use thiserror::Error;

use crate::{
    ast::{NodeType, Pipe},
    output::{self, Response},
    pipeline::{self, PipelineError, SELF_PLACEHOLDER},
    program::{NodeId, Program},
    registry::Registry,
    selection::{elements, SelectionRef, TextSelection},
    value::{Value, ValueError},
};

/// Errors recorded against a node during evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// One evaluation run of a [`Program`] over one document.
///
/// The program itself is never modified. Everything that changes while the
/// tree is walked lives here, one slot per node:
/// - the selection cache, holding the current context of each node
/// - the error list, appended to and never cleared
pub struct Evaluator<'p> {
    program: &'p Program,
    registry: &'p Registry,
    cache: Vec<Option<SelectionRef>>,
    errors: Vec<Vec<String>>,
}

impl fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("nodes", &self.program.len())
            .field("cached", &self.cache.iter().filter(|c| c.is_some()).count())
            .finish()
    }
}

impl<'p> Evaluator<'p> {
    pub fn new(program: &'p Program, registry: &'p Registry, document: &str) -> Self {
        let mut cache = vec![None; program.len()];
        cache[program.root().index()] = Some(TextSelection::shared(document));
        Evaluator {
            program,
            registry,
            cache,
            errors: vec![Vec::new(); program.len()],
        }
    }

    /// Evaluates every top-level node and assembles the response.
    pub fn run(mut self) -> Response {
        let program = self.program;
        let mut fields = IndexMap::new();
        for &id in program.top_level() {
            let value = self.evaluate(id);
            fields.insert(program.node(id).name.clone(), value);
        }
        Response {
            data: output::project_graph(program.kind(), &fields),
            errors: self.collect_errors(),
        }
    }

    /// Builds the value of one node.
    ///
    /// A node whose selection fails yields its empty value; the failure is
    /// already recorded against it.
    pub fn evaluate(&mut self, id: NodeId) -> Value {
        let program = self.program;
        let node = program.node(id);
        let mut value = Value::empty(node.node_type);
        let Some(selection) = self.selection(id) else {
            return value;
        };

        match node.node_type {
            NodeType::String | NodeType::Number => {
                if !selection.is_empty() {
                    if let Err(e) = value.set_scalar(&selection.text()) {
                        self.record(id, e.into());
                    }
                }
            }
            NodeType::Object => {
                for &child in node.children() {
                    let child_value = self.evaluate(child);
                    self.cache[child.index()] = None;
                    if let Err(e) = value.insert(program.node(child).name.as_str(), child_value) {
                        self.record(id, e.into());
                        break;
                    }
                }
            }
            NodeType::Array | NodeType::ObjectArray => {
                for (i, element) in elements(&*selection).into_iter().enumerate() {
                    self.cache[id.index()] = Some(element);
                    self.clear_descendants(id);
                    for &child in node.children() {
                        let child_value = self.evaluate(child);
                        if let Err(e) = value.push(i, &program.node(child).name, child_value) {
                            self.record(id, e.into());
                            break;
                        }
                    }
                }
                self.clear_descendants(id);
                self.cache[id.index()] = Some(selection);
            }
        }
        value
    }

    /// Drops every cached selection below `id`.
    ///
    /// References resolved while a child was built can refill caches
    /// anywhere in the subtree, so all of it depends on the current element.
    fn clear_descendants(&mut self, id: NodeId) {
        let program = self.program;
        let cache = &mut self.cache;
        for &child in program.node(id).children() {
            program.traverse(child, &mut |n| cache[n.index()] = None);
        }
    }

    /// The selection of a node, computed from its parent's on a cache miss.
    ///
    /// `None` means the node, or one of its ancestors, failed.
    pub fn selection(&mut self, id: NodeId) -> Option<SelectionRef> {
        if let Some(cached) = &self.cache[id.index()] {
            log::trace!("selection cache hit for {}", self.program.node(id).name);
            return Some(Rc::clone(cached));
        }
        let parent = self.program.node(id).parent()?;
        let context = self.selection(parent)?;
        log::trace!("selection cache miss for {}", self.program.node(id).name);
        let pipeline = self.resolve_pipeline(id);
        match pipeline::run(context, &pipeline, self.registry) {
            Ok(selection) => {
                self.cache[id.index()] = Some(Rc::clone(&selection));
                Some(selection)
            }
            Err(e) => {
                self.record(id, e.into());
                None
            }
        }
    }

    /// Text of a node's selection, or empty if it has none.
    pub fn node_text(&mut self, id: NodeId) -> String {
        self.selection(id)
            .map(|selection| selection.text())
            .unwrap_or_default()
    }

    /// Copies a node's pipeline with its references resolved.
    ///
    /// `link` takes a bare node name, which is replaced by that node's text.
    /// Every other argument goes through [`render`](Evaluator::render).
    fn resolve_pipeline(&mut self, id: NodeId) -> Vec<Pipe> {
        let program = self.program;
        let node = program.node(id);
        let mut resolved = Vec::with_capacity(node.pipeline.len());
        for pipe in &node.pipeline {
            if pipe.name != "link" {
                let args = pipe.args.iter().map(|arg| self.render(id, arg)).collect();
                resolved.push(Pipe {
                    name: pipe.name.clone(),
                    args,
                });
                continue;
            }
            if pipe.args.len() != 1 {
                let arity = PipelineError::Arity {
                    name: pipe.name.clone(),
                    expected: 1,
                    received: pipe.args.len(),
                };
                self.record(id, arity.into());
                continue;
            }
            let target = &pipe.args[0];
            if *target == node.name {
                continue;
            }
            let reference = match program.lookup(id, target) {
                Some(found) => self.node_text(found),
                None => String::new(),
            };
            resolved.push(Pipe {
                name: pipe.name.clone(),
                args: vec![reference],
            });
        }
        resolved
    }

    /// Expands `{$name}` references in an argument.
    ///
    /// `{$}` and the node's own name become [`SELF_PLACEHOLDER`]. Names that
    /// do not resolve are dropped. A `{$` with no closing `}` is kept.
    pub fn render(&mut self, id: NodeId, text: &str) -> String {
        let program = self.program;
        let own_name = program.node(id).name.as_str();
        let mut rendered = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("{$") {
            let Some(len) = rest[start + 2..].find('}') else {
                break;
            };
            let reference = &rest[start..start + 2 + len + 1];
            let name = &rest[start + 2..start + 2 + len];
            rendered.push_str(&rest[..start]);
            if name.is_empty() || name == own_name {
                rendered.push_str(SELF_PLACEHOLDER);
            } else if let Some(found) = program.lookup(id, name) {
                let value = self.node_text(found);
                rendered.push_str(&value);
            }
            rest = &rest[start + reference.len()..];
        }
        rendered.push_str(rest);
        rendered
    }

    fn record(&mut self, id: NodeId, error: EvalError) {
        let name = &self.program.node(id).name;
        log::debug!("{}: {}", name, error);
        self.errors[id.index()].push(error.to_string());
    }

    /// Every recorded error, prefixed with its node name.
    ///
    /// Nodes are visited in pre-order. Repeated messages are reported once,
    /// at their first position, with an occurrence count.
    pub fn collect_errors(&self) -> Vec<String> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        self.program.traverse(self.program.root(), &mut |id| {
            let name = &self.program.node(id).name;
            for error in &self.errors[id.index()] {
                *counts.entry(format!("{}: {}", name, error)).or_default() += 1;
            }
        });
        counts
            .into_iter()
            .map(|(error, times)| match times {
                1 => error,
                n => format!("{} ({} times)", error, n),
            })
            .collect()
    }
}
