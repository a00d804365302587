//! # GraphQuery Expression Language - Syntax Tree
//!
//! This module defines the syntax tree for GraphQuery expressions, a small
//! declarative language that names the fields to extract from a document and
//! attaches an ordered chain of extraction operations to each of them.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Byte classification used by the scanner
//! - **[node]** - Declared fields, their types and pipelines
//!
//! ## Quick Start
//!
//! ```text
//! {
//!     title `css("h1")`
//!     links `css("a")` [{
//!         text `text()`
//!         href `attr("href")`
//!     }]
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Nodes
//!
//! Every field is `name`, an optional pipeline in backticks and optional
//! children. The children's brackets decide the node type:
//!
//! - no children → string scalar
//! - `{ ... }` → object
//! - `[ ... ]` → array
//! - `[{ ... }]` → array of objects
//!
//! ### Pipelines
//!
//! A pipeline is a `;`-separated list of operations with double-quoted
//! arguments, applied left to right to the parent's selection:
//!
//! ```text
//! `css(".price"); text(); replace("$", "")`
//! ```
//!
//! ### References
//!
//! Arguments may embed `{$name}` to splice in the text of an earlier sibling
//! or an ancestor's earlier sibling; `{$}` stands for the current selection.
//! `link("name")` replaces the selection with the referenced node's text.
//!
//! ### Virtual Keys
//!
//! Names wrapped in double underscores (`__json__`) are evaluated and can be
//! referenced, but never appear in the output.
pub mod node;
pub mod tokens;

pub use node::{GraphKind, Node, NodeType, Pipe};
pub use tokens::Signal;
