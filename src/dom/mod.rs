//! DOM Capability Layer
//!
//! Everything the runtime needs from a live page goes through the [`Dom`]
//! trait. A browser host implements it against its own DOM; this crate ships
//! [`Document`], an in-memory HTML tree used by the headless runner and tests.
//!
//! # Capabilities
//!
//! | Method               | Used by            |
//! |----------------------|--------------------|
//! | `find_by_target_id`  | change-set applier |
//! | `parse_fragment`     | change-set applier |
//! | `replace_children`   | change-set applier |
//! | `replace_element`    | change-set applier |
//! | `attribute`          | event capture      |
//! | `element_children`   | event capture      |
//! | `current_value`      | event capture      |

mod document;
mod node;
mod parse;
mod serialize;

use std::fmt::Debug;

use thiserror::Error;

pub use document::Document;
pub use node::{ElementData, NodeId, NodeKind};

/// Errors raised by DOM mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0} does not exist")]
    UnknownNode(String),

    #[error("node {0} has no parent to replace it in")]
    Detached(String),

    #[error("node {0} is not an element")]
    NotAnElement(String),
}

/// Top-level nodes of a parsed, still detached, HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<N> {
    pub nodes: Vec<N>,
}

impl<N> Fragment<N> {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Minimal DOM surface the client runtime depends on.
pub trait Dom {
    /// Node handle. Cheap to copy, stable while the node exists.
    type Node: Copy + Eq + Debug;

    /// First element in document order whose class list contains `target`.
    fn find_by_target_id(&self, target: &str) -> Option<Self::Node>;

    /// Parse `html` into detached nodes.
    ///
    /// Leading and trailing whitespace is trimmed first, so a blank fragment
    /// produces no nodes at all.
    fn parse_fragment(&mut self, html: &str) -> Fragment<Self::Node>;

    /// Replace every child of `parent` with `children` (in order).
    ///
    /// `parent` keeps its identity; the previous children are detached.
    fn replace_children(
        &mut self,
        parent: Self::Node,
        children: &[Self::Node],
    ) -> Result<(), DomError>;

    /// Swap `old` for `new` inside `old`'s parent. `old` is detached afterwards.
    fn replace_element(&mut self, old: Self::Node, new: Self::Node) -> Result<(), DomError>;

    /// Release detached nodes the runtime no longer references.
    ///
    /// Hosts with a garbage collected DOM can ignore this.
    fn discard(&mut self, _nodes: &[Self::Node]) {}

    /// Whether the node is an element (as opposed to text or a comment).
    fn is_element(&self, node: Self::Node) -> bool;

    /// Attribute value, matched ASCII-case-insensitively.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Element children, in document order.
    fn element_children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Current value of a form control (`input.value` and friends).
    fn current_value(&self, node: Self::Node) -> String;

    /// Field key the element is submitted under, if any.
    fn field_key(&self, node: Self::Node, attr: &str) -> Option<String> {
        self.attribute(node, attr)
    }

    /// Logical identifier of an interactive element (the submitter of a form).
    fn identifier(&self, node: Self::Node, attr: &str) -> Option<String> {
        self.attribute(node, attr)
    }
}
