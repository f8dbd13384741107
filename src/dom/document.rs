//! In-memory HTML document.
//!
//! Nodes live in an arena addressed by [`NodeId`]. Replaced subtrees are
//! released back to a free list, so a long-running session does not grow
//! without bound; a released id reports `contains() == false` until reused.

use super::node::{ElementData, NodeData, NodeId, NodeKind};
use super::{Dom, DomError, Fragment, parse, serialize};
use crate::utils::html::class_list_contains;

/// Arena-backed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Option<NodeData>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document (root node only).
    pub fn new() -> Self {
        Self {
            slots: vec![Some(NodeData::new(NodeKind::Document))],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Parse a full page into a new document.
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        for node in parse::parse_nodes(&mut doc, html) {
            doc.append_child(root, node);
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<body>` element, if the page has one.
    pub fn body(&self) -> Option<NodeId> {
        self.find_element(|e| e.tag == "body")
    }

    // =========================================================================
    // Arena
    // =========================================================================

    pub(super) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData::new(kind);
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(data);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(data));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    fn require(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.node(id).ok_or_else(|| DomError::UnknownNode(id.to_string()))
    }

    /// Number of live nodes, including the root.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root).is_none_or(|n| n.children.is_empty())
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    // =========================================================================
    // Tree Structure
    // =========================================================================

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).and_then(NodeData::element)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub(super) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Unlink a node from its parent. The subtree stays allocated.
    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    /// Free a detached subtree. Connected nodes are left alone.
    fn release(&mut self, id: NodeId) {
        if id == self.root || self.parent(id).is_some() || !self.contains(id) {
            return;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(data) = self.slots.get_mut(current.0).and_then(Option::take) {
                stack.extend(data.children);
                self.free.push(current.0);
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All nodes below `id` in document order (pre-order), excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// First connected element (document order) matching `pred`.
    pub fn find_element(&self, pred: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.element(id).is_some_and(&pred))
    }

    /// All connected elements whose class list contains `name`.
    pub fn elements_by_class(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| {
                self.element(id)
                    .and_then(|e| e.get("class"))
                    .is_some_and(|c| class_list_contains(c, name))
            })
            .collect()
    }

    /// First connected element whose attribute `name` equals `value`.
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        self.find_element(|e| e.get(name) == Some(value))
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.get(name))
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match self.node_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Element(e)) => {
                e.set(name, value);
                Ok(())
            }
            Some(_) => Err(DomError::NotAnElement(id.to_string())),
            None => Err(DomError::UnknownNode(id.to_string())),
        }
    }

    /// Simulate user input on a form control.
    ///
    /// `textarea` stores its value as text content; other controls use the
    /// `value` attribute.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        if self.tag_name(id) == Some("textarea") {
            let text = self.alloc(NodeKind::Text(value.to_string()));
            return self.replace_children(id, &[text]);
        }
        self.set_attribute(id, "value", value)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    pub fn outer_html(&self, id: NodeId) -> String {
        serialize::outer_html(self, id)
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        serialize::inner_html(self, id)
    }

    pub fn text_content(&self, id: NodeId) -> String {
        serialize::text_content(self, id)
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        serialize::inner_html(self, self.root)
    }

    fn selected_option_value(&self, select: NodeId) -> String {
        let options: Vec<NodeId> = self
            .descendants(select)
            .into_iter()
            .filter(|&id| self.tag_name(id) == Some("option"))
            .collect();
        let chosen = options
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some_and(|e| e.has("selected")))
            .or_else(|| options.first().copied());

        match chosen {
            Some(option) => match self.get_attribute(option, "value") {
                Some(v) => v.to_string(),
                None => self.text_content(option).trim().to_string(),
            },
            None => String::new(),
        }
    }
}

// =============================================================================
// Capability Implementation
// =============================================================================

impl Dom for Document {
    type Node = NodeId;

    fn find_by_target_id(&self, target: &str) -> Option<NodeId> {
        self.find_element(|e| e.get("class").is_some_and(|c| class_list_contains(c, target)))
    }

    fn parse_fragment(&mut self, html: &str) -> Fragment<NodeId> {
        Fragment {
            nodes: parse::parse_nodes(self, html.trim()),
        }
    }

    fn replace_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<(), DomError> {
        match &self.require(parent)?.kind {
            NodeKind::Element(_) | NodeKind::Document => {}
            _ => return Err(DomError::NotAnElement(parent.to_string())),
        }
        for &child in children {
            self.require(child)?;
        }

        let old = match self.node_mut(parent) {
            Some(p) => std::mem::take(&mut p.children),
            None => return Err(DomError::UnknownNode(parent.to_string())),
        };
        for &child in &old {
            if let Some(n) = self.node_mut(child) {
                n.parent = None;
            }
        }
        for &child in children {
            self.append_child(parent, child);
        }
        for child in old {
            if !children.contains(&child) {
                self.release(child);
            }
        }
        Ok(())
    }

    fn replace_element(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        self.require(new)?;
        let parent = self
            .require(old)?
            .parent
            .ok_or_else(|| DomError::Detached(old.to_string()))?;
        if old == new {
            return Ok(());
        }

        self.detach(new);
        let Some(siblings) = self.node_mut(parent).map(|p| &mut p.children) else {
            return Err(DomError::UnknownNode(parent.to_string()));
        };
        let Some(index) = siblings.iter().position(|&c| c == old) else {
            return Err(DomError::Detached(old.to_string()));
        };
        siblings[index] = new;

        if let Some(n) = self.node_mut(new) {
            n.parent = Some(parent);
        }
        if let Some(n) = self.node_mut(old) {
            n.parent = None;
        }
        self.release(old);
        Ok(())
    }

    fn discard(&mut self, nodes: &[NodeId]) {
        for &node in nodes {
            self.release(node);
        }
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.get_attribute(node, name).map(str::to_string)
    }

    fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    fn current_value(&self, node: NodeId) -> String {
        match self.tag_name(node) {
            Some("textarea") => self.text_content(node),
            Some("select") => self.selected_option_value(node),
            _ => self
                .get_attribute(node, "value")
                .unwrap_or_default()
                .to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Document {
        Document::parse(
            r#"<html><body class="pyfron_body"><div class="greeting">Hi</div><p class="a b">x</p></body></html>"#,
        )
    }

    #[test]
    fn test_parse_and_body() {
        let doc = page();
        let body = doc.body().unwrap();
        assert_eq!(doc.tag_name(body), Some("body"));
        assert_eq!(doc.element_children(body).len(), 2);
    }

    #[test]
    fn test_find_by_target_id_first_match() {
        let doc = Document::parse(r#"<div class="x">1</div><div class="x">2</div>"#);
        let found = doc.find_by_target_id("x").unwrap();
        assert_eq!(doc.text_content(found), "1");
        assert!(doc.find_by_target_id("missing").is_none());
    }

    #[test]
    fn test_find_by_target_id_matches_token() {
        let doc = page();
        let p = doc.find_by_target_id("b").unwrap();
        assert_eq!(doc.tag_name(p), Some("p"));
        assert_eq!(doc.elements_by_class("a"), vec![p]);
    }

    #[test]
    fn test_parse_fragment_blank_is_empty() {
        let mut doc = Document::new();
        let before = doc.len();
        assert!(doc.parse_fragment("   \n\t  ").is_empty());
        assert!(doc.parse_fragment("").is_empty());
        assert_eq!(doc.len(), before);
    }

    #[test]
    fn test_parse_fragment_is_detached() {
        let mut doc = page();
        let frag = doc.parse_fragment("  <span>a</span><span>b</span>  ");
        assert_eq!(frag.nodes.len(), 2);
        for node in frag.nodes {
            assert!(doc.contains(node));
            assert!(!doc.is_connected(node));
        }
    }

    #[test]
    fn test_replace_element_swaps_identity() {
        let mut doc = page();
        let old = doc.find_by_target_id("greeting").unwrap();
        let frag = doc.parse_fragment(r#"<div class="greeting">Bye</div>"#);
        doc.replace_element(old, frag.nodes[0]).unwrap();

        let new = doc.find_by_target_id("greeting").unwrap();
        assert_ne!(new, old);
        assert_eq!(doc.text_content(new), "Bye");
        assert!(!doc.is_connected(old));
        assert_eq!(doc.elements_by_class("greeting").len(), 1);
    }

    #[test]
    fn test_replace_element_keeps_position() {
        let mut doc = page();
        let body = doc.body().unwrap();
        let old = doc.find_by_target_id("greeting").unwrap();
        let frag = doc.parse_fragment("<section>s</section>");
        doc.replace_element(old, frag.nodes[0]).unwrap();
        let tags: Vec<_> = doc
            .element_children(body)
            .into_iter()
            .map(|c| doc.tag_name(c).unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["section", "p"]);
    }

    #[test]
    fn test_replace_element_detached_fails() {
        let mut doc = Document::new();
        let frag = doc.parse_fragment("<i>a</i><i>b</i>");
        let err = doc.replace_element(frag.nodes[0], frag.nodes[1]).unwrap_err();
        assert!(matches!(err, DomError::Detached(_)));
    }

    #[test]
    fn test_replace_children_keeps_container() {
        let mut doc = page();
        let body = doc.body().unwrap();
        let old_children = doc.children(body).to_vec();
        let frag = doc.parse_fragment("<h1>t</h1><p>p</p>");
        doc.replace_children(body, &frag.nodes).unwrap();

        assert_eq!(doc.body(), Some(body));
        assert_eq!(doc.inner_html(body), "<h1>t</h1><p>p</p>");
        for child in old_children {
            assert!(!doc.is_connected(child));
        }
    }

    #[test]
    fn test_released_nodes_are_recycled() {
        let mut doc = page();
        let body = doc.body().unwrap();
        for _ in 0..10 {
            let frag = doc.parse_fragment("<div class=\"greeting\">Hi</div><p>x</p>");
            doc.replace_children(body, &frag.nodes).unwrap();
        }
        let steady = doc.len();
        let frag = doc.parse_fragment("<div class=\"greeting\">Hi</div><p>x</p>");
        doc.replace_children(body, &frag.nodes).unwrap();
        assert_eq!(doc.len(), steady);
    }

    #[test]
    fn test_discard_ignores_connected() {
        let mut doc = page();
        let greeting = doc.find_by_target_id("greeting").unwrap();
        doc.discard(&[greeting]);
        assert!(doc.is_connected(greeting));
    }

    #[test]
    fn test_current_value_variants() {
        let mut doc = Document::parse(
            r#"<form>
                <input class="i" value="a@b.com" />
                <textarea class="t">hello</textarea>
                <select class="s"><option value="1">one</option><option value="2" selected>two</option></select>
                <select class="s2"><option>first</option></select>
                <input class="e" />
            </form>"#,
        );
        let i = doc.find_by_target_id("i").unwrap();
        let t = doc.find_by_target_id("t").unwrap();
        let s = doc.find_by_target_id("s").unwrap();
        let s2 = doc.find_by_target_id("s2").unwrap();
        let e = doc.find_by_target_id("e").unwrap();
        assert_eq!(doc.current_value(i), "a@b.com");
        assert_eq!(doc.current_value(t), "hello");
        assert_eq!(doc.current_value(s), "2");
        assert_eq!(doc.current_value(s2), "first");
        assert_eq!(doc.current_value(e), "");

        doc.set_value(t, "typed").unwrap();
        doc.set_value(e, "x").unwrap();
        assert_eq!(doc.current_value(t), "typed");
        assert_eq!(doc.current_value(e), "x");
    }

    #[test]
    fn test_attribute_case_insensitive() {
        let doc = Document::parse(r#"<form elemId="0-1"></form>"#);
        let form = doc.find_element(|e| e.tag == "form").unwrap();
        assert_eq!(doc.attribute(form, "elemid").as_deref(), Some("0-1"));
        assert_eq!(doc.identifier(form, "ELEMID").as_deref(), Some("0-1"));
    }
}
