//! Arena-backed document tree
//!
//! Nodes live in a `Vec<Option<Node>>` and are addressed by [`NodeId`].
//! Ids are handed out monotonically and never reused, so an id held by a
//! cache after its node was removed simply stops resolving
//! ([`Document::is_alive`] returns false) instead of aliasing a new node.
//!
//! Every operation that frees nodes returns the freed ids; callers holding
//! per-node state use that list to drop it.

mod parser;
mod serialize;

use std::fmt;

/// Stable handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Document root, or the detached container returned by `parse_fragment`
    Document,
    /// Element with lowercase tag and ordered attributes
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    Doctype(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Elements that never have children or a closing tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text up to the matching end tag
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Mutable HTML tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document holding only its root
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new(NodeData::Document))],
            root: NodeId(0),
        }
    }

    /// Parse a full page (or any markup) into a new document
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        parser::parse_into(&mut doc, root, html);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Parse markup into a detached container; move its children out, then `remove` it
    pub fn parse_fragment(&mut self, html: &str) -> NodeId {
        let container = self.alloc(NodeData::Document);
        parser::parse_into(self, container, html);
        container
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(data)));
        id
    }

    // ═══════════════════════════════════════════════════════════════
    // Node access
    // ═══════════════════════════════════════════════════════════════

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Live nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|n| &n.data)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element { .. }))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).iter().copied().find(|c| self.is_element(*c))
    }

    /// Pre-order descendants, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Ancestors from the parent upwards
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    /// Text nodes below `id`
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| matches!(self.data(*n), Some(NodeData::Text(_))))
            .collect()
    }

    /// Elements below `id` (excluding `id`) carrying the attribute
    pub fn elements_with_attr(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.has_attr(*n, name))
            .collect()
    }

    /// Nearest ancestor carrying the attribute
    pub fn closest_with_attr(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.ancestors(id).find(|n| self.has_attr(*n, name))
    }

    /// First element in document order whose `id` attribute matches
    pub fn find_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(element_id))
    }

    // ═══════════════════════════════════════════════════════════════
    // Attributes
    // ═══════════════════════════════════════════════════════════════

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match self.data(id) {
            Some(NodeData::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute, keeping its position when it already exists
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = self.node_mut(id)
        {
            match attrs.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_ascii_lowercase(), value.to_string())),
            }
        }
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        if let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = self.node_mut(id)
        {
            let before = attrs.len();
            attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
            return attrs.len() != before;
        }
        false
    }

    // ═══════════════════════════════════════════════════════════════
    // Classes
    // ═══════════════════════════════════════════════════════════════

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|x| x == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) || !self.is_element(id) {
            return;
        }
        let value = match self.attr(id, "class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &value);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let value = self
            .attr(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
            .filter(|x| *x != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "class", &value);
    }

    /// Add the class when `on`, remove it otherwise
    pub fn toggle_class(&mut self, id: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(id, class);
        } else {
            self.remove_class(id, class);
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Structure
    // ═══════════════════════════════════════════════════════════════

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Unlink a node from its parent without freeing it
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    /// Move `child` (and its subtree) to the end of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.is_alive(parent) || !self.is_alive(child) || parent == child {
            return;
        }
        if self.ancestors(parent).any(|a| a == child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Move `new` to directly after `reference` under the same parent
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if !self.is_alive(new) || new == reference || self.ancestors(parent).any(|a| a == new) {
            return;
        }
        self.detach(new);
        if let Some(p) = self.node_mut(parent) {
            let at = p
                .children
                .iter()
                .position(|c| *c == reference)
                .map(|i| i + 1)
                .unwrap_or(p.children.len());
            p.children.insert(at, new);
        }
        if let Some(n) = self.node_mut(new) {
            n.parent = Some(parent);
        }
    }

    /// Put `new` where `old` was and free `old`'s subtree
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(old) else {
            return Vec::new();
        };
        if !self.is_alive(new) || new == old {
            return Vec::new();
        }
        self.detach(new);
        if let Some(p) = self.node_mut(parent) {
            if let Some(slot) = p.children.iter_mut().find(|c| **c == old) {
                *slot = new;
            }
        }
        if let Some(n) = self.node_mut(new) {
            n.parent = Some(parent);
        }
        if let Some(o) = self.node_mut(old) {
            o.parent = None;
        }
        self.free(old)
    }

    /// Detach and free a node with its subtree; returns the freed ids
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if id == self.root {
            return Vec::new();
        }
        self.detach(id);
        self.free(id)
    }

    fn free(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.is_alive(id) {
            return Vec::new();
        }
        let mut freed = vec![id];
        freed.extend(self.descendants(id));
        for n in &freed {
            if let Some(slot) = self.nodes.get_mut(n.0) {
                *slot = None;
            }
        }
        freed
    }

    /// Free every child of `id`
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = self.children(id).to_vec();
        let mut freed = Vec::new();
        for child in children {
            freed.extend(self.remove(child));
        }
        freed
    }

    /// Replace the children of `id` with parsed markup; returns the freed ids
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Vec<NodeId> {
        let mut freed = self.clear_children(id);
        if !self.is_alive(id) {
            return freed;
        }
        let container = self.parse_fragment(html);
        for child in self.children(container).to_vec() {
            self.append_child(id, child);
        }
        freed.extend(self.remove(container));
        freed
    }

    // ═══════════════════════════════════════════════════════════════
    // Serialization
    // ═══════════════════════════════════════════════════════════════

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            serialize::write_node(self, *child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_node(self, id, &mut out);
        out
    }

    /// Whole document as markup
    pub fn to_html(&self) -> String {
        self.inner_html(self.root)
    }

    /// Concatenated text content below `id`
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }
}
