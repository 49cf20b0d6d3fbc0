//! Variable → location registry and per-location template captures
//!
//! Captures are write-once: the first template seen for a location wins and
//! later scans of the same location leave it untouched. Entries for a
//! location are dropped by `forget` once the location leaves the document.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::dom::{Document, NodeId};

/// What kind of location a binding renders
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKind {
    /// Element content rebuilt from its captured inner markup
    Text,
    /// One attribute rebuilt from its captured value
    Attribute(String),
    /// Attribute set from a captured `rs-<attr>` expression
    Generic(String),
    /// `rs-if` visibility classes
    If,
    /// `rs-for` list children
    For,
    /// `rs-html` markup injection
    Html,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Text => f.write_str("text"),
            BindingKind::Attribute(name) => write!(f, "attr:{}", name),
            BindingKind::Generic(name) => write!(f, "rs-{}", name),
            BindingKind::If => f.write_str("if"),
            BindingKind::For => f.write_str("for"),
            BindingKind::Html => f.write_str("html"),
        }
    }
}

/// A location that must re-render when a variable changes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Binding {
    pub node: NodeId,
    pub kind: BindingKind,
}

impl Binding {
    pub fn new(node: NodeId, kind: BindingKind) -> Self {
        Self { node, kind }
    }
}

/// Captured state of one `rs-for` container
#[derive(Debug, Clone, PartialEq)]
pub struct ForTemplate {
    /// Declared item name (`t` in `t in todos`)
    pub item: String,
    /// Array path (`todos`)
    pub path: String,
    /// Inner markup captured before the container was cleared
    pub template: String,
}

#[derive(Debug, Default)]
pub struct BindingRegistry {
    by_var: HashMap<Arc<str>, BTreeSet<Binding>>,
    text_templates: HashMap<NodeId, String>,
    attr_templates: HashMap<(NodeId, String), String>,
    if_templates: HashMap<NodeId, String>,
    for_templates: HashMap<NodeId, ForTemplate>,
    html_tracked: HashSet<NodeId>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a binding under a variable; returns false if it was already there
    pub fn register(&mut self, var: &str, binding: Binding) -> bool {
        if let Some(set) = self.by_var.get_mut(var) {
            return set.insert(binding);
        }
        self.by_var
            .entry(Arc::from(var))
            .or_default()
            .insert(binding)
    }

    /// Bindings filed under `var`, in node order
    pub fn bindings_for(&self, var: &str) -> Vec<Binding> {
        self.by_var
            .get(var)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Variables with at least one binding, sorted
    pub fn variables(&self) -> Vec<Arc<str>> {
        let mut vars: Vec<_> = self.by_var.keys().cloned().collect();
        vars.sort();
        vars
    }

    /// Every distinct node carrying an `rs-if` binding
    pub fn if_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.if_templates.keys().copied().collect();
        nodes.sort();
        nodes
    }

    /// Total number of (variable, binding) pairs
    pub fn len(&self) -> usize {
        self.by_var.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_var.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════
    // Write-once captures
    // ═══════════════════════════════════════════════════════════════

    /// Capture an element's content template; false if one was already captured
    pub fn capture_text(&mut self, node: NodeId, template: &str) -> bool {
        capture(&mut self.text_templates, node, template.to_string())
    }

    pub fn text_template(&self, node: NodeId) -> Option<&str> {
        self.text_templates.get(&node).map(String::as_str)
    }

    pub fn capture_attr(&mut self, node: NodeId, attr: &str, template: &str) -> bool {
        capture(
            &mut self.attr_templates,
            (node, attr.to_ascii_lowercase()),
            template.to_string(),
        )
    }

    pub fn attr_template(&self, node: NodeId, attr: &str) -> Option<&str> {
        self.attr_templates
            .get(&(node, attr.to_ascii_lowercase()))
            .map(String::as_str)
    }

    pub fn capture_if(&mut self, node: NodeId, outer_html: &str) -> bool {
        capture(&mut self.if_templates, node, outer_html.to_string())
    }

    pub fn if_template(&self, node: NodeId) -> Option<&str> {
        self.if_templates.get(&node).map(String::as_str)
    }

    pub fn capture_for(&mut self, node: NodeId, state: ForTemplate) -> bool {
        capture(&mut self.for_templates, node, state)
    }

    pub fn for_template(&self, node: NodeId) -> Option<&ForTemplate> {
        self.for_templates.get(&node)
    }

    /// Mark an `rs-html` location's dependencies as scanned; false if already marked
    pub fn mark_html_tracked(&mut self, node: NodeId) -> bool {
        self.html_tracked.insert(node)
    }

    // ═══════════════════════════════════════════════════════════════
    // Cleanup
    // ═══════════════════════════════════════════════════════════════

    /// Drop every binding and capture of the given nodes
    pub fn forget(&mut self, ids: &[NodeId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let ids: HashSet<NodeId> = ids.iter().copied().collect();
        let before = self.len();

        for set in self.by_var.values_mut() {
            set.retain(|b| !ids.contains(&b.node));
        }
        self.by_var.retain(|_, set| !set.is_empty());
        self.text_templates.retain(|n, _| !ids.contains(n));
        self.attr_templates.retain(|(n, _), _| !ids.contains(n));
        self.if_templates.retain(|n, _| !ids.contains(n));
        self.for_templates.retain(|n, _| !ids.contains(n));
        self.html_tracked.retain(|n| !ids.contains(n));

        before - self.len()
    }

    /// Forget every node no longer alive in `doc`; returns bindings dropped
    pub fn prune(&mut self, doc: &Document) -> usize {
        let mut dead: HashSet<NodeId> = HashSet::new();
        for set in self.by_var.values() {
            dead.extend(set.iter().map(|b| b.node).filter(|n| !doc.is_alive(*n)));
        }
        dead.extend(self.text_templates.keys().filter(|n| !doc.is_alive(**n)));
        dead.extend(self.attr_templates.keys().map(|(n, _)| *n).filter(|n| !doc.is_alive(*n)));
        dead.extend(self.if_templates.keys().filter(|n| !doc.is_alive(**n)));
        dead.extend(self.for_templates.keys().filter(|n| !doc.is_alive(**n)));
        dead.extend(self.html_tracked.iter().filter(|n| !doc.is_alive(**n)));
        let dead: Vec<NodeId> = dead.into_iter().collect();
        self.forget(&dead)
    }

    /// Number of captured templates of all kinds
    pub fn captures(&self) -> usize {
        self.text_templates.len()
            + self.attr_templates.len()
            + self.if_templates.len()
            + self.for_templates.len()
    }
}

fn capture<K, V>(map: &mut HashMap<K, V>, key: K, value: V) -> bool
where
    K: std::hash::Hash + Eq,
{
    if map.contains_key(&key) {
        return false;
    }
    map.insert(key, value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(doc: &mut Document, n: usize) -> Vec<NodeId> {
        (0..n).map(|_| doc.create_element("div")).collect()
    }

    #[test]
    fn register_is_idempotent() {
        let mut doc = Document::new();
        let n = ids(&mut doc, 1)[0];
        let mut reg = BindingRegistry::new();
        assert!(reg.register("count", Binding::new(n, BindingKind::Text)));
        assert!(!reg.register("count", Binding::new(n, BindingKind::Text)));
        assert!(reg.register("count", Binding::new(n, BindingKind::Attribute("title".into()))));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn first_capture_wins() {
        let mut doc = Document::new();
        let n = ids(&mut doc, 1)[0];
        let mut reg = BindingRegistry::new();
        assert!(reg.capture_text(n, "Hi {name}"));
        assert!(!reg.capture_text(n, "Hi Ada"));
        assert_eq!(reg.text_template(n), Some("Hi {name}"));

        assert!(reg.capture_attr(n, "Title", "{t}"));
        assert!(!reg.capture_attr(n, "title", "x"));
        assert_eq!(reg.attr_template(n, "TITLE"), Some("{t}"));
    }

    #[test]
    fn forget_drops_everything_for_node() {
        let mut doc = Document::new();
        let n = ids(&mut doc, 2);
        let mut reg = BindingRegistry::new();
        reg.register("a", Binding::new(n[0], BindingKind::If));
        reg.register("a", Binding::new(n[1], BindingKind::Text));
        reg.capture_if(n[0], "<div rs-if=\"a\"></div>");
        reg.capture_text(n[1], "{a}");

        assert_eq!(reg.forget(&[n[0]]), 1);
        assert_eq!(reg.bindings_for("a"), vec![Binding::new(n[1], BindingKind::Text)]);
        assert!(reg.if_template(n[0]).is_none());
        assert!(reg.if_nodes().is_empty());
        assert_eq!(reg.captures(), 1);
    }

    #[test]
    fn prune_removes_dead_nodes() {
        let mut doc = Document::parse("<p>{a}</p><p>{b}</p>");
        let first = doc.children(doc.root())[0];
        let second = doc.children(doc.root())[1];
        let mut reg = BindingRegistry::new();
        reg.register("a", Binding::new(first, BindingKind::Text));
        reg.register("b", Binding::new(second, BindingKind::Text));
        reg.capture_text(first, "{a}");

        doc.remove(first);
        assert_eq!(reg.prune(&doc), 1);
        assert_eq!(reg.variables(), vec![Arc::from("b")]);
        assert_eq!(reg.captures(), 0);
    }

    #[test]
    fn kind_display() {
        assert_eq!(BindingKind::Attribute("class".into()).to_string(), "attr:class");
        assert_eq!(BindingKind::Generic("checked".into()).to_string(), "rs-checked");
        assert_eq!(BindingKind::For.to_string(), "for");
    }
}
