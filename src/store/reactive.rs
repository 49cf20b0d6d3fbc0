//! ReactiveStore - key/value state bound to a live document
//!
//! Writes go through [`ReactiveStore::set`]: dependency edges are recomputed
//! from the new value, the value is committed, every binding of the
//! variable and of its transitive dependents is re-rendered, and finally the
//! `change` listeners run.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::binding::{Binding, BindingKind, BindingRegistry};
use crate::config::EngineConfig;
use crate::constants::IF_ATTR;
use crate::dag::DependencyGraph;
use crate::dom::{Document, NodeId};
use crate::event::{ChangeEvent, EventKind, ListenerId, Listeners};
use crate::path;
use crate::template::{self, TemplateResolver};

/// Store plus the document it renders into
pub struct ReactiveStore {
    pub(crate) values: Map<String, Value>,
    pub(crate) doc: Document,
    pub(crate) registry: BindingRegistry,
    pub(crate) deps: DependencyGraph,
    pub(crate) listeners: Listeners,
    pub(crate) config: EngineConfig,
    pub(crate) resolver: TemplateResolver,
}

impl ReactiveStore {
    /// Bind `initial` to `doc` and run the startup scan
    pub fn new(doc: Document, initial: Map<String, Value>) -> Self {
        Self::with_config(doc, initial, EngineConfig::default())
    }

    pub fn with_config(doc: Document, initial: Map<String, Value>, config: EngineConfig) -> Self {
        let mut store = Self {
            values: initial,
            doc,
            registry: BindingRegistry::new(),
            deps: DependencyGraph::new(),
            listeners: Listeners::new(),
            config,
            resolver: TemplateResolver::new(),
        };

        // Initial values reference each other the same way later writes do
        let names: Vec<String> = store.values.keys().cloned().collect();
        for name in &names {
            if let Some(value) = store.values.get(name) {
                store.deps.track(name, value, &store.values, &store.resolver);
            }
        }

        store.scan();
        store
    }

    /// Parse `html` and bind it
    pub fn from_html(html: &str, initial: Map<String, Value>) -> Self {
        Self::new(Document::parse(html), initial)
    }

    // ═══════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════

    /// Current value of a variable; `None` reads as undefined
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Resolve a dotted/bracketed path against the store
    pub fn resolve(&self, path: &str) -> Option<Value> {
        path::resolve(&self.values, path)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable tree access for out-of-band changes
    ///
    /// Markup attached this way is not reactive until passed to `reparse`.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Current document markup
    pub fn render(&self) -> String {
        self.doc.to_html()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn dependencies(&self) -> &DependencyGraph {
        &self.deps
    }

    // ═══════════════════════════════════════════════════════════════
    // Writes
    // ═══════════════════════════════════════════════════════════════

    /// Write a variable and run the full update pipeline
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        self.deps.track(name, &value, &self.values, &self.resolver);
        let old = self.values.insert(name.to_string(), value.clone());
        debug!(name, kind = crate::value::type_name(Some(&value)), "store write");

        let mut visited = HashSet::new();
        self.propagate(name, &mut visited);

        let event = ChangeEvent {
            name: Arc::from(name),
            old,
            new: value,
        };
        self.listeners.emit(EventKind::Change, &event);
    }

    /// Mutate a variable in place (e.g. one field of an array item), then `set` it
    ///
    /// A missing variable starts out as `null`.
    pub fn update<F>(&mut self, name: &str, f: F)
    where
        F: FnOnce(&mut Value),
    {
        let mut value = self.values.get(name).cloned().unwrap_or(Value::Null);
        f(&mut value);
        self.set(name, value);
    }

    // ═══════════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════════

    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.listeners.on(kind, callback)
    }

    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners.off(kind, id)
    }

    /// Dispatch an event to listeners without writing the store
    pub fn emit(&mut self, kind: EventKind, event: &ChangeEvent) {
        self.listeners.emit(kind, event);
    }

    // ═══════════════════════════════════════════════════════════════
    // Propagation
    // ═══════════════════════════════════════════════════════════════

    /// Re-render everything bound to `name`, then its dependents
    pub(crate) fn propagate(&mut self, name: &str, visited: &mut HashSet<String>) {
        if !visited.insert(name.to_string()) {
            return;
        }

        self.follow_reference(name, visited);

        let mut bindings = self.registry.bindings_for(name);
        for node in self.registry.if_nodes() {
            let mentions = self
                .doc
                .attr(node, IF_ATTR)
                .is_some_and(|expr| contains_word(expr, name));
            let binding = Binding::new(node, BindingKind::If);
            if mentions && !bindings.contains(&binding) {
                bindings.push(binding);
            }
        }

        let mut dead = Vec::new();
        for binding in &bindings {
            if !self.doc.is_alive(binding.node) {
                dead.push(binding.node);
                continue;
            }
            trace!(var = name, node = %binding.node, kind = %binding.kind, "render binding");
            self.render_binding(binding);
        }
        if !dead.is_empty() {
            let dropped = self.registry.forget(&dead);
            debug!(var = name, dropped, "pruned bindings of detached nodes");
        }

        for dependent in self.deps.dependents_of(name) {
            if self.values.contains_key(dependent.as_ref()) {
                self.propagate(&dependent, visited);
            }
        }
    }

    /// A bare `{other}` value: record the edge and refresh one further hop
    fn follow_reference(&mut self, name: &str, visited: &mut HashSet<String>) {
        let Some(target) = self
            .values
            .get(name)
            .and_then(template::bare_reference)
            .map(|r| template::base_name(r).to_string())
        else {
            return;
        };
        if target == name || !self.values.contains_key(&target) {
            return;
        }
        self.deps.add_edge(&target, name);

        let next = self
            .values
            .get(&target)
            .and_then(template::bare_reference)
            .map(|r| template::base_name(r).to_string());
        if let Some(next) = next {
            if next != name && next != target && self.values.contains_key(&next) {
                let mut branch = visited.clone();
                self.propagate(&next, &mut branch);
            }
        }
    }

    pub(crate) fn render_binding(&mut self, binding: &Binding) {
        let node = binding.node;
        match &binding.kind {
            BindingKind::Text => self.render_text(node),
            BindingKind::Attribute(attr) => self.render_attr(node, attr),
            BindingKind::Generic(target) => self.render_generic(node, target),
            BindingKind::If => self.render_if(node),
            BindingKind::For => self.render_for(node),
            BindingKind::Html => self.render_html(node),
        }
    }

    /// Drop the registry entries of freed nodes
    pub(crate) fn forget(&mut self, freed: &[NodeId]) {
        if !freed.is_empty() {
            self.registry.forget(freed);
        }
    }

    /// Drop bindings and captures of every node no longer in the document
    pub fn prune(&mut self) -> usize {
        let dropped = self.registry.prune(&self.doc);
        debug!(dropped, "prune");
        dropped
    }
}

/// `word` occurs in `haystack` delimited by non-identifier characters
fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    haystack.match_indices(word).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + word.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

impl std::fmt::Debug for ReactiveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveStore")
            .field("values", &self.values.len())
            .field("bindings", &self.registry.len())
            .field("edges", &self.deps.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
