//! Variable dependency graph (Arc<str> keyed)
//!
//! Edge `a -> b` means "b's current value references a", so a write to `a`
//! must also re-render everything bound to `b`.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::template::{self, TemplateResolver};

/// Reverse dependency edges between store variables
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// variable -> variables whose value references it
    dependents: HashMap<Arc<str>, BTreeSet<Arc<str>>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the edges of `name` from the value about to be written
    ///
    /// Every edge where `name` is the dependent is dropped first. Then, for
    /// each variable the value's placeholders read that exists in `store`,
    /// an edge to `name` is added. When that variable itself holds a bare
    /// `{other}` reference to a different existing variable, `other -> name`
    /// is added too (one hop of pre-resolution).
    pub fn track(
        &mut self,
        name: &str,
        value: &Value,
        store: &Map<String, Value>,
        resolver: &TemplateResolver,
    ) {
        self.remove_dependent(name);

        let Some(text) = value.as_str() else {
            return;
        };
        if !text.contains('{') {
            return;
        }

        for dep in resolver.dependencies(text) {
            let Some(dep_value) = store.get(&dep) else {
                continue;
            };
            if dep != name {
                self.add_edge(&dep, name);
            }
            if let Some(next) = template::bare_reference(dep_value) {
                let next = template::base_name(next);
                if next != dep && next != name && store.contains_key(next) {
                    self.add_edge(next, name);
                }
            }
        }
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.dependents
            .entry(Arc::from(from))
            .or_default()
            .insert(Arc::from(to));
    }

    /// Drop every edge where `name` is the dependent
    pub fn remove_dependent(&mut self, name: &str) {
        for dependents in self.dependents.values_mut() {
            dependents.remove(name);
        }
        self.dependents.retain(|_, d| !d.is_empty());
    }

    /// Direct dependents of `name`, sorted
    pub fn dependents_of(&self, name: &str) -> Vec<Arc<str>> {
        self.dependents
            .get(name)
            .map(|d| d.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Check if a write to `from` reaches `to` through dependents (BFS)
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(from);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            if let Some(neighbors) = self.dependents.get(current) {
                for neighbor in neighbors {
                    if neighbor.as_ref() == to {
                        return true;
                    }
                    if visited.insert(neighbor.as_ref()) {
                        queue.push_back(neighbor.as_ref());
                    }
                }
            }
        }

        false
    }

    /// All edges as `(from, to)`, sorted
    pub fn edges(&self) -> Vec<(Arc<str>, Arc<str>)> {
        let mut edges: Vec<_> = self
            .dependents
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (Arc::clone(from), Arc::clone(to))))
            .collect();
        edges.sort();
        edges
    }

    pub fn len(&self) -> usize {
        self.dependents.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}
