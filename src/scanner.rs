//! Tree scanner - discovers bindings and captures templates
//!
//! `scan` runs once at construction; `reparse` does the same for a subtree
//! attached later. Registration is idempotent: captures are write-once and
//! bindings are sets, so a second scan of the same markup finds nothing new.
//!
//! Passes, in order:
//! 1. text: `{token}` text registers its parent element
//! 2. attributes: interpolated values, generic `rs-*` collected for pass 6
//! 3. `rs-if`
//! 4. `rs-for`: inner markup captured, then cleared
//! 5. `rs-html`
//! 6. generic `rs-<attr>` expressions
//!
//! Every binding discovered by a scan is rendered once before it returns.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::binding::{Binding, BindingKind, ForTemplate};
use crate::constants::{DIRECTIVE_PREFIX, FOR_ATTR, FOR_CLONE_ATTR, HTML_ATTR, IF_ATTR};
use crate::directive::{self, condition_variables, parse_for};
use crate::dom::NodeId;
use crate::expr;
use crate::store::ReactiveStore;
use crate::template;

/// Elements whose text is never a template
const OPAQUE_TEXT_PARENTS: &[&str] = &["script", "style"];

impl ReactiveStore {
    /// Register every binding in the document
    pub fn scan(&mut self) {
        let root = self.doc.root();
        self.scan_nodes(root, false, true);
    }

    /// Register bindings below `node`, for markup attached after construction
    pub fn reparse(&mut self, node: NodeId) {
        self.scan_nodes(node, false, true);
    }

    /// Replace the content of `node` with `html` and make it reactive
    pub fn inject(&mut self, node: NodeId, html: &str) {
        if !self.doc.is_alive(node) {
            return;
        }
        let freed = self.doc.set_inner_html(node, html);
        self.forget(&freed);
        self.reparse(node);
    }

    pub(crate) fn scan_nodes(&mut self, root: NodeId, include_root: bool, with_text: bool) {
        if !self.doc.is_alive(root) {
            return;
        }
        let mut elements = Vec::new();
        if include_root && self.doc.is_element(root) {
            elements.push(root);
        }
        elements.extend(
            self.doc
                .descendants(root)
                .into_iter()
                .filter(|n| self.doc.is_element(*n)),
        );

        let mut fresh = BTreeSet::new();
        if with_text {
            self.scan_text(root, &mut fresh);
        }
        let generics = self.scan_attributes(&elements, &mut fresh);
        self.scan_conditions(&elements, &mut fresh);
        self.scan_lists(&elements, &mut fresh);
        self.scan_html(&elements, &mut fresh);
        self.scan_generics(generics, &mut fresh);

        debug!(root = %root, elements = elements.len(), fresh = fresh.len(), "scan");

        for binding in fresh {
            if self.doc.is_alive(binding.node) {
                self.render_binding(&binding);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Skip rules
    // ═══════════════════════════════════════════════════════════════

    /// Inside a list container or an `rs-html` location
    fn inside_directive(&self, node: NodeId) -> bool {
        self.doc
            .ancestors(node)
            .any(|a| self.doc.has_attr(a, FOR_ATTR) || self.doc.has_attr(a, HTML_ATTR))
    }

    fn inside_list(&self, node: NodeId) -> bool {
        self.doc.ancestors(node).any(|a| self.doc.has_attr(a, FOR_ATTR))
    }

    /// Template content of a list container not yet captured
    fn inside_list_template(&self, node: NodeId) -> bool {
        self.doc.ancestors(node).any(|a| {
            self.doc.has_attr(a, FOR_ATTR) && self.registry.for_template(a).is_none()
        })
    }

    // ═══════════════════════════════════════════════════════════════
    // Passes
    // ═══════════════════════════════════════════════════════════════

    fn scan_text(&mut self, root: NodeId, fresh: &mut BTreeSet<Binding>) {
        for text in self.doc.text_nodes(root) {
            if !self.doc.text(text).is_some_and(template::has_placeholder) {
                continue;
            }
            let Some(parent) = self.doc.parent(text) else {
                continue;
            };
            if self
                .doc
                .tag(parent)
                .is_some_and(|t| OPAQUE_TEXT_PARENTS.contains(&t))
            {
                continue;
            }
            if self.inside_directive(text) {
                continue;
            }
            // Already covered by an enclosing element's template
            if self
                .doc
                .ancestors(parent)
                .any(|a| self.registry.text_template(a).is_some())
            {
                continue;
            }

            let content = self.doc.inner_html(parent);
            let binding = Binding::new(parent, BindingKind::Text);
            if self.registry.capture_text(parent, &content) {
                fresh.insert(binding.clone());
            }
            let Some(captured) = self.registry.text_template(parent).map(str::to_string) else {
                continue;
            };
            for var in self.resolver.dependencies(&captured) {
                if self.registry.register(&var, binding.clone()) {
                    fresh.insert(binding.clone());
                }
            }
        }
    }

    /// Interpolated attributes; returns the generic directives found
    fn scan_attributes(
        &mut self,
        elements: &[NodeId],
        fresh: &mut BTreeSet<Binding>,
    ) -> Vec<(NodeId, String, String)> {
        let mut generics = Vec::new();
        for &el in elements {
            if !self.doc.is_alive(el) || self.inside_list(el) {
                continue;
            }
            for (name, value) in self.doc.attrs(el).to_vec() {
                if directive::is_generic(&name) {
                    generics.push((el, name, value));
                    continue;
                }
                if name.starts_with(DIRECTIVE_PREFIX) || name == FOR_CLONE_ATTR {
                    continue;
                }
                if !template::has_placeholder(&value) {
                    continue;
                }

                let binding = Binding::new(el, BindingKind::Attribute(name.clone()));
                if self.registry.capture_attr(el, &name, &value) {
                    fresh.insert(binding.clone());
                }
                let Some(captured) = self.registry.attr_template(el, &name).map(str::to_string)
                else {
                    continue;
                };
                for var in self.resolver.dependencies(&captured) {
                    if self.registry.register(&var, binding.clone()) {
                        fresh.insert(binding.clone());
                    }
                }
            }
        }
        generics
    }

    fn scan_conditions(&mut self, elements: &[NodeId], fresh: &mut BTreeSet<Binding>) {
        for &el in elements {
            if !self.doc.is_alive(el) || self.inside_list_template(el) {
                continue;
            }
            let Some(expression) = self.doc.attr(el, IF_ATTR).map(str::to_string) else {
                continue;
            };
            let binding = Binding::new(el, BindingKind::If);
            let outer = self.doc.outer_html(el);
            if self.registry.capture_if(el, &outer) {
                fresh.insert(binding.clone());
            }
            // Inside a list child, item and index come from the loop, not the store
            let loop_name = self.loop_name(el);
            for var in condition_variables(&expression) {
                if loop_name.is_some() && template::is_loop_reserved(&var, loop_name.as_deref()) {
                    continue;
                }
                if self.registry.register(&var, binding.clone()) {
                    fresh.insert(binding.clone());
                }
            }
        }
    }

    fn scan_lists(&mut self, elements: &[NodeId], fresh: &mut BTreeSet<Binding>) {
        for &el in elements {
            if !self.doc.is_alive(el) || self.inside_list_template(el) {
                continue;
            }
            let Some(expression) = self.doc.attr(el, FOR_ATTR).map(str::to_string) else {
                continue;
            };
            let binding = Binding::new(el, BindingKind::For);

            if self.registry.for_template(el).is_none() {
                let Some((item, path)) = parse_for(&expression) else {
                    warn!(node = %el, expression = %expression, "malformed rs-for, expected `<item> in <path>`");
                    continue;
                };
                let template = self.doc.inner_html(el);
                self.registry.capture_for(el, ForTemplate { item, path, template });
                let freed = self.doc.clear_children(el);
                self.forget(&freed);
                fresh.insert(binding.clone());
            }

            let Some(path) = self.registry.for_template(el).map(|t| t.path.clone()) else {
                continue;
            };
            for var in template::dependencies(&path) {
                if self.registry.register(&var, binding.clone()) {
                    fresh.insert(binding.clone());
                }
            }
        }
    }

    fn scan_html(&mut self, elements: &[NodeId], fresh: &mut BTreeSet<Binding>) {
        for &el in elements {
            if !self.doc.is_alive(el) || self.inside_list_template(el) {
                continue;
            }
            let Some(var) = self.doc.attr(el, HTML_ATTR).map(|v| v.trim().to_string()) else {
                continue;
            };
            if var.is_empty() {
                continue;
            }
            let binding = Binding::new(el, BindingKind::Html);
            if self.registry.register(&var, binding.clone()) {
                fresh.insert(binding);
            }
        }
    }

    /// Capture generic expressions so they re-evaluate on writes
    fn scan_generics(
        &mut self,
        generics: Vec<(NodeId, String, String)>,
        fresh: &mut BTreeSet<Binding>,
    ) {
        for (el, source, expression) in generics {
            if !self.doc.is_alive(el) {
                continue;
            }
            let target = source[DIRECTIVE_PREFIX.len()..].to_string();
            let binding = Binding::new(el, BindingKind::Generic(target));
            if self.registry.capture_attr(el, &source, &expression) {
                fresh.insert(binding.clone());
            }
            let Some(captured) = self.registry.attr_template(el, &source).map(str::to_string)
            else {
                continue;
            };
            if let Ok(parsed) = expr::parse(&captured) {
                for var in parsed.identifiers() {
                    if self.registry.register(var, binding.clone()) {
                        fresh.insert(binding.clone());
                    }
                }
            }
        }
    }
}
