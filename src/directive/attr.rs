//! Text content, interpolated attributes and generic `rs-<attr>` bindings

use serde_json::Value;
use tracing::{trace, warn};

use crate::constants::{DIRECTIVE_PREFIX, IF_ATTR, RESERVED_DIRECTIVES};
use crate::dom::{Document, NodeId};
use crate::expr::{self, Frame};
use crate::sanitize::sanitize;
use crate::store::ReactiveStore;
use crate::value::display;

/// What a generic `rs-<attr>` result does to its target attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericOutcome {
    Set(String),
    Remove,
}

/// Map an expression result onto the target attribute
///
/// `true` and the boolean attribute names set the attribute to its own
/// name; `false`, `""`, `null` and undefined remove it.
pub fn generic_outcome(target: &str, result: Option<&Value>) -> GenericOutcome {
    match result {
        None | Some(Value::Null) | Some(Value::Bool(false)) => GenericOutcome::Remove,
        Some(Value::Bool(true)) => GenericOutcome::Set(target.to_string()),
        Some(Value::String(s)) if s.is_empty() => GenericOutcome::Remove,
        Some(Value::String(s)) if matches!(s.as_str(), "checked" | "disabled" | "selected") => {
            GenericOutcome::Set(target.to_string())
        }
        Some(other) => GenericOutcome::Set(sanitize(&display(other)).into_owned()),
    }
}

/// Attribute names of the generic `rs-*` directives on an element
pub(crate) fn generic_attrs(doc: &Document, node: NodeId) -> Vec<(String, String)> {
    doc.attrs(node)
        .iter()
        .filter(|(name, _)| is_generic(name))
        .cloned()
        .collect()
}

pub(crate) fn is_generic(name: &str) -> bool {
    name.len() > DIRECTIVE_PREFIX.len()
        && name.starts_with(DIRECTIVE_PREFIX)
        && !RESERVED_DIRECTIVES.contains(&name)
}

/// Evaluate one generic expression; failures degrade to `""`
pub(crate) fn evaluate_generic(expression: &str, frame: &Frame<'_>) -> Option<Value> {
    match expr::evaluate(expression, frame) {
        Ok(value) => value,
        Err(e) => {
            warn!(expression, error = %e, "rs-* expression failed, using empty string");
            Some(Value::String(String::new()))
        }
    }
}

/// Evaluate, apply and strip every generic directive on `node`
pub(crate) fn apply_generics(doc: &mut Document, node: NodeId, frame: &Frame<'_>) {
    for (source, expression) in generic_attrs(doc, node) {
        let target = &source[DIRECTIVE_PREFIX.len()..];
        let result = evaluate_generic(&expression, frame);
        apply_outcome(doc, node, target, generic_outcome(target, result.as_ref()));
        doc.remove_attr(node, &source);
    }
}

fn apply_outcome(doc: &mut Document, node: NodeId, target: &str, outcome: GenericOutcome) {
    match outcome {
        GenericOutcome::Set(value) => doc.set_attr(node, target, &value),
        GenericOutcome::Remove => {
            doc.remove_attr(node, target);
        }
    }
}

impl ReactiveStore {
    /// Re-render an element's content from its captured template
    pub(crate) fn render_text(&mut self, node: NodeId) {
        let Some(template) = self.registry.text_template(node).map(str::to_string) else {
            return;
        };
        let rendered = self.interpolate_store(&template);
        if rendered == self.doc.inner_html(node) {
            return;
        }
        trace!(node = %node, "text render");
        let freed = self.doc.set_inner_html(node, &rendered);
        self.forget(&freed);
        // Directives and attributes in the new content; its text belongs to `node`
        self.scan_nodes(node, false, false);
    }

    pub(crate) fn render_attr(&mut self, node: NodeId, attr: &str) {
        let Some(template) = self.registry.attr_template(node, attr).map(str::to_string) else {
            return;
        };
        let rendered = self.interpolate_store(&template);
        if self.doc.attr(node, attr) != Some(rendered.as_str()) {
            trace!(node = %node, attr, "attribute render");
            self.doc.set_attr(node, attr, &rendered);
        }
        if attr.eq_ignore_ascii_case("class") && self.doc.has_attr(node, IF_ATTR) {
            self.render_if(node);
        }
    }

    /// Re-evaluate a captured `rs-<target>` expression against the store
    pub(crate) fn render_generic(&mut self, node: NodeId, target: &str) {
        let source = format!("{}{}", DIRECTIVE_PREFIX, target);
        let Some(expression) = self.registry.attr_template(node, &source).map(str::to_string)
        else {
            return;
        };
        let frame = Frame::new(&self.values);
        let result = evaluate_generic(&expression, &frame);
        let outcome = generic_outcome(target, result.as_ref());
        trace!(node = %node, target, ?outcome, "generic render");
        apply_outcome(&mut self.doc, node, target, outcome);
        self.doc.remove_attr(node, &source);
    }
}
