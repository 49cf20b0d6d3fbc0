//! `rs-for`: index-keyed list reconciliation

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::attr::apply_generics;
use super::lookup_placeholder;
use crate::binding::ForTemplate;
use crate::constants::{
    FOR_CLONE_ATTR, FOR_INDEX_ATTR, INDEX_VAR, ITEM_VAR, NEWLY_ADDED_ATTR,
};
use crate::dom::{Document, NodeData, NodeId};
use crate::expr::Frame;
use crate::path;
use crate::sanitize::sanitize;
use crate::store::ReactiveStore;
use crate::template::{self, TemplateResolver};
use crate::value::display;

static FOR_EXPR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)\s+in\s+([\w$.\[\]]+)\s*$").unwrap());

/// Split `t in todos` into item name and array path
pub fn parse_for(expression: &str) -> Option<(String, String)> {
    let caps = FOR_EXPR.captures(expression)?;
    Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

/// One array element as seen by the item template
struct ItemScope<'a> {
    name: &'a str,
    item: &'a Value,
    index: usize,
    display_field: &'a str,
}

impl ItemScope<'_> {
    /// Relative path after the item name (`title` for `t.title`), or `""` for the item itself
    fn relative<'t>(&self, token: &'t str) -> Option<&'t str> {
        [self.name, ITEM_VAR].into_iter().find_map(|name| {
            let rest = token.strip_prefix(name)?;
            if rest.is_empty() {
                Some(rest)
            } else if let Some(field) = rest.strip_prefix('.') {
                Some(field)
            } else if rest.starts_with('[') {
                Some(rest)
            } else {
                None
            }
        })
    }

    fn lookup(&self, token: &str, values: &Map<String, Value>) -> Option<String> {
        if token == INDEX_VAR {
            return Some(self.index.to_string());
        }
        let Some(rest) = self.relative(token) else {
            return lookup_placeholder(values, token);
        };

        if rest.is_empty() {
            let shown = match self.item {
                Value::Object(map) => map
                    .get(self.display_field)
                    .filter(|v| !v.is_null())
                    .map(display)
                    .unwrap_or_default(),
                Value::Null => String::new(),
                other => display(other),
            };
            return Some(sanitize(&shown).into_owned());
        }

        let field = path::resolve_on(self.item, values, rest);
        let shown = match field {
            None if rest == INDEX_VAR => self.index.to_string(),
            None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => {
                String::new()
            }
            Some(v) => display(&v),
        };
        Some(sanitize(&shown).into_owned())
    }
}

/// Markup for one array element
///
/// Item and index placeholders are filled from the element; everything else
/// resolves against the store. Loop-owned tokens introduced by substituted
/// store values are never filled in later passes.
fn render_item(
    resolver: &TemplateResolver,
    template: &str,
    scope: &ItemScope<'_>,
    values: &Map<String, Value>,
    max_passes: usize,
) -> String {
    let tokens = resolver.tokenize(template);
    let mut out = template::render_tokens(template, &tokens, |token| scope.lookup(token, values));

    for _ in 1..max_passes {
        if !template::has_placeholder(&out) {
            break;
        }
        let next = template::render(&out, |token| {
            if template::is_loop_reserved(token, Some(scope.name)) {
                None
            } else {
                lookup_placeholder(values, token)
            }
        });
        if next == out {
            break;
        }
        out = next;
    }
    out
}

/// Parse item markup into top-level nodes, dropping whitespace-only text
///
/// Markup without any element is wrapped in a `<span>` so every rendered
/// item can carry the index and ownership tags.
fn build_nodes(doc: &mut Document, html: &str) -> Vec<NodeId> {
    let container = doc.parse_fragment(html);
    let mut nodes: Vec<NodeId> = doc
        .children(container)
        .iter()
        .copied()
        .filter(|n| !matches!(doc.data(*n), Some(NodeData::Text(t)) if t.trim().is_empty()))
        .collect();

    if !nodes.is_empty() && !nodes.iter().any(|n| doc.is_element(*n)) {
        let span = doc.create_element("span");
        for node in &nodes {
            doc.append_child(span, *node);
        }
        nodes = vec![span];
    }

    for node in &nodes {
        doc.detach(*node);
    }
    doc.remove(container);
    nodes
}

fn rendered_index(doc: &Document, node: NodeId) -> Option<usize> {
    doc.attr(node, FOR_INDEX_ATTR)?.trim().parse().ok()
}

/// Item and index of the list child a node was rendered in
pub(crate) struct LoopLocals {
    pub(crate) name: String,
    pub(crate) item: Value,
    pub(crate) index: usize,
}

impl LoopLocals {
    /// Store frame with `item`, the declared item name and `index` bound
    pub(crate) fn frame<'a>(&self, values: &'a Map<String, Value>) -> Frame<'a> {
        Frame::new(values)
            .with_local(ITEM_VAR, self.item.clone())
            .with_local(self.name.as_str(), self.item.clone())
            .with_local(INDEX_VAR, Value::from(self.index))
    }
}

impl ReactiveStore {
    /// Closest rendered list child holding `node`, with its container
    fn list_child(&self, node: NodeId) -> Option<(NodeId, NodeId)> {
        let child = if self.doc.has_attr(node, FOR_CLONE_ATTR) {
            node
        } else {
            self.doc.closest_with_attr(node, FOR_CLONE_ATTR)?
        };
        Some((child, self.doc.parent(child)?))
    }

    /// Item name declared by the list that rendered `node`
    pub(crate) fn loop_name(&self, node: NodeId) -> Option<String> {
        let (_, container) = self.list_child(node)?;
        self.registry.for_template(container).map(|t| t.item.clone())
    }

    /// Current item and index for a node inside a rendered list child
    pub(crate) fn loop_locals(&self, node: NodeId) -> Option<LoopLocals> {
        let (child, container) = self.list_child(node)?;
        let state = self.registry.for_template(container)?;
        let index = rendered_index(&self.doc, child)?;
        let item = match path::resolve(&self.values, &state.path)? {
            Value::Array(items) => items.into_iter().nth(index)?,
            _ => return None,
        };
        Some(LoopLocals {
            name: state.item.clone(),
            item,
            index,
        })
    }
}

impl ReactiveStore {
    /// Reconcile a list container against its array, index by index
    pub(crate) fn render_for(&mut self, node: NodeId) {
        let Some(state) = self.registry.for_template(node).cloned() else {
            return;
        };
        let ForTemplate { item: name, path: array_path, template } = state;

        let items = match path::resolve(&self.values, &array_path) {
            Some(Value::Array(items)) => items,
            _ => {
                debug!(node = %node, path = %array_path, "rs-for target is not an array");
                return;
            }
        };

        // 1. Drop children without a matching slot
        let mut freed = Vec::new();
        for child in self.doc.children(node).to_vec() {
            let keep = rendered_index(&self.doc, child).is_some_and(|i| i < items.len());
            if !keep {
                freed.extend(self.doc.remove(child));
            }
        }
        self.forget(&freed);

        // 2. Replace or append each index
        let mut fresh: Vec<NodeId> = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let scope = ItemScope {
                name: &name,
                item,
                index,
                display_field: &self.config.display_field,
            };
            let html = render_item(
                &self.resolver,
                &template,
                &scope,
                &self.values,
                self.config.max_passes,
            );

            let existing: Vec<NodeId> = self
                .doc
                .children(node)
                .iter()
                .copied()
                .filter(|c| rendered_index(&self.doc, *c) == Some(index))
                .collect();

            let nodes = build_nodes(&mut self.doc, &html);
            let newly_added = if existing.is_empty() { "yes" } else { "no" };
            let locals = LoopLocals {
                name: name.clone(),
                item: item.clone(),
                index,
            };
            let frame = locals.frame(&self.values);
            for new in &nodes {
                if self.doc.is_element(*new) {
                    self.doc.set_attr(*new, FOR_CLONE_ATTR, &array_path);
                    self.doc.set_attr(*new, FOR_INDEX_ATTR, &index.to_string());
                    self.doc.set_attr(*new, NEWLY_ADDED_ATTR, newly_added);
                    apply_generics(&mut self.doc, *new, &frame);
                    for descendant in self.doc.descendants(*new) {
                        apply_generics(&mut self.doc, descendant, &frame);
                    }
                }
            }

            match existing.split_first() {
                Some((first, rest)) if !nodes.is_empty() => {
                    let mut anchor = nodes[0];
                    let mut freed = self.doc.replace_child(*first, anchor);
                    for new in &nodes[1..] {
                        self.doc.insert_after(anchor, *new);
                        anchor = *new;
                    }
                    for old in rest {
                        freed.extend(self.doc.remove(*old));
                    }
                    self.forget(&freed);
                }
                // Empty markup: the old child goes without a replacement
                Some(_) => {
                    let mut freed = Vec::new();
                    for old in &existing {
                        freed.extend(self.doc.remove(*old));
                    }
                    self.forget(&freed);
                }
                None => {
                    for new in &nodes {
                        self.doc.append_child(node, *new);
                    }
                }
            }
            fresh.extend(nodes);
        }

        debug!(node = %node, path = %array_path, items = items.len(), "rs-for reconciled");

        // Nested directives in the new children
        for child in fresh {
            if self.doc.is_alive(child) && self.doc.is_element(child) {
                self.scan_nodes(child, true, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("store fixture must be an object"),
        }
    }

    #[test]
    fn parse_for_expression() {
        assert_eq!(parse_for("t in todos"), Some(("t".into(), "todos".into())));
        assert_eq!(
            parse_for(" row in data.rows "),
            Some(("row".into(), "data.rows".into()))
        );
        assert_eq!(parse_for("todos"), None);
        assert_eq!(parse_for("t of todos"), None);
    }

    #[test]
    fn item_tokens() {
        let values = store(json!({"suffix": "!"}));
        let item = json!({"title": "a", "checked": null});
        let scope = ItemScope {
            name: "t",
            item: &item,
            index: 1,
            display_field: "title",
        };
        let resolver = TemplateResolver::new();
        let html = render_item(
            &resolver,
            "<li>{t.title}{suffix} {index} {item} {t.checked} {t.index} {t}</li>",
            &scope,
            &values,
            10,
        );
        assert_eq!(html, "<li>a! 1 a  1 a</li>");
    }

    #[test]
    fn primitive_items() {
        let values = Map::new();
        let item = json!(7);
        let scope = ItemScope {
            name: "n",
            item: &item,
            index: 0,
            display_field: "title",
        };
        let resolver = TemplateResolver::new();
        assert_eq!(render_item(&resolver, "{n}/{item}", &scope, &values, 10), "7/7");
    }

    #[test]
    fn store_values_cannot_inject_loop_tokens() {
        let values = store(json!({"evil": "{index}"}));
        let item = json!("x");
        let scope = ItemScope {
            name: "v",
            item: &item,
            index: 3,
            display_field: "title",
        };
        let resolver = TemplateResolver::new();
        assert_eq!(render_item(&resolver, "{evil}", &scope, &values, 10), "{index}");
    }

    #[test]
    fn text_only_markup_is_wrapped() {
        let mut doc = Document::new();
        let nodes = build_nodes(&mut doc, "  hello  ");
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.tag(nodes[0]), Some("span"));
        assert_eq!(doc.parent(nodes[0]), None);

        let nodes = build_nodes(&mut doc, "\n  <li>a</li>\n");
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.tag(nodes[0]), Some("li"));
    }
}
