//! `rs-html`: a store string rendered as live markup

use serde_json::Value;
use tracing::trace;

use super::{interpolate, lookup_placeholder};
use crate::binding::{Binding, BindingKind};
use crate::constants::HTML_ATTR;
use crate::dom::NodeId;
use crate::sanitize::sanitize;
use crate::store::ReactiveStore;
use crate::template;

impl ReactiveStore {
    pub(crate) fn render_html(&mut self, node: NodeId) {
        let Some(var) = self.doc.attr(node, HTML_ATTR).map(|v| v.trim().to_string()) else {
            return;
        };
        let raw = match self.values.get(&var) {
            Some(Value::String(s)) => s.clone(),
            _ => {
                let freed = self.doc.clear_children(node);
                self.forget(&freed);
                return;
            }
        };

        // Placeholders present on first render subscribe the element; later
        // additions to the string are not picked up
        if self.registry.mark_html_tracked(node) {
            for token in template::tokenize(&raw).iter().filter_map(|t| match t {
                template::Token::Placeholder { path, .. } => Some(path.as_str()),
                template::Token::Literal(_) => None,
            }) {
                if template::is_loop_reserved(token, None) {
                    continue;
                }
                for dep in template::dependencies(token) {
                    self.registry.register(&dep, Binding::new(node, BindingKind::Html));
                }
            }
        }

        let sanitized = sanitize(&raw).into_owned();
        let values = &self.values;
        let rendered = interpolate(&self.resolver, &sanitized, self.config.max_passes, |token| {
            if template::is_loop_reserved(token, None) {
                None
            } else {
                lookup_placeholder(values, token)
            }
        });

        if rendered == self.doc.inner_html(node) {
            return;
        }
        trace!(node = %node, var = %var, "rs-html render");
        let freed = self.doc.set_inner_html(node, &rendered);
        self.forget(&freed);
        self.scan_nodes(node, false, true);
    }
}

#[cfg(test)]
mod tests {
    use crate::store::ReactiveStore;
    use serde_json::{json, Map, Value};

    fn store(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("store fixture must be an object"),
        }
    }

    #[test]
    fn structured_values_render_empty() {
        let store = ReactiveStore::from_html(
            r#"<div rs-html="body"></div>"#,
            store(json!({"body": "<b>{user}</b>{name}", "user": {"id": 1}, "name": "Ada"})),
        );
        assert_eq!(store.render(), r#"<div rs-html="body"><b></b>Ada</div>"#);
    }

    #[test]
    fn non_string_clears_content() {
        let mut store = ReactiveStore::from_html(
            r#"<div rs-html="body"></div>"#,
            store(json!({"body": "<i>x</i>"})),
        );
        assert_eq!(store.render(), r#"<div rs-html="body"><i>x</i></div>"#);
        store.set("body", 5);
        assert_eq!(store.render(), r#"<div rs-html="body"></div>"#);
    }

    #[test]
    fn placeholders_in_markup_are_reactive() {
        let mut store = ReactiveStore::from_html(
            r#"<div rs-html="body"></div>"#,
            store(json!({"body": "<p>{count}</p>", "count": 1})),
        );
        store.set("count", 2);
        assert_eq!(store.render(), r#"<div rs-html="body"><p>2</p></div>"#);
    }

    #[test]
    fn script_is_stripped() {
        let store = ReactiveStore::from_html(
            r#"<div rs-html="body"></div>"#,
            store(json!({"body": "<script>alert(1)</script><em>ok</em>"})),
        );
        assert_eq!(store.render(), r#"<div rs-html="body"><em>ok</em></div>"#);
    }
}
