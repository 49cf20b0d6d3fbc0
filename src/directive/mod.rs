//! Directive Module - rendering of bound locations
//!
//! Each submodule adds the renderer for one binding kind to
//! [`ReactiveStore`]:
//! - `attr`: text content, interpolated attributes and generic `rs-<attr>`
//! - `cond`: `rs-if` visibility classes
//! - `list`: `rs-for` index-keyed reconciliation
//! - `html`: `rs-html` markup injection
//!
//! Placeholders resolve against the store through [`lookup_placeholder`]
//! and every render is bounded by `EngineConfig::max_passes`.

mod attr;
mod cond;
mod html;
mod list;

pub use attr::{generic_outcome, GenericOutcome};
pub(crate) use attr::is_generic;
pub use cond::{condition_variables, evaluate_condition, evaluate_condition_in};
pub use list::parse_for;

use serde_json::{Map, Value};
use tracing::warn;

use crate::path;
use crate::sanitize::sanitize;
use crate::store::ReactiveStore;
use crate::template::{self, TemplateResolver};
use crate::value::display;

/// Store value for a placeholder, ready to inline
///
/// - `None`: unresolved, the placeholder text stays
/// - objects and arrays render empty, never as serialized data
/// - scalars render in display form, sanitized
pub fn lookup_placeholder(values: &Map<String, Value>, token: &str) -> Option<String> {
    let value = path::resolve(values, token).or_else(|| values.get(token).cloned())?;
    Some(match value {
        Value::Array(_) | Value::Object(_) => String::new(),
        other => sanitize(&display(&other)).into_owned(),
    })
}

/// Substitute placeholders until the output is stable or the pass budget runs out
///
/// The first pass goes through the resolver cache; later passes only see
/// strings produced by substitution and are tokenized fresh.
pub fn interpolate<F>(
    resolver: &TemplateResolver,
    template: &str,
    max_passes: usize,
    mut lookup: F,
) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let tokens = resolver.tokenize(template);
    let mut out = template::render_tokens(template, &tokens, &mut lookup);
    if out == template {
        return out;
    }

    for _ in 1..max_passes {
        if !template::has_placeholder(&out) {
            return out;
        }
        let next = template::render(&out, &mut lookup);
        if next == out {
            return out;
        }
        out = next;
    }

    if template::has_placeholder(&out) {
        warn!(max_passes, "substitution pass limit reached, leaving remaining placeholders");
    }
    out
}

impl ReactiveStore {
    /// Render a template against the store with the configured pass budget
    pub(crate) fn interpolate_store(&self, template: &str) -> String {
        let values = &self.values;
        interpolate(&self.resolver, template, self.config.max_passes, |token| {
            lookup_placeholder(values, token)
        })
    }
}
