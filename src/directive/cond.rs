//! `rs-if`: comparison conditions toggling visibility classes

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::constants::IF_ATTR;
use crate::dom::NodeId;
use crate::expr::{self, Frame};
use crate::path;
use crate::store::ReactiveStore;
use crate::template;
use crate::value::{
    display, is_truthy, loose_equals, number_value, parse_number, relational, strict_equals,
};

/// `<left> <op> <right>`; longest operators first so `===` never reads as `==`
static COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^=!<>]+?)\s*(===|!==|==|!=|<=|>=|<|>)\s*(.*?)\s*$").unwrap()
});

/// Plain path: identifiers, dots and brackets only
static PLAIN_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[A-Za-z_$][\w$]*(?:\.[\w$]+|\[[^\]]+\])*$"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    StrictEq,
    StrictNe,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "===" => CompareOp::StrictEq,
            "!==" => CompareOp::StrictNe,
            "==" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            ">" => CompareOp::Gt,
            "<=" => CompareOp::Le,
            ">=" => CompareOp::Ge,
            _ => return None,
        })
    }

    fn is_strict(self) -> bool {
        matches!(self, CompareOp::StrictEq | CompareOp::StrictNe)
    }
}

/// Right-hand operand and whether it was written as a quoted literal
///
/// `null` and `undefined` are read as literals, not as the strings "null" and "undefined".
fn right_operand(raw: &str, frame: &Frame<'_>) -> (Option<Value>, bool) {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return (Some(Value::String(raw[1..raw.len() - 1].to_string())), true);
        }
    }
    match raw {
        "true" => return (Some(Value::Bool(true)), false),
        "false" => return (Some(Value::Bool(false)), false),
        "null" => return (Some(Value::Null), false),
        "undefined" => return (None, false),
        _ => {}
    }
    if let Some(v) = parse_number(raw).and_then(number_value) {
        return (Some(v), false);
    }
    match lookup(frame, raw) {
        Some(v) => (Some(v), false),
        None => (Some(Value::String(raw.to_string())), false),
    }
}

/// Resolve against loop locals first, then as a store path, then as a plain key
fn lookup(frame: &Frame<'_>, token: &str) -> Option<Value> {
    let token = token.trim();
    let base = template::base_name(token);
    if let Some(local) = frame.local(base) {
        let rest = &token[base.len()..];
        let rest = rest.strip_prefix('.').unwrap_or(rest);
        if rest.is_empty() {
            return Some(local.clone());
        }
        return path::resolve_on(local, frame.globals(), rest);
    }
    let values = frame.globals();
    path::resolve(values, token).or_else(|| values.get(token).cloned())
}

/// Numeric form of a value, kept only when it prints back to the same text
///
/// `"007"` stays a string; `"7"` becomes `7`.
fn coerce(value: Option<Value>) -> Option<Value> {
    let Some(original) = value else {
        return None;
    };
    if original.is_null() || original.is_number() {
        return Some(original);
    }
    let text = display(&original);
    let coerced = parse_number(&text)
        .filter(|_| !text.trim().is_empty())
        .and_then(number_value);
    match coerced {
        Some(num) if display(&num) == text => Some(num),
        _ => Some(original),
    }
}

/// Evaluate an `rs-if` expression against the store
pub fn evaluate_condition(expression: &str, values: &Map<String, Value>) -> bool {
    evaluate_condition_in(expression, &Frame::new(values))
}

/// Evaluate an `rs-if` expression with loop locals shadowing the store
pub fn evaluate_condition_in(expression: &str, frame: &Frame<'_>) -> bool {
    let Some(caps) = COMPARISON.captures(expression) else {
        return bare_condition(expression, frame);
    };
    let (Some(left), Some(op), Some(right)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return bare_condition(expression, frame);
    };
    let Some(op) = CompareOp::parse(op.as_str()) else {
        return bare_condition(expression, frame);
    };

    let mut l = lookup(frame, left.as_str());
    let (mut r, quoted) = right_operand(right.as_str(), frame);

    if !op.is_strict() && !quoted {
        l = coerce(l);
        r = coerce(r);
    }

    if matches!(l, None | Some(Value::Null)) {
        return match op {
            CompareOp::StrictEq => strict_equals(l.as_ref(), r.as_ref()),
            CompareOp::StrictNe => !strict_equals(l.as_ref(), r.as_ref()),
            CompareOp::Eq => loose_equals(l.as_ref(), r.as_ref()),
            CompareOp::Ne => !loose_equals(l.as_ref(), r.as_ref()),
            _ => false,
        };
    }

    let (l, r) = (l.as_ref(), r.as_ref());
    match op {
        CompareOp::StrictEq => strict_equals(l, r),
        CompareOp::StrictNe => !strict_equals(l, r),
        CompareOp::Eq => loose_equals(l, r),
        CompareOp::Ne => !loose_equals(l, r),
        CompareOp::Lt => relational(l, r).is_some_and(|o| o.is_lt()),
        CompareOp::Gt => relational(l, r).is_some_and(|o| o.is_gt()),
        CompareOp::Le => relational(l, r).is_some_and(|o| o.is_le()),
        CompareOp::Ge => relational(l, r).is_some_and(|o| o.is_ge()),
    }
}

/// Truthiness of a path, or of a full expression when it is not a plain path
fn bare_condition(expression: &str, frame: &Frame<'_>) -> bool {
    let expression = expression.trim();
    if expression.is_empty() {
        return false;
    }
    if PLAIN_PATH.is_match(expression) {
        return is_truthy(lookup(frame, expression).as_ref());
    }
    match expr::evaluate(expression, frame) {
        Ok(value) => is_truthy(value.as_ref()),
        Err(e) => {
            warn!(expression, error = %e, "rs-if expression failed, treating as false");
            false
        }
    }
}

/// Store variables an `rs-if` expression reads
pub fn condition_variables(expression: &str) -> Vec<String> {
    let mut vars = Vec::new();
    let mut push = |token: &str| {
        for var in template::dependencies(token) {
            if !vars.contains(&var) {
                vars.push(var);
            }
        }
    };

    if let Some(caps) = COMPARISON.captures(expression) {
        if let Some(left) = caps.get(1) {
            push(left.as_str().trim());
        }
        if let Some(right) = caps.get(3) {
            let right = right.as_str().trim();
            let literal = right.starts_with(['"', '\''])
                || matches!(right, "true" | "false" | "null" | "undefined")
                || parse_number(right).is_some();
            if !literal && PLAIN_PATH.is_match(right) {
                push(right);
            }
        }
        return vars;
    }

    let expression = expression.trim();
    if PLAIN_PATH.is_match(expression) {
        push(expression);
    } else if let Ok(parsed) = expr::parse(expression) {
        for ident in parsed.identifiers() {
            push(ident);
        }
    }
    vars
}

impl ReactiveStore {
    /// Toggle the show/hide classes from the element's current `rs-if`
    pub(crate) fn render_if(&mut self, node: NodeId) {
        let Some(expression) = self.doc.attr(node, IF_ATTR).map(str::to_string) else {
            return;
        };
        let visible = match self.loop_locals(node) {
            Some(locals) => evaluate_condition_in(&expression, &locals.frame(&self.values)),
            None => evaluate_condition(&expression, &self.values),
        };
        trace!(node = %node, expression = %expression, visible, "rs-if");

        let (show, hide) = (self.config.show_class.clone(), self.config.hide_class.clone());
        self.doc.toggle_class(node, &show, visible);
        self.doc.toggle_class(node, &hide, !visible);
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
    fn strict_equality_does_not_coerce() {
        let values = store(json!({"count": 3, "label": "3"}));
        assert!(evaluate_condition("count === 3", &values));
        assert!(!evaluate_condition("label === 3", &values));
        assert!(evaluate_condition("label !== 3", &values));
    }

    #[test]
    fn loose_equality_coerces_numbers() {
        let values = store(json!({"count": 3, "label": "3"}));
        assert!(evaluate_condition("count == \"3\"", &values));
        assert!(evaluate_condition("label == 3", &values));
        assert!(evaluate_condition("count != 4", &values));
    }

    #[test]
    fn coercion_keeps_leading_zero_strings() {
        let values = store(json!({"code": "007"}));
        assert!(evaluate_condition("code == '007'", &values));
        assert!(!evaluate_condition("code === 7", &values));
        assert_eq!(coerce(Some(json!("007"))), Some(json!("007")));
        assert_eq!(coerce(Some(json!("7"))), Some(json!(7)));
    }

    #[test]
    fn relational_and_paths() {
        let values = store(json!({"todos": [1, 2, 3], "limit": 2}));
        assert!(evaluate_condition("todos.length > 2", &values));
        assert!(evaluate_condition("todos.length >= limit", &values));
        assert!(!evaluate_condition("todos.length < limit", &values));
    }

    #[test]
    fn null_left_side() {
        let values = store(json!({"user": null}));
        assert!(evaluate_condition("user == null", &values));
        assert!(evaluate_condition("missing === undefined", &values));
        assert!(!evaluate_condition("missing > 0", &values));
        assert!(!evaluate_condition("missing.x == 0", &values));
    }

    #[test]
    fn bare_truthiness() {
        let values = store(json!({"open": true, "empty": "", "user": {"name": "Ada"}}));
        assert!(evaluate_condition("open", &values));
        assert!(!evaluate_condition("empty", &values));
        assert!(evaluate_condition("user.name", &values));
        assert!(!evaluate_condition("!open", &values));
        assert!(evaluate_condition("open && user", &values));
        assert!(!evaluate_condition("missing", &values));
    }

    #[test]
    fn loop_locals_shadow_the_store() {
        let values = store(json!({"t": false, "limit": 2}));
        let frame = Frame::new(&values)
            .with_local("t", json!({"done": true, "n": 3, "tags": ["x"]}))
            .with_local("index", json!(1));
        assert!(evaluate_condition_in("t.done", &frame));
        assert!(evaluate_condition_in("t.n >= limit", &frame));
        assert!(evaluate_condition_in("t.tags[0] === 'x'", &frame));
        assert!(evaluate_condition_in("index === 1", &frame));
        assert!(!evaluate_condition_in("t.missing", &frame));
        assert!(!evaluate_condition("t.done", &values));
    }

    #[test]
    fn variables_of_conditions() {
        assert_eq!(condition_variables("count === 3"), vec!["count"]);
        assert_eq!(condition_variables("todos.length >= limit"), vec!["todos", "limit"]);
        assert_eq!(condition_variables("page[active] == 'x'"), vec!["page", "active"]);
        assert_eq!(condition_variables("open && !closed"), vec!["open", "closed"]);
    }
}
