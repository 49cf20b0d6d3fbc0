//! Value semantics for store data
//!
//! Store values are `serde_json::Value`; `Option<&Value>` carries the
//! distinction between a missing value (`None`, "undefined") and an explicit
//! `null`. The helpers here give those values the display, truthiness and
//! comparison rules that templates are authored against.

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Display form of a value, as interpolated into text
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => display_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Display form with `undefined` for a missing value
pub fn display_opt(value: Option<&Value>) -> String {
    value.map(display).unwrap_or_else(|| "undefined".to_string())
}

fn display_number(n: &Number) -> String {
    if n.is_f64() {
        n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())
    } else {
        n.to_string()
    }
}

/// Format a float the way templates expect (`3.0` prints as `3`)
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Build a JSON number, preferring the integer representation
///
/// Returns `None` for NaN and infinities, which JSON cannot hold.
pub fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        return Some(Value::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number)
}

/// Parse a string the way `Number()` does; `None` means NaN
pub fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return Some(0.0);
    }
    match t {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
        }
    }
    // Rust accepts "inf" / "nan" spellings that must stay NaN here
    if !t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Numeric conversion; NaN when the value has no numeric reading
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s).unwrap_or(f64::NAN),
        Some(Value::Array(_)) => value
            .map(display)
            .and_then(|s| parse_number(&s))
            .unwrap_or(f64::NAN),
        Some(Value::Object(_)) => f64::NAN,
    }
}

/// Truthiness: undefined, null, false, 0, NaN and "" are falsy
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn is_nullish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// `===` semantics (structural for arrays and objects)
pub fn strict_equals(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// `==` semantics
pub fn loose_equals(a: Option<&Value>, b: Option<&Value>) -> bool {
    if is_nullish(a) || is_nullish(b) {
        return is_nullish(a) && is_nullish(b);
    }
    let (Some(x), Some(y)) = (a, b) else {
        return false;
    };
    match (x, y) {
        (Value::Bool(_), _) => loose_equals(number_value(to_number(a)).as_ref(), b),
        (_, Value::Bool(_)) => loose_equals(a, number_value(to_number(b)).as_ref()),
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            to_number(a) == to_number(b)
        }
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => x == y,
        (Value::Array(_) | Value::Object(_), _) => {
            loose_equals(Some(&Value::String(display(x))), b)
        }
        (_, Value::Array(_) | Value::Object(_)) => {
            loose_equals(a, Some(&Value::String(display(y))))
        }
        _ => strict_equals(a, b),
    }
}

/// Relational ordering used by `<`, `<=`, `>`, `>=`
///
/// Two strings compare lexicographically; anything else compares
/// numerically. `None` when either side is NaN.
pub fn relational(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    let prim = |v: Option<&Value>| -> Option<Value> {
        match v {
            Some(Value::Array(_)) | Some(Value::Object(_)) => v.map(|x| Value::String(display(x))),
            other => other.cloned(),
        }
    };
    let (pa, pb) = (prim(a), prim(b));
    if let (Some(Value::String(x)), Some(Value::String(y))) = (&pa, &pb) {
        return Some(x.as_str().cmp(y.as_str()));
    }
    let x = to_number(pa.as_ref());
    let y = to_number(pb.as_ref());
    x.partial_cmp(&y)
}

/// Short type name for log output
pub fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_forms() {
        assert_eq!(display(&json!(null)), "null");
        assert_eq!(display(&json!(true)), "true");
        assert_eq!(display(&json!(3)), "3");
        assert_eq!(display(&json!(3.0)), "3");
        assert_eq!(display(&json!(2.5)), "2.5");
        assert_eq!(display(&json!("hi")), "hi");
        assert_eq!(display(&json!([1, null, "a"])), "1,,a");
        assert_eq!(display(&json!({"a": 1})), "[object Object]");
        assert_eq!(display_opt(None), "undefined");
    }

    #[test]
    fn number_parsing() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  7 "), Some(7.0));
        assert_eq!(parse_number(""), Some(0.0));
        assert_eq!(parse_number("0x10"), Some(16.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("007"), Some(7.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("Infinity"), Some(f64::INFINITY));
    }

    #[test]
    fn number_values_prefer_integers() {
        assert_eq!(number_value(3.0), Some(json!(3)));
        assert_eq!(number_value(0.5), Some(json!(0.5)));
        assert_eq!(number_value(f64::NAN), None);
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
    }

    #[test]
    fn strict_equality_never_coerces() {
        assert!(strict_equals(Some(&json!(3)), Some(&json!(3.0))));
        assert!(!strict_equals(Some(&json!(3)), Some(&json!("3"))));
        assert!(!strict_equals(None, Some(&json!(null))));
        assert!(strict_equals(None, None));
    }

    #[test]
    fn loose_equality_coerces() {
        assert!(loose_equals(Some(&json!(3)), Some(&json!("3"))));
        assert!(loose_equals(None, Some(&json!(null))));
        assert!(!loose_equals(Some(&json!(0)), Some(&json!(null))));
        assert!(loose_equals(Some(&json!(true)), Some(&json!(1))));
        assert!(loose_equals(Some(&json!(true)), Some(&json!("1"))));
        assert!(!loose_equals(Some(&json!("a")), Some(&json!("b"))));
        assert!(loose_equals(Some(&json!([3])), Some(&json!(3))));
    }

    #[test]
    fn relational_ordering() {
        assert_eq!(relational(Some(&json!(2)), Some(&json!(10))), Some(Ordering::Less));
        assert_eq!(relational(Some(&json!("2")), Some(&json!("10"))), Some(Ordering::Greater));
        assert_eq!(relational(Some(&json!("2")), Some(&json!(10))), Some(Ordering::Less));
        assert_eq!(relational(Some(&json!("x")), Some(&json!(1))), None);
        assert_eq!(relational(None, Some(&json!(1))), None);
    }
}
