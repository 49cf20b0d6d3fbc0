//! Path resolution against the store
//!
//! Supports:
//! - `a.b.c` (dot notation)
//! - `a[0].b` and `a.0.b` (array index)
//! - `a[key]` (index taken from the store variable `key`)
//! - `a["b"]` (quoted key)
//! - `.length` on arrays and strings
//!
//! Parsing never fails: whatever cannot be read as identifier or bracket is
//! kept as one trailing property name. Resolution returns `None` as soon as
//! an intermediate value is missing or null.

use serde_json::{Map, Value};

use crate::value::display;

/// A parsed path segment
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Property access: `.field`
    Field(String),
    /// Array index access: `[0]`
    Index(usize),
    /// Index read from a store variable: `[name]`
    Var(String),
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Length in bytes of the identifier at the start of `s`
fn ident_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if is_ident_start(c) => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !is_ident_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Parse one `[...]` group at the start of `s`, returning the segment and bytes consumed
fn parse_bracket(s: &str) -> Option<(Segment, usize)> {
    let rest = s.strip_prefix('[')?;
    let close = rest.find(']')?;
    let inner = rest[..close].trim();
    let consumed = close + 2;

    if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
        return inner.parse().ok().map(|i| (Segment::Index(i), consumed));
    }
    for quote in ['"', '\''] {
        if inner.len() >= 2 && inner.starts_with(quote) && inner.ends_with(quote) {
            return Some((Segment::Field(inner[1..inner.len() - 1].to_string()), consumed));
        }
    }
    if !inner.is_empty() && ident_len(inner) == inner.len() {
        return Some((Segment::Var(inner.to_string()), consumed));
    }
    None
}

/// Parse a path into segments
///
/// Examples:
/// - `"todos[0].checked"` → `[Field("todos"), Index(0), Field("checked")]`
/// - `"pageTitle[activePage]"` → `[Field("pageTitle"), Var("activePage")]`
pub fn parse(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut remaining = path;

    while !remaining.is_empty() {
        let mut consumed = 0;

        let len = ident_len(remaining);
        if len > 0 {
            segments.push(Segment::Field(remaining[..len].to_string()));
            consumed = len;
        }

        while let Some((segment, used)) = parse_bracket(&remaining[consumed..]) {
            segments.push(segment);
            consumed += used;
        }

        if consumed == 0 {
            // Bare property name with no leading separator (e.g. "0" in "todos.0")
            segments.push(Segment::Field(remaining.to_string()));
            break;
        }

        remaining = &remaining[consumed..];
        remaining = remaining.strip_prefix('.').unwrap_or(remaining);
    }

    segments
}

/// Store variables a path reads: its base name plus any bracketed index variables
pub fn variables(segments: &[Segment]) -> Vec<&str> {
    let mut vars = Vec::new();
    if let Some(Segment::Field(base)) = segments.first() {
        vars.push(base.as_str());
    }
    for segment in segments {
        if let Segment::Var(name) = segment {
            if !vars.contains(&name.as_str()) {
                vars.push(name.as_str());
            }
        }
    }
    vars
}

enum Step<'a> {
    Borrowed(&'a Value),
    Owned(Value),
}

fn field<'a>(current: &'a Value, name: &str) -> Option<Step<'a>> {
    match current {
        Value::Object(map) => map.get(name).map(Step::Borrowed),
        Value::Array(items) => {
            if name == "length" {
                Some(Step::Owned(Value::from(items.len())))
            } else {
                name.parse::<usize>().ok().and_then(|i| items.get(i)).map(Step::Borrowed)
            }
        }
        Value::String(s) => {
            if name == "length" {
                Some(Step::Owned(Value::from(s.encode_utf16().count())))
            } else {
                name.parse::<usize>().ok().and_then(|i| char_at(s, i))
            }
        }
        _ => None,
    }
}

fn char_at<'a>(s: &str, index: usize) -> Option<Step<'a>> {
    s.chars().nth(index).map(|c| Step::Owned(Value::String(c.to_string())))
}

fn index<'a>(current: &'a Value, i: usize) -> Option<Step<'a>> {
    match current {
        Value::Array(items) => items.get(i).map(Step::Borrowed),
        Value::Object(map) => map.get(&i.to_string()).map(Step::Borrowed),
        Value::String(s) => char_at(s, i),
        _ => None,
    }
}

fn key_from(root: &Map<String, Value>, name: &str) -> Option<String> {
    match root.get(name)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .map(|i| i.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Null => root.get(name).map(display),
        _ => None,
    }
}

fn step<'v>(root: &Map<String, Value>, current: &'v Value, segment: &Segment) -> Option<Step<'v>> {
    match segment {
        Segment::Field(name) => field(current, name),
        Segment::Index(i) => index(current, *i),
        Segment::Var(var) => field(current, &key_from(root, var)?),
    }
}

impl Step<'_> {
    fn into_owned(self) -> Value {
        match self {
            Step::Borrowed(v) => v.clone(),
            Step::Owned(v) => v,
        }
    }
}

/// Read one named property off a value
///
/// Same rules as a path segment: object keys, `length`, and numeric names
/// on arrays and strings.
pub fn property(value: &Value, name: &str) -> Option<Value> {
    field(value, name).map(Step::into_owned)
}

/// Apply parsed segments to the store
pub fn apply<'a>(root: &'a Map<String, Value>, segments: &[Segment]) -> Option<Value> {
    let (first, rest) = segments.split_first()?;

    let mut current: Step<'a> = match first {
        Segment::Field(name) => Step::Borrowed(root.get(name)?),
        Segment::Index(i) => Step::Borrowed(root.get(&i.to_string())?),
        Segment::Var(var) => Step::Borrowed(root.get(&key_from(root, var)?)?),
    };

    for segment in rest {
        current = match &current {
            Step::Borrowed(v) => {
                let v: &'a Value = *v;
                step(root, v, segment)?
            }
            Step::Owned(v) => Step::Owned(step(root, v, segment)?.into_owned()),
        };
    }

    Some(current.into_owned())
}

/// Resolve a relative path starting at `value` (bracket variables still read `root`)
pub fn resolve_on(value: &Value, root: &Map<String, Value>, path: &str) -> Option<Value> {
    let mut current = value.clone();
    for segment in &parse(path.trim()) {
        current = step(root, &current, segment)?.into_owned();
    }
    Some(current)
}

/// Parse and apply in one step; empty paths resolve to `None`
pub fn resolve(root: &Map<String, Value>, path: &str) -> Option<Value> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    apply(root, &parse(path))
}
