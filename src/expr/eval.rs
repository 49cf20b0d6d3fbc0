//! Tree-walking evaluator over an explicit variable frame

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::parser::{parse, BinaryOp, Expr, LogicalOp, UnaryOp};
use super::ExprError;
use crate::path;
use crate::value::{is_truthy, loose_equals, number_value, relational, strict_equals, to_number};

/// Variables visible to an expression
///
/// Locals (loop item and index) shadow store variables of the same name.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    globals: &'a Map<String, Value>,
    locals: Vec<(String, Value)>,
}

impl<'a> Frame<'a> {
    pub fn new(globals: &'a Map<String, Value>) -> Self {
        Self {
            globals,
            locals: Vec::new(),
        }
    }

    /// Bind a local, replacing an earlier binding of the same name
    pub fn with_local(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.locals.retain(|(n, _)| *n != name);
        self.locals.push((name, value));
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.local(name).or_else(|| self.globals.get(name))
    }

    /// Loop local only, ignoring store variables
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn globals(&self) -> &'a Map<String, Value> {
        self.globals
    }
}

/// Parse and evaluate in one step; `Ok(None)` is `undefined`
pub fn evaluate(src: &str, frame: &Frame<'_>) -> Result<Option<Value>, ExprError> {
    let expr = parse(src)?;
    evaluate_expr(&expr, frame)
}

/// Evaluate a parsed expression
pub fn evaluate_expr(expr: &Expr, frame: &Frame<'_>) -> Result<Option<Value>, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        Expr::Var(name) => frame
            .lookup(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| ExprError::UnknownIdentifier { name: name.clone() }),

        Expr::Member(target, name) => {
            let target = evaluate_expr(target, frame)?;
            member(target.as_ref(), name)
        }

        Expr::Index(target, key) => {
            let target = evaluate_expr(target, frame)?;
            let key = evaluate_expr(key, frame)?;
            let name = match &key {
                Some(Value::Number(n)) => n
                    .as_f64()
                    .map(crate::value::format_number)
                    .unwrap_or_else(|| n.to_string()),
                other => crate::value::display_opt(other.as_ref()),
            };
            member(target.as_ref(), &name)
        }

        Expr::Unary(op, inner) => {
            let value = evaluate_expr(inner, frame)?;
            Ok(match op {
                UnaryOp::Not => Some(Value::Bool(!is_truthy(value.as_ref()))),
                UnaryOp::Neg => number_value(-to_number(value.as_ref())),
                UnaryOp::Plus => number_value(to_number(value.as_ref())),
            })
        }

        Expr::Binary(op, left, right) => {
            let l = evaluate_expr(left, frame)?;
            let r = evaluate_expr(right, frame)?;
            let (l, r) = (l.as_ref(), r.as_ref());
            let result = match op {
                BinaryOp::StrictEq => strict_equals(l, r),
                BinaryOp::StrictNe => !strict_equals(l, r),
                BinaryOp::Eq => loose_equals(l, r),
                BinaryOp::Ne => !loose_equals(l, r),
                BinaryOp::Lt => relational(l, r) == Some(Ordering::Less),
                BinaryOp::Gt => relational(l, r) == Some(Ordering::Greater),
                BinaryOp::Le => matches!(relational(l, r), Some(Ordering::Less | Ordering::Equal)),
                BinaryOp::Ge => {
                    matches!(relational(l, r), Some(Ordering::Greater | Ordering::Equal))
                }
            };
            Ok(Some(Value::Bool(result)))
        }

        Expr::Logical(op, left, right) => {
            let l = evaluate_expr(left, frame)?;
            let truthy = is_truthy(l.as_ref());
            match (op, truthy) {
                (LogicalOp::Or, true) | (LogicalOp::And, false) => Ok(l),
                _ => evaluate_expr(right, frame),
            }
        }

        Expr::Conditional(cond, then, otherwise) => {
            if is_truthy(evaluate_expr(cond, frame)?.as_ref()) {
                evaluate_expr(then, frame)
            } else {
                evaluate_expr(otherwise, frame)
            }
        }
    }
}

fn member(target: Option<&Value>, name: &str) -> Result<Option<Value>, ExprError> {
    match target {
        None => Err(ExprError::NullAccess {
            property: name.to_string(),
            target: "undefined",
        }),
        Some(Value::Null) => Err(ExprError::NullAccess {
            property: name.to_string(),
            target: "null",
        }),
        Some(value) => Ok(path::property(value, name)),
    }
}
