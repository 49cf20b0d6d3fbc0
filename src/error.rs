//! Error types with fix suggestions
//!
//! The engine itself never fails: every failure inside rendering degrades
//! locally. These errors only surface at the outer edges (config files,
//! state files, CLI arguments, explicit expression checks).

use thiserror::Error;

use crate::expr::ExprError;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum ReactiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration (RS-010 to RS-011)
    // ─────────────────────────────────────────────────────────────

    #[error("RS-010: Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("RS-011: State file must contain a mapping at the top level, got {found}")]
    StateNotMapping { found: String },

    // ─────────────────────────────────────────────────────────────
    // Arguments (RS-020 to RS-022)
    // ─────────────────────────────────────────────────────────────

    #[error("RS-020: Invalid assignment '{input}' (expected name=value)")]
    InvalidAssignment { input: String },

    #[error("RS-021: Unknown event '{name}'")]
    UnknownEvent { name: String },

    #[error("RS-022: No element with id '{id}' in document")]
    TargetNotFound { id: String },

    // ─────────────────────────────────────────────────────────────
    // Expressions (RS-030)
    // ─────────────────────────────────────────────────────────────

    #[error("RS-030: Expression error: {0}")]
    Expression(#[from] ExprError),
}

impl FixSuggestion for ReactiveError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ReactiveError::Io(_) => Some("Check file path and permissions"),
            ReactiveError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            ReactiveError::Json(_) => Some("Check JSON syntax (try parsing with jq)"),
            ReactiveError::Config { .. } => {
                Some("Known keys: max_passes, show_class, hide_class, display_field")
            }
            ReactiveError::StateNotMapping { .. } => {
                Some("Write the state as `name: value` pairs at the top level")
            }
            ReactiveError::InvalidAssignment { .. } => {
                Some("Use --set name=value, e.g. --set count=3 or --set title=\"Hello\"")
            }
            ReactiveError::UnknownEvent { .. } => Some("The only supported event is \"change\""),
            ReactiveError::TargetNotFound { .. } => {
                Some("Add an element with a matching id attribute to the page")
            }
            ReactiveError::Expression(_) => {
                Some("Use literals, variables, comparisons, &&, || and ?: only")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ReactiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_suggestion() {
        let errors = vec![
            ReactiveError::Config { reason: "x".into() },
            ReactiveError::StateNotMapping { found: "array".into() },
            ReactiveError::InvalidAssignment { input: "x".into() },
            ReactiveError::UnknownEvent { name: "click".into() },
            ReactiveError::TargetNotFound { id: "page1".into() },
            ReactiveError::Expression(ExprError::UnexpectedEnd),
        ];
        for err in errors {
            assert!(err.fix_suggestion().is_some(), "missing suggestion for {err}");
        }
    }

    #[test]
    fn codes_appear_in_messages() {
        let err = ReactiveError::InvalidAssignment { input: "count".into() };
        assert!(err.to_string().starts_with("RS-020"));

        let err = ReactiveError::TargetNotFound { id: "page1".into() };
        assert!(err.to_string().contains("page1"));
    }
}
