//! Placeholder tokenizer with caching
//!
//! Templates are plain text with `{path}` placeholders. This module:
//! - Tokenizes a template once and caches the result
//! - Renders a template in a single pass over its tokens
//! - Extracts the store variables a placeholder depends on
//!
//! A `{` only opens a placeholder when a `}` follows before any other `{`,
//! so `{{name}}` renders as `{` + value + `}`.

use std::ops::Range;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use crate::constants::{INDEX_VAR, ITEM_VAR};
use crate::path;

/// Token representing a parsed template fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text (range in the original string)
    Literal(Range<usize>),
    /// `{path}`: `span` covers the braces, `path` is the trimmed content
    Placeholder { span: Range<usize>, path: String },
}

/// Template tokenizer with caching
///
/// Only captured templates go through the cache; intermediate strings of a
/// multi-pass render use [`tokenize`] directly so the cache stays bounded by
/// the number of bound locations.
pub struct TemplateResolver {
    cache: DashMap<String, Arc<Vec<Token>>>,
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateResolver {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Parse template into tokens (with caching)
    pub fn tokenize(&self, template: &str) -> Arc<Vec<Token>> {
        if let Some(cached) = self.cache.get(template) {
            return Arc::clone(&cached);
        }
        let tokens = Arc::new(tokenize(template));
        self.cache.insert(template.to_string(), Arc::clone(&tokens));
        tokens
    }

    /// Distinct placeholder paths, in order of first appearance
    pub fn placeholders(&self, template: &str) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for token in self.tokenize(template).iter() {
            if let Token::Placeholder { path, .. } = token {
                if !seen.contains(path) {
                    seen.push(path.clone());
                }
            }
        }
        seen
    }

    /// Store variables the template depends on (base names and bracket variables)
    pub fn dependencies(&self, template: &str) -> Vec<String> {
        let mut deps: Vec<String> = Vec::new();
        for placeholder in self.placeholders(template) {
            for var in dependencies(&placeholder) {
                if !deps.contains(&var) {
                    deps.push(var);
                }
            }
        }
        deps
    }

    /// Number of cached templates
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Tokenize without touching any cache
pub fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut search = 0;

    while let Some(offset) = template[search..].find('{') {
        let open = search + offset;
        let after = &template[open + 1..];
        let close = after.find('}');
        let reopen = after.find('{');

        match close {
            Some(close) if reopen.map_or(true, |r| r > close) => {
                let inner = after[..close].trim();
                let end = open + 1 + close + 1;
                if inner.is_empty() {
                    search = end;
                    continue;
                }
                if open > literal_start {
                    tokens.push(Token::Literal(literal_start..open));
                }
                tokens.push(Token::Placeholder {
                    span: open..end,
                    path: inner.to_string(),
                });
                literal_start = end;
                search = end;
            }
            Some(_) => search = open + 1,
            None => break,
        }
    }

    if literal_start < template.len() {
        tokens.push(Token::Literal(literal_start..template.len()));
    }
    tokens
}

/// Render tokens, asking `lookup` for each placeholder; `None` keeps the placeholder text
pub fn render_tokens<F>(template: &str, tokens: &[Token], mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut result = String::with_capacity(template.len() * 2);
    for token in tokens {
        match token {
            Token::Literal(range) => result.push_str(&template[range.clone()]),
            Token::Placeholder { span, path } => match lookup(path) {
                Some(value) => result.push_str(&value),
                None => result.push_str(&template[span.clone()]),
            },
        }
    }
    result
}

/// Single-pass render of an uncached template
pub fn render<F>(template: &str, lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    render_tokens(template, &tokenize(template), lookup)
}

/// Whether the string contains at least one placeholder
pub fn has_placeholder(template: &str) -> bool {
    tokenize(template)
        .iter()
        .any(|t| matches!(t, Token::Placeholder { .. }))
}

/// Leading identifier of a placeholder (`todos` for `todos[0].title`)
pub fn base_name(token: &str) -> &str {
    let end = token
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}

/// Store variables a single placeholder reads
pub fn dependencies(token: &str) -> Vec<String> {
    let segments = path::parse(token.trim());
    path::variables(&segments)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Bare `{name}` reference held as a string value
pub fn bare_reference(value: &Value) -> Option<&str> {
    let s = value.as_str()?.trim();
    let inner = s.strip_prefix('{')?.strip_suffix('}')?.trim();
    if inner.is_empty() || inner.contains(['{', '}']) {
        return None;
    }
    Some(inner)
}

/// Tokens owned by an enclosing list directive rather than the store
pub fn is_loop_reserved(token: &str, item_name: Option<&str>) -> bool {
    let reserved = |name: &str| {
        token == name
            || token
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
    };
    token == INDEX_VAR || reserved(ITEM_VAR) || item_name.is_some_and(reserved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tokenize_simple_literal() {
        let tokens = tokenize("simple text");
        assert_eq!(tokens, vec![Token::Literal(0..11)]);
    }

    #[test]
    fn test_tokenize_placeholder() {
        let tokens = tokenize("Hi {name}!");
        assert_eq!(
            tokens,
            vec![
                Token::Literal(0..3),
                Token::Placeholder {
                    span: 3..9,
                    path: "name".to_string()
                },
                Token::Literal(9..10),
            ]
        );
    }

    #[test]
    fn test_tokenize_trims_and_skips_empty() {
        let tokens = tokenize("{ user.name }{}");
        assert!(matches!(&tokens[0], Token::Placeholder { path, .. } if path == "user.name"));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_double_braces_keep_outer() {
        let out = render("{{x}}", |p| (p == "x").then(|| "1".to_string()));
        assert_eq!(out, "{1}");
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        assert!(!has_placeholder("function() { return 1;"));
        assert_eq!(render("a { b", |_| Some("x".into())), "a { b");
    }

    #[test]
    fn test_unresolved_placeholder_kept() {
        let out = render("{a} and {b}", |p| (p == "a").then(|| "A".to_string()));
        assert_eq!(out, "A and {b}");
    }

    #[test]
    fn test_cache_reuse() {
        let resolver = TemplateResolver::new();
        let tokens1 = resolver.tokenize("{a} {b}");
        let tokens2 = resolver.tokenize("{a} {b}");
        assert!(Arc::ptr_eq(&tokens1, &tokens2));
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn test_dependencies() {
        let resolver = TemplateResolver::new();
        assert_eq!(
            resolver.dependencies("{pageTitle[activePage]} by {user.name} {user.age}"),
            vec!["pageTitle", "activePage", "user"]
        );
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("todos[0].title"), "todos");
        assert_eq!(base_name("count"), "count");
        assert_eq!(base_name(".x"), "");
    }

    #[test]
    fn test_bare_reference() {
        assert_eq!(bare_reference(&json!("{b}")), Some("b"));
        assert_eq!(bare_reference(&json!(" { b } ")), Some("b"));
        assert_eq!(bare_reference(&json!("x {b}")), None);
        assert_eq!(bare_reference(&json!("{a}{b}")), None);
        assert_eq!(bare_reference(&json!(3)), None);
    }

    #[test]
    fn test_loop_reserved() {
        assert!(is_loop_reserved("index", None));
        assert!(is_loop_reserved("item", None));
        assert!(is_loop_reserved("item.title", None));
        assert!(is_loop_reserved("t.title", Some("t")));
        assert!(!is_loop_reserved("items", None));
        assert!(!is_loop_reserved("total", Some("t")));
    }
}
