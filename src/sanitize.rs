//! Denylist sanitizer for store-derived markup
//!
//! Best-effort only: strips the usual script vectors (dangerous tags,
//! inline event handlers, `javascript:` / `data:` URLs) from values before
//! they are written into the document. It is not an HTML sanitizer in the
//! allowlist sense and makes no guarantee against crafted input.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

const DANGEROUS_TAGS: &str = "script|iframe|object|embed|link|style|meta|base|form";

/// `<script ...>...</script>` and friends, closing tag from the same list
static PAIRED_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)<(?:{DANGEROUS_TAGS})\b[^>]*>.*?</(?:{DANGEROUS_TAGS})\s*>"
    ))
    .unwrap()
});

/// Lone or self-closing dangerous tags, plus stray closers
static LONE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)</?(?:{DANGEROUS_TAGS})\b[^>]*/?\s*>")).unwrap()
});

static SVG_WITH_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<svg[^>]*on\w+\s*=\s*(?:"[^"]*"|'[^']*')[^>]*>"#).unwrap());

static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\son\w+\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap());

static SCRIPT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(href|src|action|style)\s*=\s*(?:"\s*(?:javascript|data):[^"]*"|'\s*(?:javascript|data):[^']*')"#,
    )
    .unwrap()
});

static DATA_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)src\s*=\s*(?:"data:image/[^"]*"|'data:image/[^']*')"#).unwrap()
});

/// Strip script vectors from a store-derived string
///
/// Returns the input unchanged (borrowed) when nothing matched.
pub fn sanitize(input: &str) -> Cow<'_, str> {
    if !input.contains('<') && !input.contains('=') {
        return Cow::Borrowed(input);
    }

    let mut out = Cow::Borrowed(input);
    for (re, replacement) in [
        (&*PAIRED_TAG, ""),
        (&*LONE_TAG, ""),
        (&*SVG_WITH_HANDLER, ""),
        (&*EVENT_HANDLER, ""),
        (&*SCRIPT_URL, "$1=\"#\""),
        (&*DATA_IMAGE, "src=\"#\""),
    ] {
        let replaced = match re.replace_all(&out, replacement) {
            Cow::Owned(s) => Some(s),
            Cow::Borrowed(_) => None,
        };
        if let Some(s) = replaced {
            out = Cow::Owned(s);
        }
    }
    out
}
