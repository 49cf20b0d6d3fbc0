//! Centralized constants for the reactive engine
//!
//! Directive vocabulary, tag attributes and default limits in one place.

// ═══════════════════════════════════════════════════════════════
// Directive vocabulary
// ═══════════════════════════════════════════════════════════════

/// Prefix shared by every directive attribute
pub const DIRECTIVE_PREFIX: &str = "rs-";

/// Conditional visibility: `rs-if="<expr>"`
pub const IF_ATTR: &str = "rs-if";

/// List rendering: `rs-for="<item> in <path>"`
pub const FOR_ATTR: &str = "rs-for";

/// Raw markup injection: `rs-html="<varName>"`
pub const HTML_ATTR: &str = "rs-html";

// ═══════════════════════════════════════════════════════════════
// List child tags
// ═══════════════════════════════════════════════════════════════

/// Index tag carried by every rendered list child
pub const FOR_INDEX_ATTR: &str = "rs-for-index";

/// Ownership tag naming the array path a child was rendered from
pub const FOR_CLONE_ATTR: &str = "data-rs-for-clone";

/// `yes` on first insertion, `no` after a replacement
pub const NEWLY_ADDED_ATTR: &str = "is-newly-added";

/// Directive attributes that are never treated as generic `rs-<attr>` bindings
pub const RESERVED_DIRECTIVES: &[&str] = &[IF_ATTR, FOR_ATTR, HTML_ATTR, FOR_INDEX_ATTR];

// ═══════════════════════════════════════════════════════════════
// Defaults
// ═══════════════════════════════════════════════════════════════

/// Upper bound on substitution passes over one template
pub const MAX_SUBSTITUTION_PASSES: usize = 10;

/// Class applied when an `rs-if` condition holds
pub const SHOW_CLASS: &str = "show";

/// Class applied when an `rs-if` condition fails
pub const HIDE_CLASS: &str = "hide";

/// Field rendered for a bare `{item}` when the item is an object
pub const DISPLAY_FIELD: &str = "title";

/// Loop variable always bound to the current index
pub const INDEX_VAR: &str = "index";

/// Loop alias always bound to the current item, whatever name the loop declares
pub const ITEM_VAR: &str = "item";
