//! reactive-html - reactive key/value store bound to a live markup tree
//!
//! Writes to the store re-render every bound text node, attribute and
//! `rs-*` directive in the document.
//!
//! ```
//! use reactive_html::ReactiveStore;
//! use serde_json::{json, Map};
//!
//! let mut initial = Map::new();
//! initial.insert("name".into(), json!("Ada"));
//! let mut store = ReactiveStore::from_html("<p>Hi {name}</p>", initial);
//! store.set("name", "Grace");
//! assert_eq!(store.render(), "<p>Hi Grace</p>");
//! ```

pub mod binding;
pub mod config;
pub mod constants;
pub mod dag;
pub mod directive;
pub mod dom;
pub mod error;
pub mod event;
pub mod expr;
pub mod path;
pub mod sanitize;
pub mod scanner;
pub mod store;
pub mod template;
pub mod value;

pub use binding::{Binding, BindingKind, BindingRegistry};
pub use config::EngineConfig;
pub use dag::DependencyGraph;
pub use dom::{Document, NodeId};
pub use error::{FixSuggestion, ReactiveError, Result};
pub use event::{ChangeEvent, EventKind, ListenerId};
pub use sanitize::sanitize;
pub use store::ReactiveStore;
