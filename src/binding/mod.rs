//! Binding Module - which locations render which variables
//!
//! - `registry`: variable → bindings, plus the write-once template captures
//!   each location is re-rendered from
//!
//! Data flow:
//! ```text
//! scan / reparse → BindingRegistry (captures + bindings)
//!                          ↓
//!                 store write to `name`
//!                          ↓
//!              bindings_for(name) → re-render
//! ```

mod registry;

pub use registry::{Binding, BindingKind, BindingRegistry, ForTemplate};
