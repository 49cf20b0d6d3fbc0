//! Store Module - reactive state (v0.1)
//!
//! Single-writer key/value state whose writes re-render the bound document.
//!
//! Key types:
//! - `ReactiveStore`: values, document, binding registry, dependency graph
//!   and listeners behind one setter

mod reactive;

pub use reactive::ReactiveStore;
