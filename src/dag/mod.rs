//! Dependency Module - variable-to-variable references
//!
//! Key types:
//! - `DependencyGraph`: reverse edges from a variable to the variables whose
//!   values reference it, recomputed on every store write

mod graph;

pub use graph::DependencyGraph;
