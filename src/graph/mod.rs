//! The graph half of the engine: turning per-package `requires`/`provides`
//! sets into a classified dependency graph, and keeping that classification
//! correct as packages are marked deleted or undeleted.

pub mod classifier;
pub mod mutator;
pub mod resolver;
