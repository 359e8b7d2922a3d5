//! Prelude module for convenient imports.
//!
//! Re-exports the facade, ids, and error types from rpm-graph-toolkit, so
//! callers can write a single `use rpm_graph_toolkit::prelude::*;`.
//!
//! # Example
//!
//! ```
//! use rpm_graph_toolkit::prelude::*;
//!
//! let mut pkgs = Pkgs::new();
//! pkgs.set(0, 0, "pkg", "1", "1", "", 0, 10);
//! pkgs.match_deps();
//! ```

pub use crate::error::{PkgsError as Error, Result};
pub use crate::pkgs::Pkgs;
pub use crate::reader::{MemoryReader, SourceReader};
pub use crate::types::{DepId, Pid, StrId};
pub use crate::types::status::{DepFlags, StatusFlags};
