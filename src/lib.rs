//! Dependency resolution and graph maintenance engine for an installed
//! package database.
//!
//! This crate analyzes a package database (name/epoch/version/release/arch,
//! declared requirements, declared capabilities, and file paths treated as
//! implicit capabilities), builds the full package-level dependency graph,
//! classifies every package by its position in that graph (leaf, partial
//! leaf, broken, member of a dependency loop), and lets a caller mark
//! packages for deletion while the engine continuously maintains those
//! classifications, finally emitting a removal plan.
//!
//! The package-source reader, a terminal UI, the subprocess that actually
//! uninstalls packages, and argument parsing are out of scope — this crate
//! ships only the [`reader::SourceReader`] trait (plus an in-memory
//! [`reader::MemoryReader`] for tests and demos) and the semantic
//! operations a UI would drive through [`pkgs::Pkgs`].
//!
//! # Example
//!
//! ```
//! use rpm_graph_toolkit::pkgs::Pkgs;
//! use rpm_graph_toolkit::types::status::DepFlags;
//!
//! let mut pkgs = Pkgs::new();
//! let a = pkgs.set(0, 0, "liba", "1", "1", "", 0, 100);
//! let b = pkgs.set(1, 0, "libb", "1", "1", "", 0, 100);
//! pkgs.add_req(b, "liba", DepFlags::NONE, "");
//! pkgs.add_prov(a, "liba", DepFlags::NONE, "");
//! pkgs.match_deps();
//!
//! assert!(pkgs.is_leaf(b));
//! assert!(!pkgs.is_leaf(a));
//! assert!(pkgs.delete(b, false));
//! assert!(pkgs.is_leaf(a));
//! ```

pub mod command;
pub mod error;
pub mod graph;
pub mod pkgs;
pub mod reader;
pub mod store;
pub mod types;
pub mod version;

/// Prelude module for convenient imports.
///
/// Re-exports the facade and the most commonly used types, so callers can
/// write a single `use rpm_graph_toolkit::prelude::*;`.
pub mod prelude;

pub use error::{PkgsError as Error, Result};
pub use pkgs::Pkgs;
pub use reader::{MemoryReader, SourceReader};
pub use types::{DepId, Pid, StrId};
