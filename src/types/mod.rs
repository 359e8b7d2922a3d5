//! Shared data types for the dependency graph engine.

pub mod ids;
pub mod package;
pub mod status;

pub use ids::{DepId, Pid, StrId};
pub use package::Package;
pub use status::{DepFlags, StatusFlags};
