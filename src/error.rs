//! Unified error type for rpm-graph-toolkit.

use thiserror::Error;

/// Unified error type for all rpm-graph-toolkit operations (SPEC_FULL §7).
///
/// Programmer errors (out-of-range index, mutation of a frozen store) are
/// deliberately *not* variants here — those panic, matching the original's
/// `assert()` discipline, since they indicate a caller bug rather than a
/// recoverable condition.
#[derive(Error, Debug)]
pub enum PkgsError {
    /// A version or dependency string could not be parsed into its
    /// `epoch:version-release` components. Carries the offending input;
    /// callers fall back to treating missing components as empty rather
    /// than propagating this in the hot load path.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The external removal command (or another reader-owned subprocess)
    /// returned a nonzero exit code.
    #[error("External command failed with status {code}: {command}")]
    ExternalCommand {
        /// Process exit code.
        code: i32,
        /// The command line that was run.
        command: String,
    },

    /// Failure reading or writing a saved selection side file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure (de)serializing a saved selection.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// An invalid search-and-filter expression (SPEC_FULL §6).
    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),
}

/// Result type alias for rpm-graph-toolkit operations.
pub type Result<T> = std::result::Result<T, PkgsError>;
