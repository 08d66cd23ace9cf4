//! Error types for the format parser.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use rowscan_layout::LayoutError;
use rowscan_tree::MergeError;

/// Errors that abort a document scan.
///
/// A layout that simply fails to match is not an error; the scan records the
/// non-match and rotates to the next layout in the family.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The layout description could not be loaded or resolved.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A produced node could not be merged into the document tree.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// A single context validation exceeded the configured budget.
    #[error("pathological pattern for context '{context}' (validation exceeded {budget:?})")]
    PathologicalPattern {
        /// Name of the offending context.
        context: String,
        /// The configured per-context budget.
        budget: Duration,
    },

    /// Failed to read the source document.
    #[error("failed to read document {path}: {source}")]
    ReadDocument {
        /// Path to the document that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}
