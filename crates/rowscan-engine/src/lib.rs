//! Layout-driven format parser for rowscan.
//!
//! The engine takes a text document (usually the output of a PDF-to-text
//! step) and a set of declarative layouts, scans the document page by page,
//! and produces a single hierarchical data tree ready for downstream import.
//!
//! A scan picks a layout, runs its context tree against the current page's
//! rows, and merges the per-context nodes into a document root. Layouts of
//! the same family (shared name prefix before the first dot) are
//! interchangeable across page boundaries: when one stops applying
//! mid-document, the scan rotates to its siblings.
//!
//! A parse run owns all of its mutable state; nothing here is thread-safe or
//! meant to be shared. Run several scans in parallel only on separate
//! [`FormatParser`] and [`Document`] values.

#![warn(missing_docs)]

use std::time::Duration;

mod document;
mod error;
mod extract;
mod options;
mod parser;
mod report;
mod run;
mod state;

pub use document::{Document, Page};
pub use error::ParseError;
pub use extract::{Extraction, extract_field};
pub use options::ScanOptions;
pub use parser::FormatParser;
pub use report::{FormatCheck, ScanOutcome, ScanReport};
pub use run::{LayoutRun, RepeatCheck};
pub use state::{ContextState, validate_context};

/// Default wall-clock budget for a single context validation.
///
/// A validation exceeding the budget indicates a pathological pattern in the
/// layout description and aborts the scan.
pub const DEFAULT_CONTEXT_BUDGET: Duration = Duration::from_secs(5);
