//! Error types for layout loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or resolving a layout description.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Failed to read a layout description file.
    #[error("failed to read layout file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse the YAML description.
    #[error("failed to parse layout {origin}: {source}")]
    ParseYaml {
        /// File path or `<inline>` for string sources.
        origin: String,
        /// Underlying YAML parse error.
        source: serde_yaml::Error,
    },

    /// The description does not have exactly one top-level entry.
    #[error("layout {origin} must have exactly one top-level entry (the layout name)")]
    DescriptionShape {
        /// File path or `<inline>` for string sources.
        origin: String,
    },

    /// Two contexts share the same name.
    #[error("duplicate context name '{context}'")]
    DuplicateContext {
        /// The repeated context name.
        context: String,
    },

    /// A lambda names a transform outside the registered set.
    #[error("unknown transform '{name}' in context '{context}'")]
    UnknownTransform {
        /// Name of the context (or the context owning the field).
        context: String,
        /// The unrecognised transform name.
        name: String,
    },

    /// A context references a parent that is not defined in the layout.
    #[error("context '{context}' references unknown parent '{parent}'")]
    UnknownParent {
        /// Name of the referring context.
        context: String,
        /// The unresolved parent name.
        parent: String,
    },

    /// An `alternative_of` references a context that is not defined.
    #[error("context '{context}' is an alternative of unknown context '{canonical}'")]
    UnknownCanonical {
        /// Name of the alias context.
        context: String,
        /// The unresolved canonical name.
        canonical: String,
    },

    /// Parent references form a cycle.
    #[error("context '{context}' participates in a parent cycle")]
    CyclicParent {
        /// Name of a context on the cycle.
        context: String,
    },

    /// A `format` pattern failed to compile.
    #[error("invalid pattern '{pattern}' in context '{context}': {source}")]
    InvalidPattern {
        /// Name of the context (or the context owning the field).
        context: String,
        /// The offending pattern.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// A layout directory contains no descriptions.
    #[error("no layout descriptions found in {dir}")]
    NoLayouts {
        /// The directory that was scanned.
        dir: PathBuf,
    },
}
