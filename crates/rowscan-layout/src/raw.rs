//! Raw layout description as parsed directly from YAML.
//!
//! These structures mirror the on-disk schema exactly, with every key
//! optional except `name`. Defaults and cross-references are applied by the
//! resolution pass, not here. Unknown keys are rejected: a misspelled option
//! silently changing extraction behaviour is the worst failure mode a
//! declarative format can have.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::LayoutError;

/// A lambda entry: either a single transform name or a list applied in order.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    /// A single transform name.
    One(String),
    /// An ordered list of transform names.
    Many(Vec<String>),
}

impl OneOrMany {
    /// Flattens into an ordered list of names.
    pub(crate) fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

/// Raw context definition from YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawContext {
    /// Context name, unique within the layout.
    pub(crate) name: String,
    /// Parent context name (may be a forward reference).
    pub(crate) parent: Option<String>,
    /// Canonical context this one may stand in for.
    pub(crate) alternative_of: Option<String>,
    /// Whether the context must match for a page to be valid (default true).
    pub(crate) required: Option<bool>,
    /// Whether the context may re-validate on every row advance.
    pub(crate) repeat: Option<bool>,
    /// Whether an all-blank window counts as a pass.
    pub(crate) optional_if_empty: Option<bool>,
    /// Exact page-relative row this context must be checked at.
    pub(crate) at_fixed_row: Option<usize>,
    /// First page-relative row this context may be checked at.
    pub(crate) starts_at_row: Option<usize>,
    /// Last page-relative row this context may be checked at.
    pub(crate) ends_at_row: Option<usize>,
    /// Maximum rows the context may examine (default 1, or the row count).
    pub(crate) row_span: Option<usize>,
    /// End-of-page anchor: only check within the last `row_span` rows.
    pub(crate) eop: Option<bool>,
    /// Transform chain applied to the window before matching.
    pub(crate) lambda: Option<OneOrMany>,
    /// Sub-token delimiter: skip past the first occurrence.
    pub(crate) starts_with: Option<String>,
    /// Sub-token delimiter: truncate at the first occurrence.
    pub(crate) ends_with: Option<String>,
    /// Macro pattern applied to the collapsed window (case-insensitive).
    pub(crate) format: Option<String>,
    /// Names composing the context key; defaults to the required members.
    pub(crate) keys: Option<Vec<String>>,
    /// Ordered field definitions.
    pub(crate) fields: Option<Vec<RawField>>,
    /// Ordered sub-context rows.
    pub(crate) rows: Option<Vec<RawContext>>,
}

/// Raw field definition from YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawField {
    /// Field name.
    pub(crate) name: String,
    /// Whether the field must extract a value (default true).
    pub(crate) required: Option<bool>,
    /// Transform chain applied to the source before extraction.
    pub(crate) lambda: Option<OneOrMany>,
    /// Keep characters from this 0-based index (inclusive).
    pub(crate) token_start: Option<usize>,
    /// Keep characters up to this 0-based index (inclusive).
    pub(crate) token_end: Option<usize>,
    /// Skip past the first occurrence of this literal.
    pub(crate) starts_with: Option<String>,
    /// Truncate at the first occurrence of this literal.
    pub(crate) ends_with: Option<String>,
    /// Extraction pattern (case-insensitive); defaults to the field name.
    pub(crate) format: Option<String>,
    /// Remove the extracted value from the residual buffer (default true).
    pub(crate) pop_out: Option<bool>,
}

/// Parses a YAML description into its name and ordered raw contexts.
///
/// The `origin` parameter is used for error reporting.
pub(crate) fn parse_layout_str(
    text: &str,
    origin: &str,
) -> Result<(String, Vec<RawContext>), LayoutError> {
    let doc: BTreeMap<String, Vec<RawContext>> =
        serde_yaml::from_str(text).map_err(|source| LayoutError::ParseYaml {
            origin: origin.to_string(),
            source,
        })?;

    if doc.len() != 1 {
        return Err(LayoutError::DescriptionShape {
            origin: origin.to_string(),
        });
    }
    doc.into_iter()
        .next()
        .ok_or_else(|| LayoutError::DescriptionShape {
            origin: origin.to_string(),
        })
}
