//! Resolved field definitions.

use regex::{Regex, RegexBuilder};

use crate::raw::{OneOrMany, RawField};
use crate::transform::Transform;
use crate::LayoutError;

/// A resolved field definition: extracts one named scalar from a buffer.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name; also the value's name in the produced data.
    pub name: String,
    /// Whether the field must extract a value for the scan to pass.
    pub required: bool,
    /// Transform chain applied before the range delimiters.
    pub lambdas: Vec<Transform>,
    /// Keep characters from this 0-based index (inclusive).
    pub token_start: Option<usize>,
    /// Keep characters up to this 0-based index (inclusive).
    pub token_end: Option<usize>,
    /// Skip past the first occurrence of this literal.
    pub starts_with: Option<String>,
    /// Truncate at the first occurrence of this literal.
    pub ends_with: Option<String>,
    /// Compiled extraction pattern. When the description omits `format`,
    /// this is the synthesized default `\W*(name)\W*`, which makes a bare
    /// field double as a column-header detector.
    pub format: Regex,
    /// Remove the extracted value from the residual buffer.
    pub pop_out: bool,
}

impl FieldDef {
    /// Resolves a raw field, compiling its pattern and transform chain.
    ///
    /// `context` is the owning context's name, used for error reporting.
    pub(crate) fn resolve(raw: RawField, context: &str) -> Result<Self, LayoutError> {
        let lambdas = resolve_lambdas(raw.lambda, context)?;
        let format = match &raw.format {
            Some(pattern) => compile_pattern(pattern, context)?,
            None => {
                let pattern = format!(r"\W*({})\W*", regex::escape(&raw.name));
                compile_pattern(&pattern, context)?
            }
        };

        Ok(Self {
            name: raw.name,
            required: raw.required.unwrap_or(true),
            lambdas,
            token_start: raw.token_start,
            token_end: raw.token_end,
            starts_with: raw.starts_with,
            ends_with: raw.ends_with,
            format,
            pop_out: raw.pop_out.unwrap_or(true),
        })
    }

    /// True when any range-delimiting option is set.
    pub fn has_range(&self) -> bool {
        self.token_start.is_some()
            || self.token_end.is_some()
            || self.starts_with.is_some()
            || self.ends_with.is_some()
    }
}

/// Resolves a raw lambda entry into transforms; unknown names are fatal.
pub(crate) fn resolve_lambdas(
    raw: Option<OneOrMany>,
    context: &str,
) -> Result<Vec<Transform>, LayoutError> {
    raw.map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(|name| {
            Transform::parse(&name).ok_or_else(|| LayoutError::UnknownTransform {
                context: context.to_string(),
                name,
            })
        })
        .collect()
}

/// Compiles a case-insensitive pattern, reporting the owning context.
pub(crate) fn compile_pattern(pattern: &str, context: &str) -> Result<Regex, LayoutError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| LayoutError::InvalidPattern {
            context: context.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}
