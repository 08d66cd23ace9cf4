//! Resolved context definitions.

use regex::Regex;

use crate::field::{FieldDef, compile_pattern, resolve_lambdas};
use crate::raw::RawContext;
use crate::transform::Transform;
use crate::LayoutError;

/// A reference from a context to its parent context.
#[derive(Debug, Clone)]
pub struct ParentRef {
    /// The parent context's name, as written in the description.
    pub name: String,
    /// Position of the parent in the layout order, filled in by the layout
    /// resolution pass (forward references are tolerated until then).
    pub index: Option<usize>,
}

/// A resolved context definition: a composite, possibly multi-line pattern.
///
/// The definition is immutable once loaded; all per-run extraction state
/// lives with the engine, so one layout can be applied to many pages.
#[derive(Debug, Clone)]
pub struct ContextDef {
    /// Context name, unique within the layout.
    pub name: String,
    /// Canonical context this one stands in for, if any.
    pub alternative_of: Option<String>,
    /// Parent context reference, if any.
    pub parent: Option<ParentRef>,
    /// Whether the context must match for a page to be valid.
    pub required: bool,
    /// Whether the context may be re-checked on every row advance.
    pub repeat: bool,
    /// Whether an all-blank window counts as a pass.
    pub optional_if_empty: bool,
    /// Exact page-relative row this context must be checked at.
    pub at_fixed_row: Option<usize>,
    /// First page-relative row this context may be checked at.
    pub starts_at_row: Option<usize>,
    /// Last page-relative row this context may be checked at.
    pub ends_at_row: Option<usize>,
    /// Maximum rows the context may examine on one evaluation.
    pub row_span: usize,
    /// End-of-page anchor.
    pub eop: bool,
    /// Transform chain applied to the window.
    pub lambdas: Vec<Transform>,
    /// Sub-token delimiter: skip past the first occurrence.
    pub starts_with: Option<String>,
    /// Sub-token delimiter: truncate at the first occurrence.
    pub ends_with: Option<String>,
    /// Macro pattern applied to the collapsed window.
    pub format: Option<Regex>,
    /// Names composing the context key (empty = every required member).
    pub keys: Vec<String>,
    /// Ordered field definitions.
    pub fields: Vec<FieldDef>,
    /// Ordered sub-context rows.
    pub rows: Vec<Self>,
}

impl ContextDef {
    /// Resolves a raw context recursively: defaults, transforms, patterns.
    ///
    /// Parent and alias references are left as names; the layout resolution
    /// pass links them once every context has been loaded.
    pub(crate) fn resolve(raw: RawContext) -> Result<Self, LayoutError> {
        let lambdas = resolve_lambdas(raw.lambda, &raw.name)?;
        let format = raw
            .format
            .as_deref()
            .map(|pattern| compile_pattern(pattern, &raw.name))
            .transpose()?;
        let fields = raw
            .fields
            .unwrap_or_default()
            .into_iter()
            .map(|field| FieldDef::resolve(field, &raw.name))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = raw
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(Self::resolve)
            .collect::<Result<Vec<_>, _>>()?;

        // Default span: one row, or one per declared sub-row.
        let row_span = raw.row_span.unwrap_or(if rows.is_empty() {
            1
        } else {
            rows.len()
        });

        Ok(Self {
            parent: raw.parent.map(|name| ParentRef { name, index: None }),
            name: raw.name,
            alternative_of: raw.alternative_of,
            required: raw.required.unwrap_or(true),
            repeat: raw.repeat.unwrap_or(false),
            optional_if_empty: raw.optional_if_empty.unwrap_or(false),
            at_fixed_row: raw.at_fixed_row,
            starts_at_row: raw.starts_at_row,
            ends_at_row: raw.ends_at_row,
            row_span: row_span.max(1),
            eop: raw.eop.unwrap_or(false),
            lambdas,
            starts_with: raw.starts_with,
            ends_with: raw.ends_with,
            format,
            keys: raw.keys.unwrap_or_default(),
            fields,
            rows,
        })
    }

    /// The name the produced node carries: the canonical name for aliases.
    pub fn effective_name(&self) -> &str {
        self.alternative_of.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::parse_layout_str;

    fn resolve_first(yaml: &str) -> ContextDef {
        let (_, raws) = parse_layout_str(yaml, "<inline>").unwrap();
        ContextDef::resolve(raws.into_iter().next().unwrap()).unwrap()
    }

    #[test]
    fn test_resolve_defaults() {
        let ctx = resolve_first("l:\n  - name: header\n");
        assert!(ctx.required);
        assert!(!ctx.repeat);
        assert!(!ctx.optional_if_empty);
        assert!(!ctx.eop);
        assert_eq!(ctx.row_span, 1);
        assert!(ctx.keys.is_empty());
        assert!(ctx.format.is_none());
    }

    #[test]
    fn test_row_span_defaults_to_sub_row_count() {
        let ctx = resolve_first(
            "l:\n  - name: block\n    rows:\n      - name: a\n      - name: b\n      - name: c\n",
        );
        assert_eq!(ctx.row_span, 3);
        assert_eq!(ctx.rows.len(), 3);
    }

    #[test]
    fn test_explicit_row_span_wins_over_sub_rows() {
        let ctx = resolve_first(
            "l:\n  - name: block\n    row_span: 5\n    rows:\n      - name: a\n      - name: b\n",
        );
        assert_eq!(ctx.row_span, 5);
    }

    #[test]
    fn test_effective_name_prefers_canonical() {
        let ctx = resolve_first("l:\n  - name: alt_results\n    alternative_of: results\n");
        assert_eq!(ctx.effective_name(), "results");
        let plain = resolve_first("l:\n  - name: results\n");
        assert_eq!(plain.effective_name(), "results");
    }

    #[test]
    fn test_context_format_is_case_insensitive() {
        let ctx = resolve_first("l:\n  - name: event\n    format: \"event\\\\s+(\\\\d+)\"\n");
        assert!(ctx.format.unwrap().is_match("EVENT 12"));
    }

    #[test]
    fn test_nested_row_errors_bubble_up() {
        let yaml = "l:\n  - name: block\n    rows:\n      - name: bad\n        lambda: nope\n";
        let (_, raws) = parse_layout_str(yaml, "<inline>").unwrap();
        let err = ContextDef::resolve(raws.into_iter().next().unwrap()).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownTransform { .. }));
    }
}
