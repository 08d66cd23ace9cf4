//! Layout linting.
//!
//! Lints a loaded layout and reports warnings for constructs that load fine
//! but rarely mean what the description author intended. Warnings are
//! advisory; loading has already succeeded.

use std::fmt;

use crate::context::ContextDef;
use crate::layout::Layout;

/// A non-fatal warning about a layout description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutWarning {
    /// A context declares more sub-rows than its `row_span` allows.
    RowSpanBelowRows {
        /// Name of the context.
        context: String,
        /// Declared row span.
        row_span: usize,
        /// Number of declared sub-rows.
        rows: usize,
    },
    /// A `keys` entry names neither the context, a field, nor a sub-row.
    UnknownKeyEntry {
        /// Name of the context.
        context: String,
        /// The unresolved key entry.
        key: String,
    },
    /// A repeatable context pinned to a fixed row can match at most once.
    RepeatAtFixedRow {
        /// Name of the context.
        context: String,
    },
    /// An alias points at another alias instead of the canonical context.
    AliasOfAlias {
        /// Name of the alias context.
        context: String,
        /// The canonical name it references.
        canonical: String,
    },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowSpanBelowRows {
                context,
                row_span,
                rows,
            } => write!(
                f,
                "context '{context}' declares {rows} rows but row_span {row_span}"
            ),
            Self::UnknownKeyEntry { context, key } => {
                write!(f, "context '{context}' key entry '{key}' matches nothing")
            }
            Self::RepeatAtFixedRow { context } => {
                write!(f, "repeatable context '{context}' is pinned to a fixed row")
            }
            Self::AliasOfAlias { context, canonical } => write!(
                f,
                "context '{context}' is an alternative of alias '{canonical}'"
            ),
        }
    }
}

/// Lints every context in the layout, recursing into sub-rows.
pub(crate) fn validate_layout(layout: &Layout) -> Vec<LayoutWarning> {
    let mut warnings = Vec::new();

    for ctx in layout.contexts() {
        validate_context(ctx, &mut warnings);

        if let Some(canonical) = &ctx.alternative_of
            && let Some(target) = layout.get(canonical)
            && target.alternative_of.is_some()
        {
            warnings.push(LayoutWarning::AliasOfAlias {
                context: ctx.name.clone(),
                canonical: canonical.clone(),
            });
        }
    }

    warnings
}

/// Lints one context and its sub-rows.
fn validate_context(ctx: &ContextDef, warnings: &mut Vec<LayoutWarning>) {
    if !ctx.rows.is_empty() && ctx.row_span < ctx.rows.len() {
        warnings.push(LayoutWarning::RowSpanBelowRows {
            context: ctx.name.clone(),
            row_span: ctx.row_span,
            rows: ctx.rows.len(),
        });
    }

    if ctx.repeat && ctx.at_fixed_row.is_some() {
        warnings.push(LayoutWarning::RepeatAtFixedRow {
            context: ctx.name.clone(),
        });
    }

    for key in &ctx.keys {
        let known = *key == ctx.name
            || ctx.fields.iter().any(|field| field.name == *key)
            || ctx.rows.iter().any(|row| row.name == *key);
        if !known {
            warnings.push(LayoutWarning::UnknownKeyEntry {
                context: ctx.name.clone(),
                key: key.clone(),
            });
        }
    }

    for row in &ctx.rows {
        validate_context(row, warnings);
    }
}
