//! Context validation and per-run extraction state.
//!
//! Definitions are immutable and shared; everything a validation pass
//! mutates lives in a [`ContextState`] tree that mirrors the definition's
//! sub-rows. State is reset at the start of every pass, so a context can be
//! re-checked at any row without leftovers from the previous attempt.

use rowscan_layout::{Buffer, ContextDef, apply_chain};
use rowscan_tree::{DataNode, ParentLink};

use crate::extract::{extract_field, match_value};

/// Mutable per-run state of one context definition.
#[derive(Debug, Clone, Default)]
pub struct ContextState {
    /// Advancement within the context's local window.
    pub curr_index: usize,
    /// Rows the context absorbed on the last successful validation.
    pub consumed_rows: usize,
    /// Result of the last validation pass.
    pub last_result: bool,
    /// Page row the context was last checked at.
    pub last_scan_index: Option<usize>,
    /// Extracted values in insertion order.
    pub data: Vec<(String, String)>,
    /// Composed key of the last successful validation (may be empty).
    pub key: String,
    /// Node produced by the last successful, data-producing validation.
    pub dao: Option<DataNode>,
    /// States of the definition's sub-rows, in declaration order.
    pub row_states: Vec<ContextState>,
}

impl ContextState {
    /// Builds a state tree mirroring a definition's sub-rows.
    pub fn for_def(def: &ContextDef) -> Self {
        Self {
            row_states: def.rows.iter().map(Self::for_def).collect(),
            ..Self::default()
        }
    }

    /// Resets the extraction state, keeping `last_scan_index`.
    fn reset(&mut self) {
        self.curr_index = 0;
        self.consumed_rows = 0;
        self.last_result = false;
        self.data.clear();
        self.key.clear();
        self.dao = None;
    }

    /// Resets everything, recursively. Used between pages, where row indices
    /// change meaning.
    pub fn clear_run_state(&mut self) {
        self.reset();
        self.last_scan_index = None;
        for row in &mut self.row_states {
            row.clear_run_state();
        }
    }
}

/// Validates a context against `page_rows` starting at `scan_index`.
///
/// Returns true when the context matches; a data-producing match leaves the
/// produced node in `state.dao`. With `extract` false this is a dry-run
/// validity probe, which optional and repeatable contexts always pass.
///
/// Failures are local: the pass returns false with the state reset, and only
/// structural description errors (detected at load time) ever raise.
pub fn validate_context(
    def: &ContextDef,
    state: &mut ContextState,
    page_rows: &[String],
    scan_index: usize,
    extract: bool,
) -> bool {
    state.reset();
    state.last_scan_index = Some(scan_index);

    if !extract && (!def.required || def.repeat) {
        state.last_result = true;
        return true;
    }

    let ok = scan(def, state, page_rows, scan_index, extract);
    if !ok {
        state.reset();
    }
    state.last_result = ok;
    ok
}

/// One validation pass: pre-flight filters, window preparation, transforms,
/// macro format, field scan, row scan, node emission.
fn scan(
    def: &ContextDef,
    state: &mut ContextState,
    page_rows: &[String],
    scan_index: usize,
    extract: bool,
) -> bool {
    // Pre-flight bail-outs. The end-of-page anchor overrides the start row.
    let starts_at = if def.eop {
        Some(page_rows.len().saturating_sub(def.row_span))
    } else {
        def.starts_at_row
    };
    if scan_index >= page_rows.len()
        || def.ends_at_row.is_some_and(|end| scan_index > end)
        || def.at_fixed_row.is_some_and(|row| row != scan_index)
        || starts_at.is_some_and(|start| scan_index < start)
    {
        return false;
    }

    // Window preparation.
    let mut window: &[String] = page_rows;
    if let Some(end) = def.ends_at_row {
        window = &window[..window.len().min(end + 1)];
    }
    if !def.eop && let Some(start) = starts_at {
        window = &window[start.min(window.len())..];
    }
    window = &window[scan_index.min(window.len())..];

    let mut joined = window.join("\n");
    if let Some(marker) = &def.ends_with
        && let Some(position) = joined.find(marker.as_str())
    {
        joined.truncate(position);
    }
    if let Some(marker) = &def.starts_with
        && let Some(position) = joined.find(marker.as_str())
    {
        joined = joined[position + marker.len()..].to_string();
    }
    let rows: Vec<String> = joined
        .lines()
        .take(def.row_span)
        .map(str::to_string)
        .collect();

    // Transform chain, then collapse for the macro format.
    let buffer = apply_chain(&def.lambdas, Buffer::Lines(rows));
    let window_rows: Vec<String> = match &buffer {
        Buffer::Lines(lines) => lines.clone(),
        Buffer::Text(text) => text.lines().map(str::to_string).collect(),
    };
    let window_str = buffer.fold();
    let window_blank = window_str.trim().is_empty();

    if let Some(pattern) = &def.format {
        if window_blank && pattern.is_match("") {
            // The context is a required blank line.
            state.consumed_rows = 1;
            return true;
        }
        if let Some(value) = match_value(pattern, &window_str) {
            let value = value.trim().to_string();
            if !value.is_empty() {
                state.data.push((def.name.clone(), value));
                state.consumed_rows = 1;
            }
        } else if !(window_blank && def.optional_if_empty) {
            return false;
        }
    }

    // An all-blank window passes only when the context tolerates it.
    if window_blank {
        if def.optional_if_empty {
            state.consumed_rows = def.row_span;
            return true;
        }
        if def.format.is_some() || !def.fields.is_empty() || !def.rows.is_empty() {
            return false;
        }
    }

    // Field scan: fields share one residual buffer and live on one row.
    if !def.fields.is_empty() {
        let mut source = window_str.clone();
        let mut any_extracted = false;
        let mut fields_valid = true;
        for field in &def.fields {
            let extraction = extract_field(field, &source);
            source = extraction.residual;
            match extraction.value {
                Some(value) => {
                    any_extracted = true;
                    state.data.push((field.name.clone(), value));
                }
                None if field.required => fields_valid = false,
                None => {}
            }
        }
        if !fields_valid {
            return false;
        }
        if any_extracted {
            state.curr_index += 1;
        }
        state.consumed_rows = state.consumed_rows.max(state.curr_index);
    }

    // Row scan: sub-contexts see the window as their page.
    for (child, child_state) in def.rows.iter().zip(state.row_states.iter_mut()) {
        let ok = validate_context(child, child_state, &window_rows, state.curr_index, extract);
        if ok {
            state.consumed_rows += child_state.consumed_rows;
            state.curr_index += child_state.consumed_rows;
            state
                .data
                .push((child.name.clone(), child_state.key.clone()));
        } else if child.required {
            return false;
        }
    }
    state.consumed_rows = state.consumed_rows.min(def.row_span);

    // Emission: a non-empty key produces a node; an empty key marks the
    // context as matched but not data-producing.
    state.key = compose_key(def, &state.data);
    if !state.key.is_empty() {
        let mut dao = DataNode::new(def.effective_name(), state.key.clone());
        dao.fields = state.data.clone();
        dao.parent = def
            .parent
            .as_ref()
            .map(|parent| ParentLink::by_name(parent.name.clone()));
        state.dao = Some(dao);
    }
    true
}

/// Composes the context key: the `keys`-selected values when declared,
/// otherwise the context's own captured value plus every required field and
/// row value, in declaration order.
fn compose_key(def: &ContextDef, data: &[(String, String)]) -> String {
    let lookup = |name: &str| {
        data.iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value.as_str())
    };

    let mut parts: Vec<&str> = Vec::new();
    if def.keys.is_empty() {
        if def.format.is_some()
            && let Some(value) = lookup(&def.name)
        {
            parts.push(value);
        }
        for field in &def.fields {
            if field.required
                && let Some(value) = lookup(&field.name)
            {
                parts.push(value);
            }
        }
        for row in &def.rows {
            if row.required
                && let Some(value) = lookup(&row.name)
            {
                parts.push(value);
            }
        }
    } else {
        for key in &def.keys {
            if let Some(value) = lookup(key) {
                parts.push(value);
            }
        }
    }
    parts.join("|")
}
