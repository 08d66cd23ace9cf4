//! Per-run layout state: row progression and node storage.
//!
//! A [`LayoutRun`] pairs an immutable [`Layout`] with everything one scan
//! mutates: context states, repeatable bookkeeping, per-page scan results,
//! the page's accumulated nodes, and the latest-valid-parent snapshots that
//! carry non-repeated headers across page boundaries.

use std::collections::HashMap;

use rowscan_layout::Layout;
use rowscan_tree::{DataNode, MergeError, MergeOutcome, ParentLink};

use crate::state::{ContextState, validate_context};

/// Bookkeeping for one repeatable context.
#[derive(Debug, Clone, Default)]
pub struct RepeatCheck {
    /// Row the context was last checked at.
    pub last_check: Option<usize>,
    /// Result of the last check.
    pub valid: bool,
    /// Rows where the context validated, in check order.
    pub valid_at: Vec<usize>,
}

/// Mutable state of one layout applied to one document.
#[derive(Debug)]
pub struct LayoutRun<'a> {
    /// The immutable layout being applied.
    layout: &'a Layout,
    /// Per-context extraction state, parallel to the layout order.
    states: Vec<ContextState>,
    /// Repeatable bookkeeping by context name.
    repeats: HashMap<String, RepeatCheck>,
    /// Per-page scan results (sticky once true).
    valid_results: HashMap<String, bool>,
    /// Top-level nodes accumulated on the current page.
    page_daos: Vec<DataNode>,
    /// Latest valid parent snapshot per effective context name.
    ///
    /// Survives page breaks so a header matched on page one can still parent
    /// nodes on later pages.
    last_valid_parents: HashMap<String, DataNode>,
}

impl<'a> LayoutRun<'a> {
    /// Creates a fresh run for a layout.
    pub fn new(layout: &'a Layout) -> Self {
        let states = layout.contexts().iter().map(ContextState::for_def).collect();
        let repeats = layout
            .repeatables()
            .iter()
            .map(|&index| (layout.contexts()[index].name.clone(), RepeatCheck::default()))
            .collect();
        Self {
            layout,
            states,
            repeats,
            valid_results: HashMap::new(),
            page_daos: Vec::new(),
            last_valid_parents: HashMap::new(),
        }
    }

    /// The layout this run applies.
    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    /// Extraction state of one context.
    pub fn state(&self, index: usize) -> &ContextState {
        &self.states[index]
    }

    /// Validates the context at `index` against the page rows.
    pub fn validate(&mut self, index: usize, page_rows: &[String], row_index: usize) -> bool {
        let layout = self.layout;
        let def = &layout.contexts()[index];
        validate_context(def, &mut self.states[index], page_rows, row_index, true)
    }

    /// True when the context was already checked at this row, either through
    /// repeatable bookkeeping or its stored scan index. Guards the
    /// parent/previous transitions against ping-ponging on one row.
    pub fn already_checked(&self, index: usize, row_index: usize) -> bool {
        let def = &self.layout.contexts()[index];
        if let Some(check) = self.repeats.get(&def.name)
            && check.last_check == Some(row_index)
        {
            return true;
        }
        self.states[index].last_scan_index == Some(row_index)
    }

    /// Records a validation outcome and stores the produced node.
    ///
    /// Returns the row index the scan should continue from; this return
    /// value is the single source of truth for row advancement.
    pub fn progress_row_and_store(
        &mut self,
        row_index: usize,
        valid: bool,
        index: usize,
    ) -> Result<usize, MergeError> {
        let layout = self.layout;
        let def = &layout.contexts()[index];

        if def.repeat
            && let Some(check) = self.repeats.get_mut(&def.name)
        {
            check.last_check = Some(row_index);
            check.valid = valid;
            if valid && !check.valid_at.contains(&row_index) {
                check.valid_at.push(row_index);
            }
        }

        // Scan results stick once true; a valid alias also validates its
        // canonical context.
        if !self.valid_results.get(&def.name).copied().unwrap_or(false) {
            self.valid_results.insert(def.name.clone(), valid);
        }
        if valid && let Some(canonical) = &def.alternative_of {
            self.valid_results.insert(canonical.clone(), true);
        }

        let consumed = self.states[index].consumed_rows;
        let dao = self.states[index].dao.clone();

        if valid && let Some(dao) = &dao {
            self.last_valid_parents.insert(dao.name.clone(), dao.clone());
        }

        if valid && consumed > 0 {
            if let Some(mut dao) = dao {
                if let Some(parent) = &def.parent {
                    let parent_name = layout
                        .get(&parent.name)
                        .map(|ctx| ctx.effective_name().to_string())
                        .unwrap_or_else(|| parent.name.clone());
                    dao.parent = Some(match self.last_valid_parents.get(&parent_name) {
                        Some(node) => ParentLink::to_node(parent_name, node.key.clone()),
                        None => ParentLink::by_name(parent_name),
                    });
                }
                self.store_dao(dao)?;
            }
            return Ok(row_index + consumed);
        }
        Ok(row_index)
    }

    /// Places a produced node in the page forest, merging it under its
    /// resolved parent when one is known.
    fn store_dao(&mut self, dao: DataNode) -> Result<(), MergeError> {
        let Some(link) = dao.parent.clone() else {
            self.page_daos.push(dao);
            return Ok(());
        };
        let Some(key) = link.key.clone() else {
            // Only the parent's name is known; the document-level merge
            // resolves it by name.
            self.page_daos.push(dao);
            return Ok(());
        };

        let position = self
            .page_daos
            .iter()
            .position(|entry| entry.find(&link.name, Some(&key)).is_some());
        if let Some(position) = position {
            match self.page_daos[position].try_merge(dao)? {
                MergeOutcome::Merged => {}
                MergeOutcome::Escalated(dao) => self.page_daos.push(dao),
            }
            return Ok(());
        }

        // The parent was produced on an earlier page: re-materialise its
        // snapshot on this page and let the document merge coalesce the two.
        if let Some(mut snapshot) = self.last_valid_parents.get(&link.name).cloned() {
            snapshot.merge(dao)?;
            self.page_daos.push(snapshot);
            return Ok(());
        }

        let mut stub = DataNode::new(link.name.clone(), key);
        stub.merge(dao)?;
        self.page_daos.push(stub);
        Ok(())
    }

    /// True when the named context has validated at least once on this page.
    pub fn page_valid(&self, name: &str) -> bool {
        self.valid_results.get(name).copied().unwrap_or(false)
    }

    /// True when every required context has validated on this page.
    pub fn all_required_valid(&self) -> bool {
        self.layout
            .contexts()
            .iter()
            .filter(|ctx| ctx.required)
            .all(|ctx| self.valid_results.get(&ctx.name).copied().unwrap_or(false))
    }

    /// Index of the first repeatable context, when any repeatable has not
    /// been checked at this row yet.
    pub fn restartable_repeatable(&self, row_index: usize) -> Option<usize> {
        let unchecked = self
            .layout
            .repeatables()
            .iter()
            .any(|&index| !self.already_checked(index, row_index));
        if unchecked {
            self.layout.repeatables().first().copied()
        } else {
            None
        }
    }

    /// Takes the page's accumulated top-level nodes, leaving the list empty.
    pub fn take_page_daos(&mut self) -> Vec<DataNode> {
        std::mem::take(&mut self.page_daos)
    }

    /// Repeatable bookkeeping by context name.
    pub fn repeat_checks(&self) -> &HashMap<String, RepeatCheck> {
        &self.repeats
    }

    /// Resets all per-page state for the next page. The latest-valid-parent
    /// snapshots survive: row indices change meaning across pages, parents
    /// do not.
    pub fn clear_page_data(&mut self) {
        self.page_daos.clear();
        self.valid_results.clear();
        for check in self.repeats.values_mut() {
            *check = RepeatCheck::default();
        }
        for state in &mut self.states {
            state.clear_run_state();
        }
    }
}
