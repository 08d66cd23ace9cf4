//! The page-by-page format parser.
//!
//! `scan` rotates through the available layouts, page by page: each page is
//! parsed with the current layout's context tree, produced nodes are merged
//! into the document root, and a layout that stops applying mid-document
//! hands over to the other layouts of its family. The rotation aborts when
//! every candidate has been re-checked at the same page without progress.

use std::time::Instant;

use tracing::{debug, info, warn};

use rowscan_layout::{Layout, LayoutStore};
use rowscan_tree::DataNode;

use crate::document::Document;
use crate::options::ScanOptions;
use crate::report::{FormatCheck, ScanOutcome, ScanReport};
use crate::run::LayoutRun;
use crate::ParseError;

/// The layout-driven document parser.
#[derive(Debug)]
pub struct FormatParser {
    /// Layouts in rotation order.
    layouts: Vec<Layout>,
    /// Scan tunables.
    options: ScanOptions,
}

/// Mutable state of one scan.
struct ScanState {
    /// The document tree being accumulated.
    root: DataNode,
    /// Current page index.
    page_index: usize,
    /// First page index past the scanned range.
    end_page: usize,
    /// Per-layout check history, parallel to the parser's layouts.
    checks: Vec<FormatCheck>,
    /// Pages labelled EMPTY.
    empty_pages: Vec<usize>,
}

impl FormatParser {
    /// Creates a parser over a layout store with default options.
    pub fn new(store: LayoutStore) -> Self {
        Self::with_options(store, ScanOptions::default())
    }

    /// Creates a parser with explicit options.
    pub fn with_options(store: LayoutStore, options: ScanOptions) -> Self {
        Self {
            layouts: store.into_layouts(),
            options,
        }
    }

    /// The layouts in rotation order.
    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    /// Scans a document: picks layouts, parses pages, merges the produced
    /// nodes into a single root.
    ///
    /// Layout non-matches are recorded in the report and drive the rotation;
    /// only configuration errors (and the per-context budget) abort.
    pub fn scan(&self, document: &Document) -> Result<ScanOutcome, ParseError> {
        let page_count = document.page_count();
        let (start, end) = match &self.options.page_range {
            Some(range) => (range.start.min(page_count), range.end.min(page_count)),
            None => (0, page_count),
        };

        let mut state = ScanState {
            root: DataNode::new("root", ""),
            page_index: start,
            end_page: end,
            checks: self
                .layouts
                .iter()
                .map(|layout| FormatCheck::new(layout.name()))
                .collect(),
            empty_pages: Vec::new(),
        };

        let mut candidates: Vec<usize> = (0..self.layouts.len())
            .filter(|&index| {
                self.options
                    .family_filter
                    .as_deref()
                    .is_none_or(|family| self.layouts[index].family() == family)
            })
            .collect();

        let mut result_format: Option<String> = None;
        let mut rotation = 0usize;

        loop {
            // EMPTY pages are skipped without consuming a layout attempt.
            while state.page_index < state.end_page
                && document.page(state.page_index).is_empty()
            {
                info!(page = state.page_index, "empty page, skipping");
                state.empty_pages.push(state.page_index);
                state.page_index += 1;
            }
            if state.page_index >= state.end_page || candidates.is_empty() {
                break;
            }
            if candidates
                .iter()
                .all(|&index| state.checks[index].last_check == Some(state.page_index))
            {
                warn!(page = state.page_index, "no layout matches this page");
                break;
            }

            let pick = candidates[rotation % candidates.len()];
            rotation += 1;
            if state.checks[pick].last_check == Some(state.page_index) {
                continue;
            }

            let matched = self.parse_layout(pick, document, &mut state)?;
            if matched {
                let layout = &self.layouts[pick];
                result_format = Some(layout.name().to_string());
                // Later pages only rotate within the winning family.
                let family = layout.family().to_string();
                candidates.retain(|&index| self.layouts[index].family() == family);
            }
        }

        info!(
            result = result_format.as_deref().unwrap_or("<none>"),
            pages = page_count,
            "scan finished"
        );
        Ok(ScanOutcome {
            root: state.root,
            report: ScanReport {
                result_format,
                checks: state.checks,
                pages: page_count,
                empty_pages: state.empty_pages,
            },
        })
    }

    /// Parses consecutive pages with one layout until it stops applying.
    ///
    /// Returns true when at least one page validated.
    fn parse_layout(
        &self,
        pick: usize,
        document: &Document,
        state: &mut ScanState,
    ) -> Result<bool, ParseError> {
        let layout = &self.layouts[pick];
        let mut run = LayoutRun::new(layout);
        let mut matched_any = false;
        debug!(layout = layout.name(), page = state.page_index, "trying layout");

        'pages: while state.page_index < state.end_page {
            state.checks[pick].last_check = Some(state.page_index);
            let page = document.page(state.page_index);
            if page.is_empty() {
                info!(page = state.page_index, "empty page, skipping");
                state.empty_pages.push(state.page_index);
                state.page_index += 1;
                run.clear_page_data();
                continue;
            }
            let rows = page.rows();
            let order_len = layout.contexts().len();
            let mut ctx_index = 0usize;
            let mut row_index = 0usize;

            while ctx_index < order_len {
                let def = &layout.contexts()[ctx_index];
                let started = Instant::now();
                let valid = run.validate(ctx_index, rows, row_index);
                if started.elapsed() > self.options.context_budget {
                    return Err(ParseError::PathologicalPattern {
                        context: def.name.clone(),
                        budget: self.options.context_budget,
                    });
                }
                let before = row_index;
                row_index = run.progress_row_and_store(row_index, valid, ctx_index)?;
                debug!(
                    context = def.name.as_str(),
                    row = before,
                    valid,
                    consumed = row_index - before,
                    "context checked"
                );

                // Next-state decision, first match wins.
                if !valid {
                    let prev_repeat =
                        ctx_index > 0 && layout.contexts()[ctx_index - 1].repeat;
                    let parent_index = def.parent.as_ref().and_then(|parent| parent.index);
                    if def.required
                        && !def.repeat
                        && !prev_repeat
                        && def.parent.is_none()
                        && !run.page_valid(&def.name)
                    {
                        // A hard requirement failed with no way to recover:
                        // the layout stops applying here.
                        break;
                    } else if let Some(parent_index) = parent_index
                        && layout.contexts()[parent_index].required
                        && !run.already_checked(parent_index, row_index)
                    {
                        ctx_index = parent_index;
                    } else if prev_repeat && !run.already_checked(ctx_index - 1, row_index) {
                        ctx_index -= 1;
                    } else {
                        ctx_index += 1;
                    }
                } else if row_index == before {
                    // Valid but nothing consumed: revisiting cannot progress.
                    ctx_index += 1;
                }
                // A consuming valid context stays current, so repeatables and
                // parent producers may match again on the next row.

                // Fragmented pages: fold finished nodes into the root as soon
                // as every required context has validated.
                if run.all_required_valid() {
                    for dao in run.take_page_daos() {
                        state.root.merge(dao)?;
                    }
                }

                // Page break.
                if valid
                    && run.all_required_valid()
                    && (row_index >= rows.len() || def.eop)
                {
                    info!(
                        layout = layout.name(),
                        page = state.page_index,
                        "page matched"
                    );
                    state.checks[pick].valid = true;
                    state.checks[pick].valid_at.push(state.page_index);
                    matched_any = true;
                    state.page_index += 1;
                    run.clear_page_data();
                    continue 'pages;
                }

                // Rows remain but the order is exhausted: restart from the
                // first repeatable that has not seen this row yet.
                if ctx_index >= order_len
                    && row_index < rows.len()
                    && let Some(restart) = run.restartable_repeatable(row_index)
                {
                    ctx_index = restart;
                }
            }

            // The context order ran out without completing the page.
            warn!(
                layout = layout.name(),
                page = state.page_index,
                "layout stopped applying"
            );
            run.clear_page_data();
            return Ok(matched_any);
        }
        Ok(matched_any)
    }
}
