//! Scan results and reporting.

use serde::Serialize;

use rowscan_tree::DataNode;

/// Check history of one layout during a scan.
#[derive(Debug, Clone, Serialize)]
pub struct FormatCheck {
    /// The layout name.
    pub layout: String,
    /// Whether the layout validated at least one page.
    pub valid: bool,
    /// Last page index the layout was checked at.
    pub last_check: Option<usize>,
    /// Page indices the layout validated, in scan order.
    pub valid_at: Vec<usize>,
}

impl FormatCheck {
    /// A check record for a layout that has not been tried yet.
    pub(crate) fn new(layout: impl Into<String>) -> Self {
        Self {
            layout: layout.into(),
            valid: false,
            last_check: None,
            valid_at: Vec::new(),
        }
    }
}

/// Summary of a document scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Name of the winning layout, when any page matched.
    pub result_format: Option<String>,
    /// Per-layout check history, in rotation order.
    pub checks: Vec<FormatCheck>,
    /// Total pages in the document.
    pub pages: usize,
    /// Indices of pages labelled EMPTY and skipped.
    pub empty_pages: Vec<usize>,
}

/// Everything a scan produces: the merged document tree and the report.
///
/// On partial success the tree holds whatever pages matched.
#[derive(Debug)]
pub struct ScanOutcome {
    /// The merged document hierarchy.
    pub root: DataNode,
    /// The scan report.
    pub report: ScanReport,
}
