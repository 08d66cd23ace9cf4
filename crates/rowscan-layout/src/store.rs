//! Layout discovery.
//!
//! A store holds every layout description available to a scan, in a stable
//! order. Directory stores enumerate `*.yml`/`*.yaml` files sorted by file
//! name; in-memory stores keep the order they were given. The scan rotation
//! relies on both orderings being deterministic.

use std::fs;
use std::path::Path;

use crate::layout::Layout;
use crate::LayoutError;

/// An ordered collection of loaded layouts.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    /// Layouts in rotation order.
    layouts: Vec<Layout>,
}

impl LayoutStore {
    /// Loads every layout description in a directory, sorted by file name.
    ///
    /// Only `*.yml` and `*.yaml` entries are considered; an empty result is
    /// an error since a scan with no layouts can never match anything.
    pub fn load_dir(dir: &Path) -> Result<Self, LayoutError> {
        let entries = fs::read_dir(dir).map_err(|source| LayoutError::ReadFile {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<_> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yml" | "yaml")
                )
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(LayoutError::NoLayouts {
                dir: dir.to_path_buf(),
            });
        }

        let layouts = paths
            .iter()
            .map(|path| Layout::from_file(path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { layouts })
    }

    /// Builds a store from already loaded layouts, preserving their order.
    pub fn from_layouts(layouts: Vec<Layout>) -> Self {
        Self { layouts }
    }

    /// The layouts in rotation order.
    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    /// Consumes the store, yielding the layouts in rotation order.
    pub fn into_layouts(self) -> Vec<Layout> {
        self.layouts
    }

    /// Distinct families in order of first appearance.
    pub fn families(&self) -> Vec<&str> {
        let mut families: Vec<&str> = Vec::new();
        for layout in &self.layouts {
            if !families.contains(&layout.family()) {
                families.push(layout.family());
            }
        }
        families
    }
}
