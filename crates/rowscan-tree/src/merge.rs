//! Recursive merge of independently produced node subtrees.
//!
//! Two subtrees produced from separate pages of one document must coalesce
//! into a single hierarchy without duplication. The merge resolves each
//! source node's destination parent inside the target subtree, combines
//! nodes that are structurally equal, and appends genuinely new rows in the
//! order the merge calls arrive.

use thiserror::Error;

use crate::node::{DataNode, is_footer_like, is_header_like};

/// Errors raised while merging node subtrees.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The destination parent of a node could not be resolved anywhere in the
    /// target subtree. This indicates a structural mistake in the layout
    /// description (a parent declared after its child, or an unknown context
    /// named as parent).
    #[error("destination parent '{parent}' not found while merging '{node}'")]
    ParentNotFound {
        /// Name of the node being merged.
        node: String,
        /// Parent name recorded on the node.
        parent: String,
    },
}

/// Outcome of [`DataNode::try_merge`].
#[derive(Debug)]
pub enum MergeOutcome {
    /// The source was absorbed into this subtree.
    Merged,
    /// The destination parent lies outside this subtree. The source is
    /// handed back unchanged so the caller can retry from an enclosing root.
    Escalated(DataNode),
}

impl DataNode {
    /// Merges `source` into this subtree.
    ///
    /// Escalation past a node with no parent is a structural error, so when
    /// called on a root (or any chain top) this either succeeds or fails
    /// with [`MergeError::ParentNotFound`].
    pub fn merge(&mut self, source: Self) -> Result<(), MergeError> {
        match self.try_merge(source)? {
            MergeOutcome::Merged => Ok(()),
            MergeOutcome::Escalated(source) => {
                let parent = source
                    .parent
                    .as_ref()
                    .map(|link| link.name.clone())
                    .unwrap_or_default();
                Err(MergeError::ParentNotFound {
                    node: source.name,
                    parent,
                })
            }
        }
    }

    /// Merges `source` into this subtree, handing it back when its
    /// destination parent lives outside the subtree and this node itself has
    /// a recorded parent (so an enclosing root may still resolve it).
    pub fn try_merge(&mut self, source: Self) -> Result<MergeOutcome, MergeError> {
        // Equal nodes coalesce: overlay fields, absorb children one by one.
        if self.same_node(&source) {
            self.merge_fields_from(&source);
            for child in source.rows {
                self.merge(child)?;
            }
            return Ok(MergeOutcome::Merged);
        }

        // A header or footer arriving under a new key is still the same
        // cross-page entity: overlay its fields and absorb its children.
        if is_header_like(&source.name) || is_footer_like(&source.name) {
            let wants_header = is_header_like(&source.name);
            if let Some(existing) = self.find_section_mut(wants_header)
                && existing.key != source.key
            {
                existing.merge_fields_from(&source);
                for child in source.rows {
                    existing.merge(child)?;
                }
                return Ok(MergeOutcome::Merged);
            }
        }

        let link = source.parent.clone();
        let target_is_self = match &link {
            None => true,
            Some(link) => {
                self.parent.is_none()
                    && link.key.is_none()
                    && (link.name == self.name || link.name.is_empty())
            }
        };

        let target_found = target_is_self
            || link
                .as_ref()
                .is_some_and(|link| self.find(&link.name, link.key.as_deref()).is_some());

        if !target_found {
            let Some(link) = link else {
                // Unreachable: a missing link always selects self.
                return Ok(MergeOutcome::Merged);
            };
            if let Some(parent_key) = &link.key {
                if self.parent.is_some() {
                    // The parent may exist in an enclosing subtree.
                    return Ok(MergeOutcome::Escalated(source));
                }
                // Graft the missing ancestor, inferred from the recorded
                // link. The real ancestor, if produced later, coalesces with
                // this one by name and key.
                let mut ancestor = Self::new(link.name.clone(), parent_key.clone());
                ancestor.rows.push(source);
                self.merge(ancestor)?;
                return Ok(MergeOutcome::Merged);
            }
            return Err(MergeError::ParentNotFound {
                node: source.name,
                parent: link.name,
            });
        }

        // A node equal to the source anywhere in the subtree wins over the
        // resolved target: merge into it instead of appending a duplicate.
        if self.find_existing(&source).is_some() {
            if let Some(existing) = self.find_mut(&source.name, Some(&source.key)) {
                return existing.try_merge(source);
            }
            return Ok(MergeOutcome::Merged);
        }

        if target_is_self {
            self.rows.push(source);
        } else if let Some(link) = &link
            && let Some(target) = self.find_mut(&link.name, link.key.as_deref())
        {
            target.rows.push(source);
        }
        Ok(MergeOutcome::Merged)
    }

    /// Finds a header-like (or footer-like) node in this subtree.
    fn find_section_mut(&mut self, header: bool) -> Option<&mut Self> {
        let hit = if header {
            is_header_like(&self.name)
        } else {
            is_footer_like(&self.name)
        };
        if hit {
            return Some(self);
        }
        self.rows
            .iter_mut()
            .find_map(|row| row.find_section_mut(header))
    }
}
