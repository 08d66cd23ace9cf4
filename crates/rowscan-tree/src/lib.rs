//! Hierarchical data nodes for rowscan.
//!
//! A successful context match during a layout scan produces a [`DataNode`]: a
//! named, keyed record holding a flat field map and an ordered list of child
//! rows. Nodes produced on different pages of the same document are coalesced
//! into a single document tree by [`DataNode::merge`], which combines equal
//! subtrees instead of duplicating them.

#![warn(missing_docs)]

mod merge;
mod node;

pub use merge::{MergeError, MergeOutcome};
pub use node::{DataNode, ParentLink};
