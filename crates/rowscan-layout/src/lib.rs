//! Declarative layout descriptions for rowscan.
//!
//! A layout is a named, ordered tree of context and field definitions that
//! describes how to extract one specific document format. Layouts are written
//! as YAML: the top level has exactly one entry whose key is the layout name
//! and whose value is the ordered sequence of context definitions.
//!
//! ```yaml
//! meeting.results:
//!   - name: header
//!     fields:
//!       - name: title
//!         format: "^\\s*(.+?)\\s*$"
//!   - name: event
//!     repeat: true
//!     format: "^Event\\s+(\\d+)"
//! ```
//!
//! Loading is strict: an unknown mapping key, an unknown transform name, an
//! unresolvable parent or alias reference, or an invalid regex is a
//! [`LayoutError`]. A bad description is a configuration mistake, not an
//! input condition.

#![warn(missing_docs)]

mod context;
mod error;
mod field;
mod layout;
mod raw;
mod store;
mod transform;
mod validate;

pub use context::{ContextDef, ParentRef};
pub use error::LayoutError;
pub use field::FieldDef;
pub use layout::Layout;
pub use store::LayoutStore;
pub use transform::{Buffer, Transform, apply_chain};
pub use validate::LayoutWarning;
