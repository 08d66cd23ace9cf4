//! The data node structure and lookup helpers.
//!
//! Nodes form a tree with unique ownership: each node owns its child rows and
//! carries a non-owning [`ParentLink`] recording the name (and, when the
//! parent was actually produced, the key) of its destination parent. The link
//! survives merges across pages where the parent node itself was not
//! re-produced, e.g. a non-repeated page header.

use serde::{Serialize, Serializer};

/// Non-owning reference from a node to its destination parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    /// Name of the parent context.
    pub name: String,
    /// Key of the parent node, when the parent was produced at link time.
    ///
    /// `None` means only the declaration-level parent name is known.
    pub key: Option<String>,
}

impl ParentLink {
    /// Creates a name-only link (the parent node was not produced).
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
        }
    }

    /// Creates a link to a produced parent node.
    pub fn to_node(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: Some(key.into()),
        }
    }
}

/// A hierarchical data node produced by a successful context match.
///
/// Serialises to `{name, key, fields, rows}`; the parent link is an internal
/// merge aid and is not part of the output shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataNode {
    /// Effective (post-alias) context name.
    pub name: String,
    /// Composite key: the context's chosen extracted values joined with `|`.
    pub key: String,
    /// Destination parent reference, if any.
    #[serde(skip)]
    pub parent: Option<ParentLink>,
    /// Extracted values in insertion order.
    #[serde(serialize_with = "serialize_fields")]
    pub fields: Vec<(String, String)>,
    /// Child nodes in the order they were merged in.
    pub rows: Vec<Self>,
}

/// Serialises the ordered field list as a JSON map.
fn serialize_fields<S>(fields: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(fields.iter().map(|(name, value)| (name, value)))
}

/// Returns true when the name designates a page-header entity.
pub(crate) fn is_header_like(name: &str) -> bool {
    name.contains("header")
}

/// Returns true when the name designates a page-footer entity.
pub(crate) fn is_footer_like(name: &str) -> bool {
    name.contains("footer")
}

impl DataNode {
    /// Creates a node with no parent, fields or rows.
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            parent: None,
            fields: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Structural equality used by the merge: same name and key, or both
    /// header-like, or both footer-like. Header and footer entities are a
    /// single logical node across pages regardless of their keys.
    pub fn same_node(&self, other: &Self) -> bool {
        (self.name == other.name && self.key == other.key)
            || (is_header_like(&self.name) && is_header_like(&other.name))
            || (is_footer_like(&self.name) && is_footer_like(&other.name))
    }

    /// Match against a `(name, key)` pair; a `None` key matches by name only.
    pub(crate) fn matches(&self, name: &str, key: Option<&str>) -> bool {
        match key {
            Some(key) => {
                (self.name == name && self.key == key)
                    || (is_header_like(&self.name) && is_header_like(name))
                    || (is_footer_like(&self.name) && is_footer_like(name))
            }
            None => self.name == name,
        }
    }

    /// Finds self or a descendant matching `(name, key)`, pre-order.
    pub fn find(&self, name: &str, key: Option<&str>) -> Option<&Self> {
        if self.matches(name, key) {
            return Some(self);
        }
        self.rows.iter().find_map(|row| row.find(name, key))
    }

    /// Mutable variant of [`Self::find`].
    pub fn find_mut(&mut self, name: &str, key: Option<&str>) -> Option<&mut Self> {
        if self.matches(name, key) {
            return Some(self);
        }
        self.rows.iter_mut().find_map(|row| row.find_mut(name, key))
    }

    /// Finds self or a descendant that is [`Self::same_node`] as `other`.
    pub fn find_existing(&self, other: &Self) -> Option<&Self> {
        self.find(&other.name, Some(&other.key))
    }

    /// Returns the value of a field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Inserts or overwrites a field, preserving insertion order.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(field, _)| *field == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Overlays another node's fields onto this one (source overwrites).
    pub fn merge_fields_from(&mut self, other: &Self) {
        for (name, value) in &other.fields {
            self.set_field(name.clone(), value.clone());
        }
    }

    /// Total number of nodes in this subtree, including self.
    pub fn node_count(&self) -> usize {
        1 + self.rows.iter().map(Self::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, key: &str) -> DataNode {
        DataNode::new(name, key)
    }

    #[test]
    fn test_same_node_by_name_and_key() {
        let a = node("event", "100 Free");
        let b = node("event", "100 Free");
        let c = node("event", "200 Back");
        assert!(a.same_node(&b));
        assert!(!a.same_node(&c));
        assert!(!a.same_node(&node("category", "100 Free")));
    }

    #[test]
    fn test_same_node_header_footer_equivalence() {
        assert!(node("event_header", "a").same_node(&node("header", "b")));
        assert!(node("footer", "x").same_node(&node("page_footer", "y")));
        assert!(!node("event_header", "a").same_node(&node("footer", "a")));
    }

    #[test]
    fn test_find_descends_in_preorder() {
        let mut root = node("root", "");
        let mut event = node("event", "100 Free");
        event.rows.push(node("category", "M45"));
        root.rows.push(event);

        assert!(root.find("category", Some("M45")).is_some());
        assert!(root.find("category", Some("M50")).is_none());
        // Name-only lookup ignores the key.
        assert!(root.find("category", None).is_some());
    }

    #[test]
    fn test_find_mut_returns_self_on_match() {
        let mut event = node("event", "100 Free");
        let found = event.find_mut("event", Some("100 Free")).unwrap();
        found.set_field("pool", "25m");
        assert_eq!(event.field("pool"), Some("25m"));
    }

    #[test]
    fn test_set_field_overwrites_in_place() {
        let mut header = node("header", "k");
        header.set_field("title", "Meeting A");
        header.set_field("date", "2024-01-06");
        header.set_field("title", "Meeting B");
        assert_eq!(
            header.fields,
            vec![
                ("title".to_string(), "Meeting B".to_string()),
                ("date".to_string(), "2024-01-06".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_fields_from_overwrites_and_appends() {
        let mut target = node("header", "a");
        target.set_field("title", "old");
        let mut source = node("header", "b");
        source.set_field("title", "new");
        source.set_field("place", "pool");

        target.merge_fields_from(&source);
        assert_eq!(target.field("title"), Some("new"));
        assert_eq!(target.field("place"), Some("pool"));
    }

    #[test]
    fn test_serialize_shape() {
        let mut root = node("root", "");
        let mut event = node("event", "100 Free");
        event.set_field("distance", "100");
        event.parent = Some(ParentLink::by_name("header"));
        root.rows.push(event);

        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "root",
                "key": "",
                "fields": {},
                "rows": [{
                    "name": "event",
                    "key": "100 Free",
                    "fields": {"distance": "100"},
                    "rows": [],
                }],
            })
        );
    }

    #[test]
    fn test_node_count() {
        let mut root = node("root", "");
        let mut event = node("event", "e");
        event.rows.push(node("result", "r1"));
        event.rows.push(node("result", "r2"));
        root.rows.push(event);
        assert_eq!(root.node_count(), 4);
    }
}
