// SPDX-License-Identifier: MIT OR Apache-2.0
//! The parameter tree consumed by the renderer.
//!
//! Leaves are opaque to the sequencer; it only reads and writes them by
//! dot-path (`"bloom.strength"`).

use crate::keyframe::ParamValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A nested parameter tree. The root is always a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTree(Value);

impl ConfigTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Wrap a JSON value. Non-object roots become an empty tree.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => Self(value),
            _ => Self::new(),
        }
    }

    /// Borrow the underlying JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the underlying JSON value
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Look up a node by dot-path
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |node, segment| node.as_object()?.get(segment))
    }

    /// Write a value at a dot-path.
    ///
    /// Missing intermediate nodes are created and non-object intermediates are
    /// replaced, so a misspelt path produces a new unused branch rather than
    /// an error.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) {
        let mut segments = path.split('.').peekable();
        let mut node = &mut self.0;
        while let Some(segment) = segments.next() {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else {
                return;
            };
            if segments.peek().is_none() {
                map.insert(segment.to_owned(), value.into());
                return;
            }
            node = map
                .entry(segment.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    /// Write a parameter leaf at a dot-path
    pub fn set_param(&mut self, path: &str, value: &ParamValue) {
        self.set_path(path, Value::from(value.clone()));
    }

    /// Read the identifier stored at `path` as a string, if any.
    ///
    /// Used to tell which visual program a config selects. Numbers and
    /// booleans are rendered to text; objects are summarised by their `id`
    /// or `name` child.
    pub fn category(&self, path: &str) -> Option<String> {
        match self.get_path(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Object(map) => map
                .get("id")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .map(str::to_owned),
            Value::Array(_) | Value::Null => None,
        }
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Value> for ConfigTree {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_and_set_nested() {
        let mut tree = ConfigTree::from_value(json!({ "bloom": { "strength": 1.0 } }));
        assert_eq!(tree.get_path("bloom.strength"), Some(&json!(1.0)));

        tree.set_path("bloom.strength", 2.5);
        tree.set_path("text.content", "hi");
        assert_eq!(tree.get_path("bloom.strength"), Some(&json!(2.5)));
        assert_eq!(tree.get_path("text.content"), Some(&json!("hi")));
    }

    #[test]
    fn test_set_path_is_permissive() {
        let mut tree = ConfigTree::from_value(json!({ "leaf": 3 }));
        tree.set_path("leaf.child.deep", true);
        assert_eq!(tree.get_path("leaf.child.deep"), Some(&json!(true)));

        tree.set_path("typo.path", 1);
        assert!(tree.get_path("typo").is_some());
    }

    #[test]
    fn test_missing_path() {
        let tree = ConfigTree::new();
        assert!(tree.get_path("a.b").is_none());
    }

    #[test]
    fn test_non_object_root_becomes_empty() {
        let tree = ConfigTree::from_value(json!([1, 2, 3]));
        assert_eq!(tree, ConfigTree::new());
    }

    #[test]
    fn test_category_reads_identifier() {
        let tree = ConfigTree::from_value(json!({
            "shader": "plasma",
            "overlay": { "id": "title-card" },
            "count": 4
        }));
        assert_eq!(tree.category("shader").as_deref(), Some("plasma"));
        assert_eq!(tree.category("overlay").as_deref(), Some("title-card"));
        assert_eq!(tree.category("count").as_deref(), Some("4"));
        assert_eq!(tree.category("missing"), None);
    }
}
