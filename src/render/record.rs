//! Per-node field map handed to templates.

use crate::escape::{clean_encoding, escape};
use crate::template::Field;
use crate::tree::Node;
use serde::Serialize;
use std::collections::BTreeMap;

/// Fields a template sees as `content`.
///
/// Built fresh for every rendered node and dropped once its template has
/// produced output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContentRecord {
    fields: BTreeMap<String, Field>,
}

impl ContentRecord {
    /// Seed a record from a node: its attributes, then `tag`, `class` and
    /// the escaped `tail`. `text` is left for the variant to fill in.
    pub fn seed(node: &Node) -> Self {
        let mut record = Self::default();
        for (name, value) in &node.attrs {
            record.insert(name.as_str(), value.as_str());
        }
        record.insert("tag", node.local_name());
        record.insert("class", node.class());
        record.insert("tail", escape(&clean_encoding(&node.tail)));
        record
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Field>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Text value of a field, empty when absent or not text.
    pub fn text(&self, name: &str) -> &str {
        self.get(name).and_then(Field::as_text).unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}
