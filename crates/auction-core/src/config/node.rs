//! Configuration tree
//!
//! A node has a tag, string attributes and ordered children. Servers own
//! the shape of their own sub-trees; the manager only reads the `server`
//! tag and the `NAME` attribute.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of a persisted configuration tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    tag: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// Create an empty node with the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value, or `None` if absent
    pub fn property(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Attribute value, or `default` if absent
    pub fn property_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.property(key).unwrap_or(default)
    }

    /// Set an attribute, replacing any previous value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Append a child node
    pub fn add_child(&mut self, child: ConfigNode) {
        self.children.push(child);
    }

    /// Child nodes in document order
    pub fn children(&self) -> &[ConfigNode] {
        &self.children
    }

    /// Builder form of [`set_property`](Self::set_property)
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Builder form of [`add_child`](Self::add_child)
    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.add_child(child);
        self
    }
}
