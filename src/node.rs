//! Expanded node types
//!
//! The parser's output mirrors the raw content, except that every value is
//! paired with its spec.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::spec::Spec;

/// A value paired with its spec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub spec: Spec,
    pub value: NodeValue,

    /// Set on nodes parsed from an embedded LYNX payload
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub embedded: bool,

    /// Document-level metadata; only ever populated on embeddings
    #[serde(flatten)]
    pub metadata: Metadata,
}

/// The value half of a node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeValue {
    Sequence(Vec<Node>),
    Mapping(BTreeMap<String, Member>),
    Leaf(Value),
}

/// One property of a mapping value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Member {
    /// A property that was expanded into a node
    Node(Box<Node>),
    /// A `sources` list, each entry expanded independently
    Sources(Vec<Node>),
    /// A property copied through untouched
    Raw(Value),
}

/// Realm, base, focus and context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Node {
    pub fn new(spec: Spec, value: NodeValue) -> Self {
        Self {
            spec,
            value,
            embedded: false,
            metadata: Metadata::default(),
        }
    }

    /// Serialize to the normalized JSON shape
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl NodeValue {
    /// Property lookup on a mapping value
    pub fn get(&self, key: &str) -> Option<&Member> {
        match self {
            NodeValue::Mapping(members) => members.get(key),
            _ => None,
        }
    }

    /// Expanded child node for a property
    pub fn node(&self, key: &str) -> Option<&Node> {
        self.get(key).and_then(Member::as_node)
    }

    /// Item lookup on a sequence value
    pub fn item(&self, index: usize) -> Option<&Node> {
        match self {
            NodeValue::Sequence(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            NodeValue::Leaf(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            NodeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Member>> {
        match self {
            NodeValue::Mapping(members) => Some(members),
            _ => None,
        }
    }
}

impl Member {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Member::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_sources(&self) -> Option<&[Node]> {
        match self {
            Member::Sources(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            Member::Raw(value) => Some(value),
            _ => None,
        }
    }
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.realm.is_none() && self.base.is_none() && self.focus.is_none() && self.context.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_node_serializes_spec_and_value_only() {
        let node = Node::new(Spec::with_hints(["text"]), NodeValue::Leaf(json!("Hello")));
        assert_eq!(node.to_json(), json!({ "spec": { "hints": ["text"] }, "value": "Hello" }));
    }

    #[test]
    fn test_embedding_serializes_flag_and_metadata() {
        let mut node = Node::new(Spec::new(), NodeValue::Leaf(Value::Null));
        node.embedded = true;
        node.metadata.base = Some("http://example.com/".to_string());

        assert_eq!(
            node.to_json(),
            json!({ "spec": {}, "value": null, "embedded": true, "base": "http://example.com/" })
        );
    }

    #[test]
    fn test_mapping_members() {
        let mut members = BTreeMap::new();
        members.insert(
            "message".to_string(),
            Member::Node(Box::new(Node::new(Spec::new(), NodeValue::Leaf(json!("Hi"))))),
        );
        members.insert("href".to_string(), Member::Raw(json!("http://example.com")));
        let value = NodeValue::Mapping(members);

        assert_eq!(value.node("message").unwrap().value.as_leaf(), Some(&json!("Hi")));
        assert_eq!(value.get("href").unwrap().as_raw(), Some(&json!("http://example.com")));
        assert!(value.node("href").is_none());
        assert!(value.item(0).is_none());
    }
}
