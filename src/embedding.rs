//! Embedding collection
//!
//! Embedded documents are discovered while sibling branches expand
//! concurrently. Each discovery is recorded as a path from the root so the
//! assembler can stamp metadata once the tree is complete.

use std::fmt;
use std::sync::Mutex;

use crate::node::{Member, Node, NodeValue};

/// One step from a node to a child node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Property(String),
    Item(usize),
}

/// Location of a node relative to the document root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath(Vec<Step>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn property(&self, key: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(Step::Property(key.to_string()));
        Self(steps)
    }

    pub fn item(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(Step::Item(index));
        Self(steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.0 {
            match step {
                Step::Property(key) => write!(f, ".{}", key)?,
                Step::Item(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Accumulates embedding locations across concurrent branches
#[derive(Debug, Default)]
pub struct EmbeddingCollector {
    paths: Mutex<Vec<NodePath>>,
}

impl EmbeddingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an embedding. The lock is never held across an await.
    pub fn register(&self, path: NodePath) {
        let mut paths = self.paths.lock().unwrap_or_else(|e| e.into_inner());
        paths.push(path);
    }

    /// Consume the collector, returning every registered path
    pub fn into_paths(self) -> Vec<NodePath> {
        self.paths.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

/// Walk from `node` along `path`.
///
/// A `sources` member is a list of nodes, so the step after
/// `Property("sources")` is the item index within it.
pub fn node_at_mut<'a>(node: &'a mut Node, path: &[Step]) -> Option<&'a mut Node> {
    let Some((first, rest)) = path.split_first() else {
        return Some(node);
    };

    match (first, &mut node.value) {
        (Step::Property(key), NodeValue::Mapping(members)) => match members.get_mut(key)? {
            Member::Node(child) => node_at_mut(child, rest),
            Member::Sources(nodes) => {
                let (Step::Item(index), rest) = rest.split_first()? else {
                    return None;
                };
                node_at_mut(nodes.get_mut(*index)?, rest)
            }
            Member::Raw(_) => None,
        },
        (Step::Item(index), NodeValue::Sequence(items)) => node_at_mut(items.get_mut(*index)?, rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn leaf(value: serde_json::Value) -> Node {
        Node::new(Spec::new(), NodeValue::Leaf(value))
    }

    #[test]
    fn test_path_display() {
        let path = NodePath::root().property("items").item(2).property("data");
        assert_eq!(path.to_string(), "$.items[2].data");
    }

    #[test]
    fn test_collector_keeps_every_registration() {
        let collector = EmbeddingCollector::new();
        collector.register(NodePath::root().property("data"));
        collector.register(NodePath::root().item(0).property("data"));
        assert_eq!(collector.into_paths().len(), 2);
    }

    #[test]
    fn test_node_at_mut_through_sources() {
        let mut members = BTreeMap::new();
        members.insert("sources".to_string(), Member::Sources(vec![leaf(json!("a")), leaf(json!("b"))]));
        members.insert("href".to_string(), Member::Raw(json!("/foo")));
        let mut root = Node::new(Spec::new(), NodeValue::Mapping(members));

        let path = NodePath::root().property("sources").item(1);
        let found = node_at_mut(&mut root, path.steps()).unwrap();
        assert_eq!(found.value.as_leaf(), Some(&json!("b")));

        assert!(node_at_mut(&mut root, NodePath::root().property("href").steps()).is_none());
        assert!(node_at_mut(&mut root, NodePath::root().property("sources").steps()).is_none());
    }

    #[test]
    fn test_node_at_mut_through_sequence() {
        let mut root = Node::new(Spec::new(), NodeValue::Sequence(vec![leaf(json!(1)), leaf(json!(2))]));
        let found = node_at_mut(&mut root, NodePath::root().item(0).steps()).unwrap();
        assert_eq!(found.value.as_leaf(), Some(&json!(1)));
        assert!(node_at_mut(&mut root, NodePath::root().item(5).steps()).is_none());
    }
}
