//! Node expansion
//!
//! Walks a raw LYNX value and pairs every node with its spec. A node's spec
//! comes from its own `spec` property or from the template its parent
//! supplies; its value is either its `value` property or the node itself.
//! Children of one node are expanded concurrently and joined before the
//! node completes, so a failure anywhere fails the whole walk.

use std::collections::BTreeMap;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};

use crate::embedding::{EmbeddingCollector, NodePath};
use crate::error::{LynxError, Result};
use crate::media_type::LYNX_MEDIA_TYPE;
use crate::node::{Member, Metadata, Node, NodeValue};
use crate::resolver::ResolverAdapter;
use crate::spec::{ChildSpec, Spec};

/// Keys with meaning to the parser. They are never expanded as children.
///
/// `spec` and `value` pair a node with its descriptor; `realm`, `base`,
/// `focus` and `context` are document metadata.
pub const RESERVED_KEYS: [&str; 6] = ["spec", "value", "realm", "base", "focus", "context"];

/// Metadata keys copied onto embedded documents
pub const METADATA_KEYS: [&str; 4] = ["realm", "base", "focus", "context"];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Structural kind of a raw value
#[derive(Debug, Clone, Copy)]
pub enum RawKind<'a> {
    Null,
    Scalar(&'a Value),
    Sequence(&'a [Value]),
    Mapping(&'a Map<String, Value>),
}

impl<'a> RawKind<'a> {
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Null => RawKind::Null,
            Value::Array(items) => RawKind::Sequence(items),
            Value::Object(map) => RawKind::Mapping(map),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => RawKind::Scalar(value),
        }
    }
}

/// The value a node describes: `raw.value` when `raw` is a mapping with a
/// `value` property (even `null`), otherwise `raw` itself.
pub fn effective_value(raw: &Value) -> &Value {
    match RawKind::of(raw) {
        RawKind::Mapping(map) => map.get("value").unwrap_or(raw),
        _ => raw,
    }
}

/// Does this mapping declare a LYNX `type`?
fn declares_lynx_type(map: &Map<String, Value>) -> bool {
    map.get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| t.contains(LYNX_MEDIA_TYPE))
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Recursive expansion engine for one parse
pub struct Expander {
    resolver: ResolverAdapter,
    embeddings: EmbeddingCollector,
}

impl Expander {
    pub fn new(resolver: ResolverAdapter) -> Self {
        Self {
            resolver,
            embeddings: EmbeddingCollector::new(),
        }
    }

    /// Paths of every embedded document found so far
    pub fn into_embeddings(self) -> Vec<NodePath> {
        self.embeddings.into_paths()
    }

    /// Expand `raw` into a node, using `template` when it has no spec of
    /// its own.
    pub fn expand<'a>(
        &'a self,
        raw: &'a Value,
        template: Option<ChildSpec<'a>>,
        path: NodePath,
    ) -> BoxFuture<'a, Result<Node>> {
        async move {
            let spec = self.node_spec(raw, template, &path).await?;
            let effective = effective_value(raw);

            let value = match RawKind::of(effective) {
                RawKind::Null | RawKind::Scalar(_) => NodeValue::Leaf(effective.clone()),
                RawKind::Sequence(items) => NodeValue::Sequence(self.expand_items(items, &spec, &path).await?),
                RawKind::Mapping(map) => NodeValue::Mapping(self.expand_members(map, &spec, &path).await?),
            };

            Ok(Node::new(spec, value))
        }
        .boxed()
    }

    /// Work out a node's spec.
    ///
    /// A reference is resolved and used as-is. An inline spec is merged
    /// over an inline template. Without a spec of its own, the node takes
    /// the template (resolving it if it is a reference).
    async fn node_spec(&self, raw: &Value, template: Option<ChildSpec<'_>>, path: &NodePath) -> Result<Spec> {
        let own = match RawKind::of(raw) {
            RawKind::Mapping(map) => map.get("spec").filter(|spec| !spec.is_null()),
            _ => None,
        };

        match own {
            Some(Value::String(reference)) => self.resolver.resolve(reference).await,
            Some(Value::Object(fields)) => {
                let own = Spec::from_fields(fields.clone());

                Ok(match template.and_then(|t| t.inline()) {
                    Some(template) => Spec::merge(template, &own),
                    None => own,
                })
            }
            Some(other) => Err(LynxError::InvalidSpec {
                path: path.to_string(),
                reason: format!("expected a string or an object, found {}", other),
            }),
            None => match template {
                Some(template) => match template.reference() {
                    Some(reference) => self.resolver.resolve(reference).await,
                    None => Ok(template.inline().cloned().unwrap_or_default()),
                },
                None => Ok(Spec::default()),
            },
        }
    }

    /// Items of a sequence always expand, sharing the uniform child spec
    /// if there is one.
    async fn expand_items(&self, items: &[Value], spec: &Spec, path: &NodePath) -> Result<Vec<Node>> {
        let child = spec.child_for_item();
        try_join_all(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| self.expand(item, child, path.item(index))),
        )
        .await
    }

    async fn expand_members(
        &self,
        map: &Map<String, Value>,
        spec: &Spec,
        path: &NodePath,
    ) -> Result<BTreeMap<String, Member>> {
        let members = try_join_all(
            map.iter()
                .filter(|(key, _)| !is_reserved(key))
                .map(|(key, value)| self.dispatch(key, value, map, spec, path)),
        )
        .await?;

        Ok(members.into_iter().collect())
    }

    /// Decide what one property of a mapping becomes
    async fn dispatch(
        &self,
        key: &str,
        value: &Value,
        parent: &Map<String, Value>,
        spec: &Spec,
        path: &NodePath,
    ) -> Result<(String, Member)> {
        let member = if let Some(child) = spec.child_for_property(key) {
            Member::Node(Box::new(self.expand(value, Some(child), path.property(key)).await?))
        } else if key == "data" && value.is_object() && declares_lynx_type(parent) {
            Member::Node(Box::new(self.expand_embedding(value, parent, path.property(key)).await?))
        } else if let (true, Value::Array(items)) = (key == "sources", value) {
            Member::Sources(self.expand_sources(items, &path.property(key)).await?)
        } else {
            Member::Raw(value.clone())
        };

        Ok((key.to_string(), member))
    }

    /// Expand an embedded LYNX payload as a document of its own
    async fn expand_embedding(&self, data: &Value, parent: &Map<String, Value>, path: NodePath) -> Result<Node> {
        let mut node = self.expand(data, None, path.clone()).await?;
        node.embedded = true;

        let [realm, base, focus, context] = METADATA_KEYS.map(|key| string_field(parent, key));
        node.metadata = Metadata { realm, base, focus, context };

        tracing::debug!(path = %path, "Found embedded document");
        self.embeddings.register(path);
        Ok(node)
    }

    /// Each source expands on its own, with no template
    async fn expand_sources(&self, items: &[Value], path: &NodePath) -> Result<Vec<Node>> {
        try_join_all(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| self.expand(item, None, path.item(index))),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::CatalogResolver;
    use serde_json::json;
    use std::sync::Arc;

    fn expander() -> Expander {
        Expander::new(ResolverAdapter::new(None, None))
    }

    #[test]
    fn test_reserved_keys() {
        for key in ["spec", "value", "realm", "base", "focus", "context"] {
            assert!(is_reserved(key), "{} should be reserved", key);
        }
        assert!(!is_reserved("data"));
        assert!(!is_reserved("type"));
    }

    #[test]
    fn test_effective_value() {
        assert_eq!(effective_value(&json!({ "value": null })), &Value::Null);
        assert_eq!(effective_value(&json!({ "value": "" })), &json!(""));
        assert_eq!(effective_value(&json!({ "message": "hi" })), &json!({ "message": "hi" }));
        assert_eq!(effective_value(&json!(["a"])), &json!(["a"]));
        assert_eq!(effective_value(&Value::Null), &Value::Null);
    }

    #[tokio::test]
    async fn test_template_only_node() {
        let expander = expander();
        let template = Spec::with_hints(["text"]).named("message");
        let node = expander
            .expand(&json!("Hello"), Some(ChildSpec::Named(&template)), NodePath::root())
            .await
            .unwrap();

        assert_eq!(node.spec, template);
        assert_eq!(node.value.as_leaf(), Some(&json!("Hello")));
    }

    #[tokio::test]
    async fn test_own_spec_merged_over_template() {
        let expander = expander();
        let template = Spec::with_hints(["container"]).named("foo");
        let raw = json!({ "spec": { "hints": ["text"] }, "value": "Foo" });

        let node = expander
            .expand(&raw, Some(ChildSpec::Named(&template)), NodePath::root())
            .await
            .unwrap();
        assert_eq!(node.spec.name.as_deref(), Some("foo"));
        assert_eq!(node.spec.hint_names(), vec!["text"]);
    }

    #[tokio::test]
    async fn test_referenced_spec_not_merged() {
        let catalog = CatalogResolver::new()
            .with_spec("http://example.com/specs/text", Spec::with_hints(["text"]));
        let expander = Expander::new(ResolverAdapter::new(Some(Arc::new(catalog)), None));
        let template = Spec::with_hints(["container"]).named("foo");
        let raw = json!({ "spec": "http://example.com/specs/text", "value": "Foo" });

        let node = expander
            .expand(&raw, Some(ChildSpec::Named(&template)), NodePath::root())
            .await
            .unwrap();
        assert_eq!(node.spec, Spec::with_hints(["text"]));
    }

    #[tokio::test]
    async fn test_invalid_spec_shape() {
        let expander = expander();
        let err = expander
            .expand(&json!({ "spec": 42, "value": "x" }), None, NodePath::root())
            .await
            .unwrap_err();
        assert!(matches!(err, LynxError::InvalidSpec { .. }));
    }

    #[tokio::test]
    async fn test_null_spec_falls_back_to_template() {
        let expander = expander();
        let template = Spec::with_hints(["text"]);
        let node = expander
            .expand(&json!({ "spec": null, "value": "x" }), Some(ChildSpec::Named(&template)), NodePath::root())
            .await
            .unwrap();
        assert_eq!(node.spec, template);
    }

    #[tokio::test]
    async fn test_embedding_registered() {
        let expander = expander();
        let raw = json!({
            "spec": { "hints": ["content"] },
            "type": "application/lynx+json",
            "realm": "http://example.com/inner/",
            "data": { "spec": { "hints": ["text"] }, "value": "Inner" }
        });

        let node = expander.expand(&raw, None, NodePath::root()).await.unwrap();
        let data = node.value.node("data").unwrap();
        assert!(data.embedded);
        assert_eq!(data.metadata.realm.as_deref(), Some("http://example.com/inner/"));
        assert_eq!(data.metadata.base, None);

        let paths = expander.into_embeddings();
        assert_eq!(paths, vec![NodePath::root().property("data")]);
    }

    #[tokio::test]
    async fn test_data_without_lynx_type_is_raw() {
        let expander = expander();
        let raw = json!({
            "type": "application/json",
            "data": { "value": "not lynx" }
        });

        let node = expander.expand(&raw, None, NodePath::root()).await.unwrap();
        assert_eq!(node.value.get("data").unwrap().as_raw(), Some(&json!({ "value": "not lynx" })));
        assert!(expander.into_embeddings().is_empty());
    }

    #[tokio::test]
    async fn test_off_shape_own_spec_carried_through() {
        let expander = expander();
        let own = json!({ "name": 3, "hints": ["text", 5], "children": [{ "name": "a" }, "http://example.com/s"] });
        let raw = json!({ "spec": own.clone(), "value": "x" });

        let node = expander.expand(&raw, None, NodePath::root()).await.unwrap();
        assert_eq!(serde_json::to_value(&node.spec).unwrap(), own);
        assert_eq!(node.value.as_leaf(), Some(&json!("x")));
    }

    #[tokio::test]
    async fn test_empty_metadata_not_copied_to_embedding() {
        let expander = expander();
        let raw = json!({
            "type": "application/lynx+json",
            "realm": "",
            "focus": "",
            "context": "",
            "base": "http://example.com/inner/",
            "data": { "value": "Inner" }
        });

        let node = expander.expand(&raw, None, NodePath::root()).await.unwrap();
        let data = node.value.node("data").unwrap();
        assert_eq!(data.metadata.realm, None);
        assert_eq!(data.metadata.focus, None);
        assert_eq!(data.metadata.context, None);
        assert_eq!(data.metadata.base.as_deref(), Some("http://example.com/inner/"));
        assert_eq!(
            data.to_json(),
            json!({ "spec": {}, "value": "Inner", "embedded": true, "base": "http://example.com/inner/" })
        );
    }
}
