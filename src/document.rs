//! Document assembly
//!
//! Entry point of the parser. Computes document metadata, expands the root
//! node and stamps metadata onto every embedded document.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::embedding::{node_at_mut, NodePath};
use crate::error::Result;
use crate::expand::Expander;
use crate::media_type::{MediaType, LYNX_MEDIA_TYPE};
use crate::node::{Metadata, Node, NodeValue};
use crate::resolver::{ResolverAdapter, SpecResolver};
use crate::spec::Spec;

/// Options for a single parse
#[derive(Clone, Default)]
pub struct ParseOptions {
    /// Transport media type; its `realm` and `base` parameters are fallbacks
    pub media_type: Option<String>,
    /// Where the document was loaded from; the last-resort base
    pub location: Option<String>,
    /// Required as soon as any spec is given by reference
    pub resolver: Option<Arc<dyn SpecResolver>>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_resolver(mut self, resolver: impl SpecResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_shared_resolver(mut self, resolver: Arc<dyn SpecResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("media_type", &self.media_type)
            .field("location", &self.location)
            .field("resolver", &self.resolver.as_ref().map(|_| "<resolver>"))
            .finish()
    }
}

/// A parsed LYNX document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(flatten)]
    pub root: Node,
    #[serde(flatten)]
    pub metadata: Metadata,
}

impl Document {
    pub fn spec(&self) -> &Spec {
        &self.root.spec
    }

    pub fn value(&self) -> &NodeValue {
        &self.root.value
    }

    pub fn realm(&self) -> Option<&str> {
        self.metadata.realm.as_deref()
    }

    pub fn base(&self) -> Option<&str> {
        self.metadata.base.as_deref()
    }

    pub fn focus(&self) -> Option<&str> {
        self.metadata.focus.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.metadata.context.as_deref()
    }

    /// Serialize to the normalized JSON shape
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Give each embedding the document's realm and base unless it
    /// carries its own. Focus and context stay as found.
    fn stamp_embeddings(&mut self, paths: &[NodePath]) {
        for path in paths {
            let Some(node) = node_at_mut(&mut self.root, path.steps()) else {
                tracing::warn!(path = %path, "Embedding not found in document");
                continue;
            };

            if node.metadata.realm.as_deref().map_or(true, str::is_empty) {
                node.metadata.realm = self.metadata.realm.clone();
            }
            if node.metadata.base.as_deref().map_or(true, str::is_empty) {
                node.metadata.base = self.metadata.base.clone();
            }
        }
    }
}

fn content_field<'a>(content: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    content
        .and_then(|map| map.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// First non-empty value in priority order
fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(String::from)
}

/// Parse LYNX content text into a document
pub async fn parse(content: &str, options: &ParseOptions) -> Result<Document> {
    let raw: Value = serde_json::from_str(content)?;
    parse_value(&raw, options).await
}

/// Parse already-decoded LYNX content into a document.
///
/// `realm` and `base` come from the content, else the media type
/// parameters, else `options.location`. `focus` and `context` come only
/// from the content.
pub async fn parse_value(raw: &Value, options: &ParseOptions) -> Result<Document> {
    let media_type = MediaType::parse(options.media_type.as_deref().unwrap_or(LYNX_MEDIA_TYPE))?;
    let content = raw.as_object();
    let location = options.location.as_deref();

    let metadata = Metadata {
        realm: first_present([content_field(content, "realm"), media_type.realm(), location]),
        base: first_present([content_field(content, "base"), media_type.base(), location]),
        focus: content_field(content, "focus").map(String::from),
        context: content_field(content, "context").map(String::from),
    };
    tracing::debug!(realm = ?metadata.realm, base = ?metadata.base, "Computed document metadata");

    let expander = Expander::new(ResolverAdapter::new(
        options.resolver.clone(),
        metadata.base.clone(),
    ));
    let root = expander.expand(raw, None, NodePath::root()).await?;
    let embeddings = expander.into_embeddings();

    let mut document = Document { root, metadata };
    document.stamp_embeddings(&embeddings);
    Ok(document)
}
