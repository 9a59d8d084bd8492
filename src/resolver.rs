//! Spec resolution
//!
//! Nodes may reference their spec by URL. The parser never fetches anything
//! itself: callers provide a [`SpecResolver`], and the parser resolves each
//! reference against the document base before handing it over.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use url::{Position, Url};
use walkdir::WalkDir;

use crate::error::{BoxError, LynxError, Result};
use crate::spec::Spec;

/// Maps an absolute spec URL to a spec
#[async_trait]
pub trait SpecResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> std::result::Result<Spec, BoxError>;
}

/// Adapts an async closure into a [`SpecResolver`]
pub struct FnResolver<F> {
    f: F,
}

/// Build a resolver from an async closure
pub fn resolver_fn<F, Fut>(f: F) -> FnResolver<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<Spec, BoxError>> + Send,
{
    FnResolver { f }
}

#[async_trait]
impl<F, Fut> SpecResolver for FnResolver<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<Spec, BoxError>> + Send,
{
    async fn resolve(&self, url: &str) -> std::result::Result<Spec, BoxError> {
        (self.f)(url.to_string()).await
    }
}

/// Placeholder origin for joining against a path-only base
const PATH_BASE_ORIGIN: &str = "http://lynx.invalid";

/// Resolve a spec reference against a base URL.
///
/// A base that is an absolute path (`/app/`) is joined as if it were on a
/// placeholder origin, which is stripped again afterwards. Without a usable
/// base, or when joining fails, the reference is used as written.
pub fn resolve_reference(reference: &str, base: Option<&str>) -> String {
    let Some(base) = base else {
        return reference.to_string();
    };

    if let Ok(base_url) = Url::parse(base) {
        return match base_url.join(reference) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!(reference, base, error = %e, "Could not join spec reference");
                reference.to_string()
            }
        };
    }

    if !base.starts_with('/') || base.starts_with("//") {
        return reference.to_string();
    }

    let joined = Url::parse(PATH_BASE_ORIGIN)
        .and_then(|origin| origin.join(base))
        .and_then(|base_url| base_url.join(reference));
    match joined {
        Ok(url) if url.host_str() == Some("lynx.invalid") && url.scheme() == "http" => {
            url[Position::BeforePath..].to_string()
        }
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!(reference, base, error = %e, "Could not join spec reference");
            reference.to_string()
        }
    }
}

/// The parser-side view of the caller's resolver
#[derive(Clone)]
pub struct ResolverAdapter {
    resolver: Option<Arc<dyn SpecResolver>>,
    base: Option<String>,
}

impl ResolverAdapter {
    pub fn new(resolver: Option<Arc<dyn SpecResolver>>, base: Option<String>) -> Self {
        Self { resolver, base }
    }

    /// Resolve a spec reference found in content.
    ///
    /// Fails with [`LynxError::MissingResolver`] when no resolver was
    /// configured; resolver failures pass through unchanged. Nothing is
    /// cached: repeated references call the resolver again.
    pub async fn resolve(&self, reference: &str) -> Result<Spec> {
        let resolver = self.resolver.as_ref().ok_or(LynxError::MissingResolver)?;
        let url = resolve_reference(reference, self.base.as_deref());

        tracing::debug!(reference, url = %url, "Resolving spec");
        resolver.resolve(&url).await.map_err(LynxError::Resolution)
    }
}

/// Error for URLs missing from a [`CatalogResolver`]
#[derive(Debug, thiserror::Error)]
#[error("No spec registered for {0}")]
pub struct UnknownSpec(pub String);

/// In-memory resolver backed by a URL → spec table
#[derive(Debug, Clone, Default)]
pub struct CatalogResolver {
    specs: HashMap<String, Spec>,
}

impl CatalogResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec at an absolute URL
    pub fn insert(&mut self, url: impl Into<String>, spec: Spec) -> &mut Self {
        self.specs.insert(url.into(), spec);
        self
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_spec(mut self, url: impl Into<String>, spec: Spec) -> Self {
        self.insert(url, spec);
        self
    }

    /// Number of registered specs
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&Spec> {
        self.specs.get(url)
    }

    /// Load every `*.json` file under `dir`.
    ///
    /// `specs/greeting.json` with base `http://example.com/` is registered
    /// at `http://example.com/specs/greeting`.
    pub fn from_directory(dir: &Path, base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid spec base URL {}: {}", base_url, e))?;

        let mut catalog = Self::new();
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }

            let relative = path.strip_prefix(dir)?.with_extension("");
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let url = base.join(&relative)?;

            let content = std::fs::read_to_string(path)?;
            let spec: Spec = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse spec in {}: {}", path.display(), e))?;

            tracing::trace!(url = %url, path = %path.display(), "Registered spec");
            catalog.insert(url.to_string(), spec);
        }

        Ok(catalog)
    }
}

#[async_trait]
impl SpecResolver for CatalogResolver {
    async fn resolve(&self, url: &str) -> std::result::Result<Spec, BoxError> {
        self.specs
            .get(url)
            .cloned()
            .ok_or_else(|| Box::new(UnknownSpec(url.to_string())) as BoxError)
    }
}
