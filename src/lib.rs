//! LYNX Document Parser
//!
//! LYNX is a hypermedia document format in which every value is paired with
//! a spec describing how to present it. Raw documents are plain JSON where
//! each node may carry its spec inline, reference one by URL, or inherit one
//! from its parent's `children`. The parser normalizes such a document into
//! a tree of `{spec, value}` nodes.
//!
//! ## Features
//!
//! - **Spec Resolution**: referenced specs are fetched through a caller-supplied
//!   [`SpecResolver`], relative to the document base
//! - **Spec Inheritance**: inline specs merge over their parent's child template
//! - **Document Metadata**: `realm`, `base`, `focus` and `context` are lifted
//!   onto the document, never left in values
//! - **Embedded Documents**: `data` payloads typed `application/lynx+json` are
//!   parsed as documents of their own
//! - **Sources**: each entry of a `sources` list is expanded independently
//!
//! ## Example
//!
//! ```text
//! {                                        {
//!   "message": "Hello, World!",              "spec": { "hints": ["container"], ... },
//!   "spec": {                                "value": {
//!     "hints": ["container"],       ==>        "message": {
//!     "children": [                              "spec": { "name": "message", "hints": ["text"] },
//!       { "name": "message",                     "value": "Hello, World!"
//!         "hints": ["text"] }                  }
//!     ]                                      }
//!   }                                      }
//! }
//! ```

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod expand;
pub mod media_type;
pub mod node;
pub mod resolver;
pub mod spec;

pub use config::{LynxConfig, OutputFormat};
pub use document::{parse, parse_value, Document, ParseOptions};
pub use error::{BoxError, LynxError, Result};
pub use media_type::{MediaType, LYNX_MEDIA_TYPE};
pub use node::{Member, Metadata, Node, NodeValue};
pub use resolver::{resolver_fn, CatalogResolver, SpecResolver};
pub use spec::{Children, Hint, Spec, SpecSource};
