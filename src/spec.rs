//! Spec types and merging
//!
//! A spec describes how a value is presented: an optional `name`, a list of
//! `hints`, and the expected shape of its `children`. The parser never
//! interprets or validates a spec; it only carries it to the output. A field
//! whose content does not fit its typed slot (a numeric `name`, a `hints`
//! string) is kept verbatim in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Presentation descriptor attached to every node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spec {
    /// Name used to match this spec against a container's properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Ordered hints, most specific first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,

    /// Specs for the node's children
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Children>,

    /// Any other spec fields, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A hint: a bare name, a structured descriptor, or anything else
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Hint {
    Name(String),
    Descriptor(Map<String, Value>),
    Other(Value),
}

/// The `children` field of a spec
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Children {
    /// One spec per expected property, matched by `name`
    Named(Vec<SpecSource>),
    /// A single spec applying to every property or item
    Uniform(Box<SpecSource>),
}

/// A spec as written in content: inline, by reference, or neither
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SpecSource {
    Reference(String),
    Inline(Spec),
    Other(Value),
}

impl<'de> Deserialize<'de> for Spec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Spec::from_fields)
    }
}

impl Spec {
    /// Create an empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a spec carrying the given bare hint names
    pub fn with_hints<I, S>(hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hints: Some(hints.into_iter().map(|h| Hint::Name(h.into())).collect()),
            ..Self::default()
        }
    }

    /// Set the spec name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the children spec
    pub fn with_children(mut self, children: Children) -> Self {
        self.children = Some(children);
        self
    }

    /// Build a spec from the fields of a JSON object. Never fails.
    pub fn from_fields(mut fields: Map<String, Value>) -> Spec {
        let name = match fields.remove("name") {
            Some(Value::String(name)) => Some(name),
            Some(other) => {
                fields.insert("name".to_string(), other);
                None
            }
            None => None,
        };

        let hints = match fields.remove("hints") {
            Some(Value::Array(items)) => Some(items.into_iter().map(Hint::from_value).collect()),
            Some(other) => {
                fields.insert("hints".to_string(), other);
                None
            }
            None => None,
        };

        let children = match fields.remove("children") {
            Some(Value::Array(items)) => Some(Children::Named(
                items.into_iter().map(SpecSource::from_value).collect(),
            )),
            Some(value @ (Value::Object(_) | Value::String(_))) => {
                Some(Children::Uniform(Box::new(SpecSource::from_value(value))))
            }
            Some(other) => {
                fields.insert("children".to_string(), other);
                None
            }
            None => None,
        };

        Spec {
            name,
            hints,
            children,
            extra: fields,
        }
    }

    /// The spec's fields as a JSON object
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            _ => Map::new(),
        }
    }

    /// Merge an own spec over a template.
    ///
    /// A shallow union of the two specs' fields: the template supplies the
    /// base and every field the own spec defines replaces the template's,
    /// whatever its content. Neither input is modified.
    pub fn merge(template: &Spec, own: &Spec) -> Spec {
        let mut fields = template.to_fields();
        fields.extend(own.to_fields());
        Spec::from_fields(fields)
    }

    /// Find the spec for a named property.
    ///
    /// A named children list matches inline entries by `name`; a uniform
    /// children spec applies to every property.
    pub fn child_for_property(&self, property: &str) -> Option<ChildSpec<'_>> {
        match self.children.as_ref()? {
            Children::Named(entries) => entries.iter().find_map(|entry| match entry {
                SpecSource::Inline(spec) if spec.name.as_deref() == Some(property) => {
                    Some(ChildSpec::Named(spec))
                }
                _ => None,
            }),
            Children::Uniform(source) => Some(ChildSpec::Uniform(source)),
        }
    }

    /// Find the spec shared by every item of a sequence
    pub fn child_for_item(&self) -> Option<ChildSpec<'_>> {
        match self.children.as_ref()? {
            Children::Named(_) => None,
            Children::Uniform(source) => Some(ChildSpec::Uniform(source)),
        }
    }

    /// Hint names in order, whether bare or structured
    pub fn hint_names(&self) -> Vec<&str> {
        self.hints
            .iter()
            .flatten()
            .filter_map(Hint::name)
            .collect()
    }
}

impl Hint {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(name) => Hint::Name(name),
            Value::Object(map) => Hint::Descriptor(map),
            other => Hint::Other(other),
        }
    }

    /// The hint's name, if it has one
    pub fn name(&self) -> Option<&str> {
        match self {
            Hint::Name(name) => Some(name),
            Hint::Descriptor(map) => map.get("name").and_then(Value::as_str),
            Hint::Other(_) => None,
        }
    }
}

impl SpecSource {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(reference) => SpecSource::Reference(reference),
            Value::Object(fields) => SpecSource::Inline(Spec::from_fields(fields)),
            other => SpecSource::Other(other),
        }
    }
}

/// A child spec borrowed from a parent spec
#[derive(Debug, Clone, Copy)]
pub enum ChildSpec<'a> {
    Named(&'a Spec),
    Uniform(&'a SpecSource),
}

impl<'a> ChildSpec<'a> {
    /// The inline spec, when the child spec is an object
    pub fn inline(&self) -> Option<&'a Spec> {
        match *self {
            ChildSpec::Named(spec) => Some(spec),
            ChildSpec::Uniform(SpecSource::Inline(spec)) => Some(spec),
            ChildSpec::Uniform(_) => None,
        }
    }

    /// The reference URL, when the child spec is a string
    pub fn reference(&self) -> Option<&'a str> {
        match *self {
            ChildSpec::Uniform(SpecSource::Reference(url)) => Some(url.as_str()),
            _ => None,
        }
    }
}

impl From<Spec> for SpecSource {
    fn from(spec: Spec) -> Self {
        SpecSource::Inline(spec)
    }
}
