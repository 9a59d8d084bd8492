//! Media type parsing
//!
//! Only what the parser needs from a transport content type: the essence
//! (`type/subtype`) and its parameters, of which `realm` and `base` matter.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{LynxError, Result};

/// The LYNX document media type
pub const LYNX_MEDIA_TYPE: &str = "application/lynx+json";

/// A parsed media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// Lowercased `type/subtype`
    pub essence: String,
    /// Parameters keyed by lowercased name, values unquoted
    pub parameters: HashMap<String, String>,
}

fn essence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[!#$%&'*+.^_`|~0-9A-Za-z-]+/[!#$%&'*+.^_`|~0-9A-Za-z-]+$")
            .expect("valid essence regex")
    })
}

fn parameter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*;\s*([!#$%&'*+.^_`|~0-9A-Za-z-]+)\s*=\s*("(?:[^"\\]|\\.)*"|[!#$%&'*+.^_`|~0-9A-Za-z-]+)\s*"#)
            .expect("valid parameter regex")
    })
}

impl MediaType {
    /// Parse a media type string such as
    /// `application/lynx+json;realm="http://example.com/";base=...`
    pub fn parse(input: &str) -> Result<Self> {
        let (essence, mut rest) = match input.find(';') {
            Some(index) => (&input[..index], &input[index..]),
            None => (input, ""),
        };

        let essence = essence.trim();
        if !essence_regex().is_match(essence) {
            return Err(LynxError::InvalidMediaType(input.to_string()));
        }

        let mut parameters = HashMap::new();
        while !rest.trim().is_empty() {
            let captures = parameter_regex()
                .captures(rest)
                .ok_or_else(|| LynxError::InvalidMediaType(input.to_string()))?;

            let name = captures[1].to_ascii_lowercase();
            let raw_value = &captures[2];
            let value = if raw_value.starts_with('"') {
                unquote(&raw_value[1..raw_value.len() - 1])
            } else {
                raw_value.to_string()
            };
            parameters.insert(name, value);

            rest = &rest[captures[0].len()..];
        }

        Ok(Self {
            essence: essence.to_ascii_lowercase(),
            parameters,
        })
    }

    /// Look up a parameter by (case-insensitive) name
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `realm` parameter
    pub fn realm(&self) -> Option<&str> {
        self.parameter("realm")
    }

    /// The `base` parameter
    pub fn base(&self) -> Option<&str> {
        self.parameter("base")
    }
}

fn unquote(quoted: &str) -> String {
    let mut value = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(c);
        }
    }
    value
}
