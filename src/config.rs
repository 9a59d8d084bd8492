//! Configuration management for the LYNX parser tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (lynx.toml)
//! - Environment variables (LYNX__*)
//!
//! ## Example config file (lynx.toml):
//! ```toml
//! [parser]
//! media_type = "application/lynx+json"
//! location = "http://example.com/app/"
//!
//! [resolver]
//! spec_dir = "./specs"
//! spec_base_url = "http://example.com/specs/"
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::document::ParseOptions;
use crate::media_type::LYNX_MEDIA_TYPE;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LynxConfig {
    /// Parse defaults
    #[serde(default)]
    pub parser: ParserConfig,

    /// Spec catalog settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Parse defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Media type assumed for documents
    #[serde(default = "default_media_type")]
    pub media_type: String,

    /// Fallback document location
    #[serde(default)]
    pub location: Option<String>,
}

/// Spec catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Directory of `*.json` spec files
    #[serde(default)]
    pub spec_dir: Option<PathBuf>,

    /// URL the spec directory is published at
    #[serde(default = "default_spec_base_url")]
    pub spec_base_url: String,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_media_type() -> String {
    LYNX_MEDIA_TYPE.to_string()
}

fn default_spec_base_url() -> String {
    "http://localhost/".to_string()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            media_type: default_media_type(),
            location: None,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            spec_dir: None,
            spec_base_url: default_spec_base_url(),
        }
    }
}

impl LynxConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["lynx.toml", ".lynx.toml", "config/lynx.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "lynx", "lynx-parser") {
            let xdg_config = config_dir.config_dir().join("lynx.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // LYNX__PARSER__LOCATION, LYNX__OUTPUT__FORMAT, ...
        builder = builder.add_source(
            Environment::with_prefix("LYNX")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Parse options seeded from this configuration (no resolver)
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            media_type: Some(self.parser.media_type.clone()),
            location: self.parser.location.clone(),
            resolver: None,
        }
    }

    /// Get the spec directory (resolves relative paths)
    pub fn spec_dir(&self) -> Option<PathBuf> {
        self.resolver.spec_dir.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LynxConfig::default();
        assert_eq!(config.parser.media_type, "application/lynx+json");
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert!(config.spec_dir().is_none());
    }

    #[test]
    fn test_load_without_files_keeps_defaults() {
        let config = LynxConfig::load().unwrap();
        assert_eq!(config.parser.media_type, "application/lynx+json");
        assert!(!config.resolver.spec_base_url.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = LynxConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[parser]"));
        assert!(toml_str.contains("[resolver]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[parser]
location = "http://example.com/app/"

[resolver]
spec_dir = "/srv/specs"
spec_base_url = "http://example.com/specs/"

[output]
format = "compact"
"#,
        )
        .unwrap();

        let config = LynxConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.parser.location.as_deref(), Some("http://example.com/app/"));
        assert_eq!(config.parser.media_type, "application/lynx+json");
        assert_eq!(config.resolver.spec_base_url, "http://example.com/specs/");
        assert_eq!(config.output.format, OutputFormat::Compact);
        assert_eq!(config.spec_dir(), Some(PathBuf::from("/srv/specs")));

        let options = config.parse_options();
        assert_eq!(options.location.as_deref(), Some("http://example.com/app/"));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = LynxConfig::default();
        config.output.format = OutputFormat::Compact;
        config.save(path.to_str().unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("format = \"compact\""));
    }
}
