//! Layered configuration for the sfm toolchain
//!
//! `defaults/sfm.default.toml` is embedded into the crate so that the
//! documented defaults and runtime behaviour stay in sync. Callers layer user
//! files and command line overrides on top through [`Loader`] before
//! deserializing into [`SfmConfig`].

use crate::sfm::error::ErrorLevel;
use crate::sfm::parser::ParserOptions;
use crate::sfm::usfm;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/sfm.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct SfmConfig {
    pub parser: ParserConfig,
    pub output: OutputConfig,
}

/// Knobs that end up in [`ParserOptions`]
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    pub error_level: ErrorLevel,
    pub tag_escapes: String,
    pub private_prefix: String,
    pub flavour: Flavour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavour {
    /// Plain SFM, every marker comes from the given stylesheet
    Sfm,
    /// USFM: built-in stylesheet and chapter, verse and note handling
    Usfm,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Name of a format in the format registry
    pub format: String,
}

impl ParserConfig {
    /// Parser options for a source called `source_name`
    pub fn options(&self, source_name: impl Into<String>) -> ParserOptions {
        let base = match self.flavour {
            Flavour::Sfm => ParserOptions::new(),
            Flavour::Usfm => usfm::options(),
        };
        let options = base
            .source_name(source_name)
            .error_level(self.error_level)
            .tag_escapes(self.tag_escapes.clone());
        if self.private_prefix.is_empty() {
            options
        } else {
            options.private_prefix(self.private_prefix.clone())
        }
    }
}

/// Helper for layering user overrides over the built-in defaults
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file, ignored if absent
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. from a command line flag
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<SfmConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone
pub fn load_defaults() -> Result<SfmConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfm::lexer::DEFAULT_TAG_ESCAPES;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.parser.error_level, ErrorLevel::Content);
        assert_eq!(config.parser.tag_escapes, DEFAULT_TAG_ESCAPES);
        assert_eq!(config.parser.flavour, Flavour::Sfm);
        assert_eq!(config.output.format, "sfm");

        let options = config.parser.options("GEN.sfm");
        assert_eq!(options.source_name, "GEN.sfm");
        assert_eq!(options.private_prefix, None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("parser.error_level", "structure")
            .expect("override to apply")
            .set_override("parser.flavour", "usfm")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.parser.error_level, ErrorLevel::Structure);

        let options = config.parser.options("GEN.usfm");
        assert_eq!(options.private_prefix.as_deref(), Some(usfm::PRIVATE_PREFIX));
        assert_eq!(options.default_meta, Some(usfm::default_meta()));
    }

    #[test]
    fn rejects_unknown_levels() {
        let result = Loader::new()
            .set_override("parser.error_level", "fatal")
            .expect("override to apply")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn private_prefix_override() {
        let config = Loader::new()
            .set_override("parser.private_prefix", "x")
            .expect("override to apply")
            .build()
            .expect("config to build");
        let options = config.parser.options("test");
        assert_eq!(options.private_prefix.as_deref(), Some("x"));
    }
}
