//! Format registry for forest serialization
//!
//! Each output format implements [`Formatter`] and is looked up by name in a
//! [`FormatRegistry`]; the command line `--format` option goes through it.

use super::{generate, to_json, to_treeviz_str, to_yaml};
use crate::sfm::ast::Node;
use std::collections::HashMap;
use std::fmt;

/// Error that can occur during formatting
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Format not found in registry
    FormatNotFound(String),
    /// Error during serialization
    SerializationError(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::FormatNotFound(name) => write!(f, "Format '{name}' not found"),
            FormatError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

/// Serializes a parsed forest to one output format
pub trait Formatter: Send + Sync {
    /// The name of this format (e.g. "sfm", "tree")
    fn name(&self) -> &str;

    fn serialize(&self, nodes: &[Node]) -> Result<String, FormatError>;

    fn description(&self) -> &str {
        ""
    }
}

/// SFM source, see [`generate`]
pub struct SfmFormatter;

impl Formatter for SfmFormatter {
    fn name(&self) -> &str {
        "sfm"
    }

    fn serialize(&self, nodes: &[Node]) -> Result<String, FormatError> {
        Ok(generate(nodes))
    }

    fn description(&self) -> &str {
        "SFM source regenerated from the tree"
    }
}

/// Box drawing tree view, see [`to_treeviz_str`]
pub struct TreevizFormatter;

impl Formatter for TreevizFormatter {
    fn name(&self) -> &str {
        "tree"
    }

    fn serialize(&self, nodes: &[Node]) -> Result<String, FormatError> {
        Ok(to_treeviz_str(nodes))
    }

    fn description(&self) -> &str {
        "Visual tree representation with Unicode icons"
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, nodes: &[Node]) -> Result<String, FormatError> {
        to_json(nodes)
    }

    fn description(&self) -> &str {
        "Pretty printed JSON"
    }
}

pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn name(&self) -> &str {
        "yaml"
    }

    fn serialize(&self, nodes: &[Node]) -> Result<String, FormatError> {
        to_yaml(nodes)
    }

    fn description(&self) -> &str {
        "YAML"
    }
}

/// Registry of forest formatters, keyed by name
pub struct FormatRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Register a formatter, replacing any with the same name
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Serialize a forest using the named format
    pub fn serialize(&self, nodes: &[Node], format: &str) -> Result<String, FormatError> {
        let formatter = self
            .get(format)
            .ok_or_else(|| FormatError::FormatNotFound(format.to_string()))?;
        formatter.serialize(nodes)
    }

    /// All format names, sorted
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    /// A registry with the built-in formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SfmFormatter);
        registry.register(TreevizFormatter);
        registry.register(JsonFormatter);
        registry.register(YamlFormatter);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
