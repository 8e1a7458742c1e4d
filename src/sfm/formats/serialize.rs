//! JSON and YAML dumps of parsed forests
//!
//! Elements serialise as `{name, pos, args, annotations, content}` and text
//! nodes as `{text, pos}`; records are left out to keep the output focused
//! on the document.

use super::registry::FormatError;
use crate::sfm::ast::Node;

pub fn to_json(nodes: &[Node]) -> Result<String, FormatError> {
    serde_json::to_string_pretty(nodes).map_err(|e| FormatError::SerializationError(e.to_string()))
}

pub fn to_yaml(nodes: &[Node]) -> Result<String, FormatError> {
    serde_yaml::to_string(nodes).map_err(|e| FormatError::SerializationError(e.to_string()))
}
