//! Parser configuration
//!
//! [`ParserOptions`] collects everything the parser needs besides the input
//! and the stylesheet. It is a plain value with builder style setters:
//!
//! ```rust,ignore
//! let options = ParserOptions::new()
//!     .source_name("MAT.usfm")
//!     .error_level(ErrorLevel::Structure)
//!     .private_prefix("z");
//! ```

use crate::sfm::error::ErrorLevel;
use crate::sfm::lexer::DEFAULT_TAG_ESCAPES;
use crate::sfm::style::Marker;

/// Source name used in messages when the caller does not give one
pub const DEFAULT_SOURCE_NAME: &str = "<string>";

#[derive(Debug, Clone, PartialEq)]
pub struct ParserOptions {
    /// Name shown in error messages
    pub source_name: String,
    /// Record used for markers the stylesheet does not define; `None` makes
    /// every unknown marker an error
    pub default_meta: Option<Marker>,
    /// Prefix of the private marker namespace; unknown markers carrying it
    /// only produce a note
    pub private_prefix: Option<String>,
    /// Issues at or above this severity abort the parse
    pub error_level: ErrorLevel,
    /// Regex fragment for backslash sequences that stay in text
    pub tag_escapes: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            default_meta: Some(Marker::default_meta()),
            private_prefix: None,
            error_level: ErrorLevel::default(),
            tag_escapes: DEFAULT_TAG_ESCAPES.to_string(),
        }
    }
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn default_meta(mut self, meta: Marker) -> Self {
        self.default_meta = Some(meta);
        self
    }

    /// Treat every marker missing from the stylesheet as an error
    pub fn without_default_meta(mut self) -> Self {
        self.default_meta = None;
        self
    }

    pub fn private_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.private_prefix = Some(prefix.into());
        self
    }

    pub fn error_level(mut self, level: ErrorLevel) -> Self {
        self.error_level = level;
        self
    }

    pub fn tag_escapes(mut self, escapes: impl Into<String>) -> Self {
        self.tag_escapes = escapes.into();
        self
    }

    /// Check the combinations the parser cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if self.default_meta.is_none() {
            if self.private_prefix.is_some() {
                return Err("default_meta must be provided when using private_prefix".to_string());
            }
            if self.error_level > ErrorLevel::Marker {
                return Err(format!(
                    "default_meta must be provided when error_level is above marker (got {})",
                    self.error_level
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParserOptions::default();
        assert_eq!(options.source_name, "<string>");
        assert_eq!(options.error_level, ErrorLevel::Content);
        assert_eq!(options.default_meta, Some(Marker::default_meta()));
        assert_eq!(options.tag_escapes, r"\\");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_private_prefix_needs_default_meta() {
        let options = ParserOptions::new()
            .without_default_meta()
            .error_level(ErrorLevel::Marker)
            .private_prefix("z");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_loose_levels_need_default_meta() {
        let strict = ParserOptions::new()
            .without_default_meta()
            .error_level(ErrorLevel::Marker);
        assert!(strict.validate().is_ok());
        let loose = strict.error_level(ErrorLevel::Content);
        assert!(loose.validate().is_err());
    }
}
