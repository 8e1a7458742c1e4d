//! Severity levels, issue kinds and the errors produced while parsing
//!
//! Every issue the parser finds is classified by an [`ErrorKind`] and a
//! severity [`ErrorLevel`]. The parser compares the severity against its
//! configured threshold: issues at or above it become a fatal [`ParseError`],
//! the rest are logged and collected as [`Diagnostic`]s.

use crate::sfm::ast::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a parse issue, ordered from harmless to fatal
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    /// Correctable, never an error
    Note,
    /// Unknown or private namespace markers
    Marker,
    /// Malformed content inside a marker
    #[default]
    Content,
    /// Incorrect nesting that would produce a wrongly shaped tree
    Structure,
    /// Parsing cannot continue
    Unrecoverable,
}

impl ErrorLevel {
    pub const ALL: [ErrorLevel; 5] = [
        ErrorLevel::Note,
        ErrorLevel::Marker,
        ErrorLevel::Content,
        ErrorLevel::Structure,
        ErrorLevel::Unrecoverable,
    ];

    /// Numeric severity; negative values are never fatal
    pub fn value(self) -> i32 {
        match self {
            ErrorLevel::Note => -1,
            ErrorLevel::Marker => 0,
            ErrorLevel::Content => 1,
            ErrorLevel::Structure => 2,
            ErrorLevel::Unrecoverable => 100,
        }
    }

    /// Whether an issue of this severity aborts a parse run at `threshold`
    pub fn is_fatal_at(self, threshold: ErrorLevel) -> bool {
        self == ErrorLevel::Unrecoverable || (self.value() >= 0 && self >= threshold)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorLevel::Note => "note",
            ErrorLevel::Marker => "marker",
            ErrorLevel::Content => "content",
            ErrorLevel::Structure => "structure",
            ErrorLevel::Unrecoverable => "unrecoverable",
        }
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown error level '{}': expected one of note, marker, content, structure, unrecoverable",
                    s
                )
            })
    }
}

/// What kind of problem an issue reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Marker in the private namespace that the stylesheet does not define
    UnknownPrivateMarker,
    /// Marker the stylesheet does not define
    UnknownMarker,
    /// End marker with no open element to close
    OrphanEndMarker,
    /// Start marker that may not occur at the top level
    OrphanMarker,
    /// End marker that does not match the innermost open element
    WrongEndMarker,
    /// Element closed by an incompatible start marker
    ImplicitClose,
    /// Malformed content, reported by text type specific parsing
    ContentFormat,
    /// Record without a field its schema requires
    MissingField,
    /// Misuse of the parser API
    Assertion,
}

impl ErrorKind {
    /// Severity this kind of issue is reported at
    pub fn default_level(self) -> ErrorLevel {
        match self {
            ErrorKind::UnknownPrivateMarker => ErrorLevel::Note,
            ErrorKind::UnknownMarker => ErrorLevel::Marker,
            ErrorKind::OrphanEndMarker | ErrorKind::Assertion => ErrorLevel::Unrecoverable,
            ErrorKind::OrphanMarker | ErrorKind::WrongEndMarker => ErrorLevel::Structure,
            ErrorKind::ImplicitClose | ErrorKind::ContentFormat | ErrorKind::MissingField => {
                ErrorLevel::Content
            }
        }
    }
}

/// A located, classified parse issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub source_name: String,
    pub pos: Position,
    pub level: ErrorLevel,
    pub kind: ErrorKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        source_name: impl Into<String>,
        pos: Position,
        level: ErrorLevel,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            pos,
            level,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: line {},{}: {}",
            self.source_name, self.pos.line, self.pos.column, self.message
        )
    }
}

/// A fatal parse failure
///
/// Displays as `<source>: line L,C: <message>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError(Box<Diagnostic>);

impl ParseError {
    pub fn new(diagnostic: Diagnostic) -> Self {
        Self(Box::new(diagnostic))
    }

    /// An API misuse detected before any input was read
    pub fn assertion(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Diagnostic::new(
            source_name,
            Position::default(),
            ErrorLevel::Unrecoverable,
            ErrorKind::Assertion,
            message,
        ))
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        &self.0
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        *self.0
    }

    pub fn source_name(&self) -> &str {
        &self.0.source_name
    }

    pub fn pos(&self) -> Position {
        self.0.pos
    }

    pub fn level(&self) -> ErrorLevel {
        self.0.level
    }

    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }
}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        ParseError::new(diagnostic)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(ErrorLevel::Note < ErrorLevel::Marker);
        assert!(ErrorLevel::Marker < ErrorLevel::Content);
        assert!(ErrorLevel::Content < ErrorLevel::Structure);
        assert!(ErrorLevel::Structure < ErrorLevel::Unrecoverable);
    }

    #[test]
    fn test_fatality_threshold() {
        assert!(ErrorLevel::Content.is_fatal_at(ErrorLevel::Content));
        assert!(ErrorLevel::Structure.is_fatal_at(ErrorLevel::Content));
        assert!(!ErrorLevel::Marker.is_fatal_at(ErrorLevel::Content));
        assert!(ErrorLevel::Marker.is_fatal_at(ErrorLevel::Marker));
    }

    #[test]
    fn test_notes_are_never_fatal() {
        assert!(!ErrorLevel::Note.is_fatal_at(ErrorLevel::Note));
    }

    #[test]
    fn test_unrecoverable_is_always_fatal() {
        for threshold in ErrorLevel::ALL {
            assert!(ErrorLevel::Unrecoverable.is_fatal_at(threshold));
        }
    }

    #[test]
    fn test_parse_level_names() {
        assert_eq!("Structure".parse::<ErrorLevel>(), Ok(ErrorLevel::Structure));
        assert_eq!(" note ".parse::<ErrorLevel>(), Ok(ErrorLevel::Note));
        assert!("fatal".parse::<ErrorLevel>().is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ParseError::new(Diagnostic::new(
            "<string>",
            Position::new(3, 7),
            ErrorLevel::Marker,
            ErrorKind::UnknownMarker,
            "unknown marker \\xyz: not in stylesheet",
        ));
        assert_eq!(
            err.to_string(),
            "<string>: line 3,7: unknown marker \\xyz: not in stylesheet"
        );
        assert_eq!(err.kind(), ErrorKind::UnknownMarker);
    }

    #[test]
    fn test_assertion_is_unrecoverable() {
        let err = ParseError::assertion("doc.sfm", "default_meta must be provided");
        assert_eq!(err.level(), ErrorLevel::Unrecoverable);
        assert_eq!(err.kind(), ErrorKind::Assertion);
        assert_eq!(err.to_string(), "doc.sfm: line 1,1: default_meta must be provided");
    }
}
