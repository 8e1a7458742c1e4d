//! Token definitions for SFM source
//!
//! The tokenizer only distinguishes marker-like tokens from text runs.
//! Whether a marker opens or closes an element is decided later by the
//! parser with the help of the stylesheet.

use crate::sfm::ast::{Position, Text};

/// A position stamped token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A raw marker including its leading backslash, e.g. `\v` or `\+qt*`
    Marker(Text),
    /// A coalesced run of text, possibly spanning several lines
    Text(Text),
}

impl Token {
    pub fn text(&self) -> &Text {
        match self {
            Token::Marker(t) | Token::Text(t) => t,
        }
    }

    pub fn into_text(self) -> Text {
        match self {
            Token::Marker(t) | Token::Text(t) => t,
        }
    }

    pub fn pos(&self) -> Position {
        self.text().pos()
    }

    pub fn as_str(&self) -> &str {
        self.text().as_str()
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Token::Marker(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Token::Text(_))
    }
}
