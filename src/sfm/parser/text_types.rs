//! Built-in text type parsers
//!
//! A text type parser is called with the new element's frame on top of the
//! parser's stack and fills it from the token stream. The registry maps the
//! stylesheet's `TextType` to one of these functions; text types without an
//! entry use [`parse_default`].

use super::parser::{Parser, Step, TextTypeParser};
use crate::sfm::error::ParseError;
use crate::sfm::style::TextType;
use std::collections::HashMap;

/// Consume tokens into the current frame until something closes it
pub fn parse_default(parser: &mut Parser<'_>) -> Result<(), ParseError> {
    while let Some(token) = parser.next_token() {
        match parser.step(token)? {
            Step::Node(node) => parser.push_node(node),
            Step::Skip => {}
            Step::Close => return Ok(()),
        }
    }
    parser.close_at_eof();
    Ok(())
}

/// Milestones have no content and close straight away
pub fn parse_milestone(_parser: &mut Parser<'_>) -> Result<(), ParseError> {
    Ok(())
}

/// Registry every parser starts with
pub fn default_text_types() -> HashMap<TextType, TextTypeParser> {
    let mut registry: HashMap<TextType, TextTypeParser> = HashMap::new();
    registry.insert(TextType::Default, parse_default);
    registry.insert(TextType::Other, parse_default);
    registry.insert(TextType::NoteText, parse_default);
    registry.insert(TextType::Milestone, parse_milestone);
    registry
}
