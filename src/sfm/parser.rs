//! Parsing module for SFM documents
//!
//! The parser turns a token stream into a forest of elements and text nodes,
//! guided by a [`Stylesheet`](crate::sfm::style::Stylesheet):
//!
//! - which sub-parser fills an element is chosen by its record's text type,
//! - where an element may open is decided by its `occurs_under` set,
//! - elements with an end marker are closed explicitly, or implicitly (and
//!   annotated as such) when an incompatible marker or end of input arrives.
//!
//! Parsing is lazy. [`Parser`] is an iterator of root-level nodes, each
//! fully built before it is yielded; dropping the iterator stops parsing.
//! Issues below the configured [`ErrorLevel`](crate::sfm::error::ErrorLevel)
//! are logged and collected, anything at or above it ends the iteration
//! with an error.

#[allow(clippy::module_inception)]
pub mod parser;
pub mod options;
pub mod text_types;


pub use options::{ParserOptions, DEFAULT_SOURCE_NAME};
pub use parser::{Frame, Parser, Step, TextTypeParser};
pub use text_types::{default_text_types, parse_default, parse_milestone};

use crate::sfm::ast::Node;
use crate::sfm::error::ParseError;
use crate::sfm::lexer::lines;
use crate::sfm::style::Stylesheet;

/// Parse a whole string into a forest
pub fn parse(
    source: &str,
    stylesheet: &Stylesheet,
    options: ParserOptions,
) -> Result<Vec<Node>, ParseError> {
    Parser::new(lines(source), stylesheet, options)?.collect()
}

/// Parse a string with an empty stylesheet and default options
///
/// Every marker is unknown, so the result is a flat list of top-level
/// elements and text.
pub fn parse_loose(source: &str) -> Result<Vec<Node>, ParseError> {
    parse(source, &Stylesheet::new(), ParserOptions::new())
}
