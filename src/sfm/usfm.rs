//! USFM flavour of the parser
//!
//! USFM is SFM with a fixed stylesheet and a few text types that need more
//! than the default treatment:
//!
//! - `ChapterNumber` (`\c 3`) takes the chapter number as its argument and
//!   then holds the whole chapter,
//! - `VerseNumber` (`\v 16`) takes the verse number and has no content; the
//!   verse text belongs to the enclosing paragraph,
//! - `NoteText` with a `Note` style (`\f + ...\f*`) takes the caller
//!   character and unwraps its `\ft` children into the note itself.
//!
//! Unknown markers in the `z` namespace are accepted with a note and parsed
//! as milestones that may occur anywhere.

use crate::sfm::ast::{Element, Node, Text, CONTENT_PROMOTED};
use crate::sfm::error::{ErrorKind, ErrorLevel, ParseError};
use crate::sfm::lexer::{lines, Token};
use crate::sfm::parser::{parse_default, Parser, ParserOptions};
use crate::sfm::style::{self, Marker, StyleType, Stylesheet, TextType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Namespace reserved for private markers
pub const PRIVATE_PREFIX: &str = "z";

/// Argument used when a chapter, verse or caller argument is missing
pub const MISSING_ARGUMENT: &str = "\u{FFFD}";

/// Marker whose content is promoted into the enclosing note
const NOTE_TEXT: &str = "ft";

const USFM_STY: &str = include_str!("usfm/usfm.sty");

static STYLESHEET: Lazy<Stylesheet> = Lazy::new(|| {
    style::parse_named(lines(USFM_STY), "usfm.sty", ErrorLevel::Content)
        .expect("embedded usfm.sty is valid")
});

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:[-\u{2010}\u{2011}]\d+)?)").expect("number pattern is valid")
});
static CALLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([-+\w])").expect("caller pattern is valid"));
static SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\s|$)").expect("separator pattern is valid"));

/// The built-in USFM stylesheet
pub fn stylesheet() -> &'static Stylesheet {
    &STYLESHEET
}

/// Record used for unknown markers: a milestone allowed anywhere
pub fn default_meta() -> Marker {
    Marker::default()
        .with_text_type(TextType::Milestone)
        .unconstrained()
}

/// Parser options for USFM: milestone default record, `z` private prefix
pub fn options() -> ParserOptions {
    ParserOptions::new()
        .default_meta(default_meta())
        .private_prefix(PRIVATE_PREFIX)
}

/// A parser with the USFM text type handlers registered
pub fn parser<'a, I, S>(
    lines: I,
    stylesheet: &'a Stylesheet,
    options: ParserOptions,
) -> Result<Parser<'a>, ParseError>
where
    I: IntoIterator<Item = S>,
    I::IntoIter: 'a,
    S: AsRef<str>,
{
    Ok(Parser::new(lines, stylesheet, options)?
        .with_text_type(TextType::ChapterNumber, parse_chapter)
        .with_text_type(TextType::VerseNumber, parse_verse)
        .with_text_type(TextType::NoteText, parse_note_text))
}

/// Parse a USFM string with the built-in stylesheet
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    parser(lines(source), stylesheet(), options())?.collect()
}

/// Take the argument matched by `pattern` from the text following the
/// marker. Returns the argument, if any, and the text left after it.
fn read_argument(parser: &mut Parser<'_>, pattern: &Regex) -> (Option<String>, Option<Text>) {
    let text = match parser.next_token() {
        Some(Token::Text(text)) => text,
        Some(token) => {
            parser.put_back(token);
            return (None, None);
        }
        None => return (None, None),
    };
    let found = pattern
        .captures(text.as_str())
        .and_then(|caps| caps.get(1))
        .map(|m| (m.as_str().to_string(), m.end()));
    match found {
        Some((argument, end)) => {
            let consumed = text.as_str()[..end].chars().count();
            (Some(argument), Some(text.skip(consumed)))
        }
        None => (None, Some(text)),
    }
}

/// Store the single argument of the current element, reporting it when it
/// is missing or not followed by a space. Returns the remaining text with
/// leading whitespace removed.
fn argument(
    parser: &mut Parser<'_>,
    pattern: &Regex,
    what: &str,
) -> Result<Option<Text>, ParseError> {
    let Some(frame) = parser.frame() else {
        return Ok(None);
    };
    let (name, pos) = (frame.name.clone(), frame.pos);

    let (value, rest) = read_argument(parser, pattern);
    let value = match value {
        Some(value) => value,
        None => {
            parser.issue(
                ErrorLevel::Content,
                ErrorKind::ContentFormat,
                pos,
                format!("missing {} after \\{}", what, name),
            )?;
            MISSING_ARGUMENT.to_string()
        }
    };

    if let Some(rest) = &rest {
        if !SEPARATOR.is_match(rest.as_str()) {
            parser.issue(
                ErrorLevel::Content,
                ErrorKind::ContentFormat,
                rest.pos(),
                format!("missing space after {} '{}'", what, value),
            )?;
        }
    }
    if let Some(frame) = parser.frame_mut() {
        frame.args = vec![value];
    }
    Ok(rest.map(|r| r.trim_start()).filter(|r| !r.is_empty()))
}

/// `\c N`: the number, then the chapter body
pub fn parse_chapter(parser: &mut Parser<'_>) -> Result<(), ParseError> {
    if let Some(rest) = argument(parser, &NUMBER, "chapter number")? {
        parser.issue(
            ErrorLevel::Structure,
            ErrorKind::ContentFormat,
            rest.pos(),
            format!("text cannot follow chapter marker '{}'", rest.trim_end()),
        )?;
        let meta = parser
            .default_meta()
            .cloned()
            .unwrap_or_else(|| Arc::new(Marker::default()));
        let holder = Element::anonymous()
            .pos(rest.pos())
            .meta(meta)
            .child(rest)
            .node();
        parser.push_node(holder);
    }
    parse_default(parser)
}

/// `\v N`: the number only; the text after it goes back to the paragraph
pub fn parse_verse(parser: &mut Parser<'_>) -> Result<(), ParseError> {
    if let Some(rest) = argument(parser, &NUMBER, "verse number")? {
        parser.put_back(Token::Text(rest));
    }
    Ok(())
}

/// Notes take a caller and promote their `\ft` content; other note text
/// markers parse as default
pub fn parse_note_text(parser: &mut Parser<'_>) -> Result<(), ParseError> {
    let is_note = parser
        .frame()
        .is_some_and(|frame| frame.meta.style_type == Some(StyleType::Note));
    if !is_note {
        return parse_default(parser);
    }

    if let Some(body) = argument(parser, &CALLER, "caller parameter")? {
        parser.push_node(Node::Text(body));
    }
    parse_default(parser)?;
    promote_note_content(parser);
    Ok(())
}

fn promote_note_content(parser: &mut Parser<'_>) {
    let Some(frame) = parser.frame_mut() else {
        return;
    };
    let is_note_text = |node: &Node| {
        node.as_element()
            .is_some_and(|e| e.name() == Some(NOTE_TEXT))
    };
    if !frame.content.iter().any(is_note_text) {
        return;
    }

    let content = std::mem::take(&mut frame.content);
    for node in content {
        match node {
            Node::Element(e) if e.name() == Some(NOTE_TEXT) => {
                frame.content.extend(e.content().iter().cloned());
            }
            other => frame.content.push(other),
        }
    }
    frame.annotations.insert(CONTENT_PROMOTED, true);
}
