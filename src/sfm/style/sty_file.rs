//! Loader for `.sty` stylesheet files
//!
//! A `.sty` file is itself SFM: every line holds a field marker and its
//! value, and a new record starts at each `\Marker`.
//!
//! ```text
//! \Marker qt
//! \Endmarker qt*
//! \OccursUnder p q NEST
//! \TextType VerseText
//! \StyleType Character
//! \Italic
//! ```
//!
//! The file is read as a [record database](crate::sfm::records) whose
//! records start at `\marker`, so positions and error levels behave exactly
//! as for documents. Before parsing, `#` comments are stripped and field
//! names are lower-cased, which makes them case-insensitive. Fields before
//! the first `\Marker` form a header and are ignored.

use super::marker::{Marker, StyleType, TextType};
use super::stylesheet::Stylesheet;
use crate::sfm::error::{ErrorLevel, ParseError};
use crate::sfm::lexer::lines;
use crate::sfm::parser::{ParserOptions, DEFAULT_SOURCE_NAME};
use crate::sfm::records::{
    self, decimal, flag, integer, non_empty, sequence, text, unique, FieldValue, Record, Schema,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

pub use crate::sfm::records::is_flag_set;

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*#[^\r\n]*").expect("comment pattern is valid"));
static FIELD_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*\\)([^\s\\]+)").expect("field marker pattern is valid"));

/// Field layout of a `.sty` record, with the defaults a bare record gets
static STY_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    let words = || unique(sequence(text(), ' '));
    let mut schema = Schema::new("marker")
        .required(
            "marker",
            non_empty(text()),
            ErrorLevel::Content,
            "missing marker name after \\{field}",
        )
        .field("endmarker", text())
        .field("name", text())
        .field("description", text())
        .field("occursunder", words())
        .field("rank", integer())
        .field_with_default("textproperties", words(), FieldValue::Set(BTreeSet::new()))
        .field_with_default("texttype", text(), FieldValue::Text("Unspecified".to_string()))
        .field("styletype", text())
        .field("fontsize", integer())
        .field_with_default("justification", text(), FieldValue::Text("Left".to_string()));
    for name in FLAGS {
        schema = schema.field_with_default(*name, flag(), FieldValue::Flag(false));
    }
    for name in ["spacebefore", "spaceafter", "color"] {
        schema = schema.field_with_default(name, integer(), FieldValue::Integer(0));
    }
    for name in ["firstlineindent", "leftmargin", "rightmargin"] {
        schema = schema.field_with_default(name, decimal(), FieldValue::Decimal(0.0));
    }
    schema
});

/// Presentation switches recorded in [`Marker::flags`]
pub const FLAGS: &[&str] = &[
    "regular",
    "bold",
    "italic",
    "underline",
    "superscript",
    "smallcaps",
];

/// Fields mapped onto [`Marker`] members; all others land in its attributes
const MEMBER_FIELDS: &[&str] = &[
    "marker",
    "endmarker",
    "name",
    "description",
    "occursunder",
    "rank",
    "textproperties",
    "texttype",
    "styletype",
    "fontsize",
];

/// Pseudo parent in `\OccursUnder` standing for the marker itself
const NEST: &str = "NEST";

/// Field schema `.sty` files are read with
pub fn schema() -> &'static Schema {
    &STY_SCHEMA
}

/// Error that can occur when loading a stylesheet file
#[derive(Debug, Clone)]
pub enum StyleError {
    /// IO error when reading the file
    Io(String),
    /// The file content was rejected
    Parse(ParseError),
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleError::Io(msg) => write!(f, "IO error: {}", msg),
            StyleError::Parse(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StyleError {}

impl From<std::io::Error> for StyleError {
    fn from(err: std::io::Error) -> Self {
        StyleError::Io(err.to_string())
    }
}

impl From<ParseError> for StyleError {
    fn from(err: ParseError) -> Self {
        StyleError::Parse(err)
    }
}

/// Load stylesheet records from `.sty` lines
pub fn parse<I, S>(source: I, error_level: ErrorLevel) -> Result<Stylesheet, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_named(source, DEFAULT_SOURCE_NAME, error_level)
}

/// Like [`parse`], naming the source in messages
pub fn parse_named<I, S>(
    source: I,
    source_name: &str,
    error_level: ErrorLevel,
) -> Result<Stylesheet, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cleaned = source.into_iter().map(|line| normalise_line(line.as_ref()));
    let options = ParserOptions::new()
        .source_name(source_name)
        .error_level(error_level);
    let db = records::parse(cleaned, schema(), options)?;

    for name in db.header.fields.keys() {
        log::debug!("{}: header field \\{} ignored", source_name, name);
    }
    Ok(db.records.iter().filter_map(marker_from).collect())
}

/// Load a `.sty` file from disk
pub fn from_path(path: impl AsRef<Path>, error_level: ErrorLevel) -> Result<Stylesheet, StyleError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    Ok(parse_named(
        lines(&text),
        &path.display().to_string(),
        error_level,
    )?)
}

fn normalise_line(line: &str) -> String {
    let line = COMMENT.replace_all(line, "");
    FIELD_MARKER
        .replace(&line, |caps: &regex::Captures<'_>| {
            format!("{}{}", &caps[1], caps[2].to_lowercase())
        })
        .into_owned()
}

fn text_field(record: &Record, name: &str) -> Option<String> {
    record
        .text(name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Turn a record into a stylesheet entry; records without a marker name
/// have already been reported and are dropped
fn marker_from(record: &Record) -> Option<(String, Marker)> {
    let tag = text_field(record, "marker")?;
    let mut occurs_under: BTreeSet<Option<String>> = match record.set("occursunder") {
        Some(parents) => parents.iter().cloned().map(Some).collect(),
        None => BTreeSet::from([None]),
    };
    if occurs_under.remove(&Some(NEST.to_string())) {
        occurs_under.insert(Some(tag.clone()));
    }

    let marker = Marker {
        text_type: Some(
            text_field(record, "texttype").map_or(TextType::Unspecified, TextType::from),
        ),
        occurs_under,
        endmarker: text_field(record, "endmarker"),
        style_type: text_field(record, "styletype").map(StyleType::from),
        text_properties: record.set("textproperties").cloned().unwrap_or_default(),
        name: text_field(record, "name"),
        description: text_field(record, "description"),
        rank: record.integer("rank"),
        font_size: record.integer("fontsize"),
        flags: FLAGS
            .iter()
            .filter(|name| record.flag(name) == Some(true))
            .map(|name| name.to_string())
            .collect(),
        attributes: record
            .fields
            .iter()
            .filter(|(name, _)| {
                let name = name.as_str();
                !MEMBER_FIELDS.contains(&name) && !FLAGS.contains(&name)
            })
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect(),
    };
    Some((tag, marker))
}
