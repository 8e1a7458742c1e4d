//! Schema-driven SFM records
//!
//! Many SFM files are flat databases rather than documents: each line holds
//! a field marker and a value, and a designated start field opens a new
//! record. A [`Schema`] names that start field and says, per field, how the
//! value is parsed and what happens when a record lacks it.
//!
//! ```text
//! \Marker qt          <- start field, opens a record
//! \Rank 3             <- integer()
//! \OccursUnder p q    <- unique(sequence(text(), ' '))
//! \Italic             <- flag()
//! ```
//!
//! Fields seen before the first start field make up the header record. The
//! header is parsed with the same value parsers but gets no defaults.
//!
//! Two kinds of issue are reported, at the usual error levels: a value its
//! parser rejects is a Content issue, and a required field missing from a
//! record is reported at the level the schema gives for it.

use crate::sfm::ast::{Node, Position};
use crate::sfm::error::{Diagnostic, ErrorKind, ErrorLevel, ParseError};
use crate::sfm::parser::{Parser, ParserOptions};
use crate::sfm::style::Stylesheet;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// A parsed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Integer(i64),
    Decimal(f64),
    List(Vec<FieldValue>),
    Set(BTreeSet<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            FieldValue::Decimal(n) => Some(*n),
            FieldValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            FieldValue::Set(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Flag(b) => write!(f, "{}", b),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Decimal(n) => write!(f, "{}", n),
            FieldValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(" "))
            }
            FieldValue::Set(items) => {
                let parts: Vec<&str> = items.iter().map(String::as_str).collect();
                f.write_str(&parts.join(" "))
            }
        }
    }
}

/// Turns the raw text of a field into a value, or explains why it cannot
pub type ValueParser = Arc<dyn Fn(&str) -> Result<FieldValue, String> + Send + Sync>;

// ----------------------------------------------------------------------------
// Value parsers
// ----------------------------------------------------------------------------

/// The value as written, surrounding whitespace removed
pub fn text() -> ValueParser {
    Arc::new(|value| Ok(FieldValue::Text(value.trim().to_string())))
}

/// Like [`text`], rejecting blank values
pub fn non_empty(parser: ValueParser) -> ValueParser {
    Arc::new(move |value| {
        if value.trim().is_empty() {
            return Err("missing value".to_string());
        }
        parser(value)
    })
}

/// Interpret a flag field value: `0`, `no`, `off`, `false` and `none` are
/// false, anything else (even an empty value) is true
pub fn is_flag_set(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "no" | "off" | "false" | "none"
    )
}

/// A switch; see [`is_flag_set`]
pub fn flag() -> ValueParser {
    Arc::new(|value| Ok(FieldValue::Flag(is_flag_set(value))))
}

pub fn integer() -> ValueParser {
    Arc::new(|value| {
        let value = value.trim();
        value
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|err| format!("invalid integer '{}': {}", value, err))
    })
}

pub fn decimal() -> ValueParser {
    Arc::new(|value| {
        let value = value.trim();
        value
            .parse::<f64>()
            .map(FieldValue::Decimal)
            .map_err(|_| format!("invalid number '{}'", value))
    })
}

/// Split on `delimiter` (any whitespace for `' '`), drop empty items and
/// parse each with `item`
pub fn sequence(item: ValueParser, delimiter: char) -> ValueParser {
    Arc::new(move |value| {
        let parts: Vec<&str> = if delimiter == ' ' {
            value.split_whitespace().collect()
        } else {
            value.split(delimiter).map(str::trim).filter(|p| !p.is_empty()).collect()
        };
        parts
            .into_iter()
            .map(|part| item(part))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::List)
    })
}

/// Collapse the result of `parser` into a set of distinct items
pub fn unique(parser: ValueParser) -> ValueParser {
    Arc::new(move |value| {
        let items = match parser(value)? {
            FieldValue::List(items) => items.iter().map(ToString::to_string).collect(),
            FieldValue::Set(items) => items,
            single => BTreeSet::from([single.to_string()]),
        };
        Ok(FieldValue::Set(items))
    })
}

// ----------------------------------------------------------------------------
// Schema
// ----------------------------------------------------------------------------

/// What a record gets for a field it does not contain
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    /// Leave the field out
    Absent,
    /// Fill in this value
    Value(FieldValue),
    /// Report an issue; `{record}` and `{field}` in the message are replaced
    /// with the record's start value and the field name
    Required { level: ErrorLevel, message: String },
}

#[derive(Clone)]
pub struct FieldSpec {
    pub parser: ValueParser,
    pub default: FieldDefault,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Field layout of a record database
#[derive(Debug, Clone)]
pub struct Schema {
    start: String,
    fields: BTreeMap<String, FieldSpec>,
}

impl Schema {
    /// A schema whose records open at the field `start`
    ///
    /// The start field is read with [`text`] until declared otherwise.
    pub fn new(start: impl Into<String>) -> Self {
        let start = start.into();
        let mut fields = BTreeMap::new();
        fields.insert(
            start.clone(),
            FieldSpec {
                parser: text(),
                default: FieldDefault::Absent,
            },
        );
        Self { start, fields }
    }

    /// Declare an optional field with no default
    pub fn field(self, name: impl Into<String>, parser: ValueParser) -> Self {
        self.declare(name, parser, FieldDefault::Absent)
    }

    /// Declare a field filled with `default` when a record lacks it
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        parser: ValueParser,
        default: FieldValue,
    ) -> Self {
        self.declare(name, parser, FieldDefault::Value(default))
    }

    /// Declare a field every record must carry
    pub fn required(
        self,
        name: impl Into<String>,
        parser: ValueParser,
        level: ErrorLevel,
        message: impl Into<String>,
    ) -> Self {
        self.declare(
            name,
            parser,
            FieldDefault::Required {
                level,
                message: message.into(),
            },
        )
    }

    pub fn declare(mut self, name: impl Into<String>, parser: ValueParser, default: FieldDefault) -> Self {
        self.fields.insert(name.into(), FieldSpec { parser, default });
        self
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Stylesheet that makes every declared field a top-level marker
    pub fn stylesheet(&self) -> Stylesheet {
        let mut sheet = Stylesheet::new();
        sheet.extend(self.field_names());
        sheet
    }
}

// ----------------------------------------------------------------------------
// Records
// ----------------------------------------------------------------------------

/// One record: its fields by name, positioned at its start field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub pos: Position,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(pos: Position) -> Self {
        Self {
            pos,
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_flag)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_integer)
    }

    pub fn decimal(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_decimal)
    }

    pub fn set(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.get(name).and_then(FieldValue::as_set)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A parsed record file
#[derive(Debug, Clone, Default)]
pub struct Database {
    /// Fields before the first start field
    pub header: Record,
    pub records: Vec<Record>,
    /// Issues that were reported but not fatal
    pub warnings: Vec<Diagnostic>,
}

/// Parse SFM `source` into records laid out by `schema`
///
/// Source name, error level and default meta come from `options`. Fields the
/// schema does not declare are still parsed, as plain [`text`].
pub fn parse<I, S>(source: I, schema: &Schema, options: ParserOptions) -> Result<Database, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sheet = schema.stylesheet();
    let lines: Vec<String> = source.into_iter().map(|l| l.as_ref().to_string()).collect();
    let mut parser = Parser::new(lines.iter(), &sheet, options)?;
    let mut reporter = Reporter {
        source_name: parser.source_name().to_string(),
        error_level: parser.error_level(),
        warnings: Vec::new(),
    };

    let mut header = Record::new(Position::default());
    let mut records: Vec<Record> = Vec::new();
    for node in parser.by_ref() {
        let Node::Element(field) = node? else {
            continue;
        };
        let Some(name) = field.name() else {
            continue;
        };
        let raw = field
            .content()
            .first()
            .and_then(Node::as_text)
            .map(|t| t.trim_end().to_string())
            .unwrap_or_default();

        if name == schema.start() {
            records.push(Record::new(field.pos()));
        }
        let value_parser = schema.get(name).map_or_else(text, |spec| spec.parser.clone());
        let value = match value_parser(&raw) {
            Ok(value) => value,
            Err(message) => {
                reporter.issue(
                    ErrorLevel::Content,
                    ErrorKind::ContentFormat,
                    field.pos(),
                    format!("\\{}: {}", name, message),
                )?;
                continue;
            }
        };
        let target = records.last_mut().unwrap_or(&mut header);
        target.fields.insert(name.to_string(), value);
    }

    for record in &mut records {
        apply_defaults(schema, record, &mut reporter)?;
    }

    let mut warnings = parser.take_warnings();
    warnings.append(&mut reporter.warnings);
    warnings.sort_by_key(|w| w.pos);
    Ok(Database {
        header,
        records,
        warnings,
    })
}

fn apply_defaults(schema: &Schema, record: &mut Record, reporter: &mut Reporter) -> Result<(), ParseError> {
    let label = record
        .get(schema.start())
        .map(ToString::to_string)
        .unwrap_or_default();
    for (name, spec) in &schema.fields {
        if record.contains(name) {
            continue;
        }
        match &spec.default {
            FieldDefault::Absent => {}
            FieldDefault::Value(value) => {
                record.fields.insert(name.clone(), value.clone());
            }
            FieldDefault::Required { level, message } => {
                let message = message.replace("{record}", &label).replace("{field}", name);
                reporter.issue(*level, ErrorKind::MissingField, record.pos, message)?;
            }
        }
    }
    Ok(())
}

struct Reporter {
    source_name: String,
    error_level: ErrorLevel,
    warnings: Vec<Diagnostic>,
}

impl Reporter {
    fn issue(
        &mut self,
        level: ErrorLevel,
        kind: ErrorKind,
        pos: Position,
        message: String,
    ) -> Result<(), ParseError> {
        let diagnostic = Diagnostic::new(self.source_name.as_str(), pos, level, kind, message);
        if level.is_fatal_at(self.error_level) {
            return Err(diagnostic.into());
        }
        log::warn!("{}", diagnostic);
        self.warnings.push(diagnostic);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfm::lexer::lines;

    fn words(items: &[&str]) -> FieldValue {
        FieldValue::Set(items.iter().map(|s| s.to_string()).collect())
    }

    fn lexicon() -> Schema {
        Schema::new("lx")
            .required("ps", text(), ErrorLevel::Content, "entry {record} has no \\{field}")
            .field("hm", integer())
            .field_with_default("dt", text(), FieldValue::Text("unknown".to_string()))
            .field_with_default("sn", unique(sequence(text(), ';')), words(&[]))
            .field_with_default("checked", flag(), FieldValue::Flag(false))
    }

    fn load(source: &str, level: ErrorLevel) -> Result<Database, ParseError> {
        parse(lines(source), &lexicon(), ParserOptions::new().error_level(level))
    }

    #[test]
    fn test_records_start_at_the_start_field() {
        let db = load(
            "\\_sh v3.0 Dictionary\n\\lx apple\n\\ps n\n\\hm 2\n\\lx run\n\\ps v\n\\checked\n",
            ErrorLevel::Content,
        )
        .unwrap();

        assert_eq!(db.header.text("_sh"), Some("v3.0 Dictionary"));
        assert_eq!(db.records.len(), 2);
        assert_eq!(db.records[0].text("lx"), Some("apple"));
        assert_eq!(db.records[0].integer("hm"), Some(2));
        assert_eq!(db.records[0].pos, Position::new(2, 1));
        assert_eq!(db.records[1].text("ps"), Some("v"));
        assert_eq!(db.records[1].flag("checked"), Some(true));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let db = load("\\lx apple\n\\ps n\n", ErrorLevel::Content).unwrap();
        let apple = &db.records[0];
        assert_eq!(apple.text("dt"), Some("unknown"));
        assert_eq!(apple.get("sn"), Some(&words(&[])));
        assert_eq!(apple.flag("checked"), Some(false));
        assert!(!apple.contains("hm"));
    }

    #[test]
    fn test_header_gets_no_defaults() {
        let db = load("\\dt 2020-01-01\n\\lx apple\n\\ps n\n", ErrorLevel::Content).unwrap();
        assert_eq!(db.header.text("dt"), Some("2020-01-01"));
        assert!(!db.header.contains("checked"));
        assert_eq!(db.records[0].text("dt"), Some("unknown"));
    }

    #[test]
    fn test_missing_required_field_is_reported() {
        let err = load("\\lx apple\n\\ps n\n\\lx pear\n", ErrorLevel::Content).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.level(), ErrorLevel::Content);
        assert_eq!(err.pos(), Position::new(3, 1));
        assert_eq!(err.message(), "entry pear has no \\ps");
    }

    #[test]
    fn test_missing_required_field_is_a_warning_when_lenient() {
        let db = load("\\lx pear\n", ErrorLevel::Structure).unwrap();
        assert_eq!(db.records.len(), 1);
        assert!(!db.records[0].contains("ps"));
        assert_eq!(db.warnings.len(), 1);
        assert_eq!(db.warnings[0].kind, ErrorKind::MissingField);
    }

    #[test]
    fn test_bad_value_is_a_content_issue() {
        let err = load("\\lx apple\n\\ps n\n\\hm two\n", ErrorLevel::Content).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContentFormat);
        assert_eq!(
            err.message(),
            "\\hm: invalid integer 'two': invalid digit found in string"
        );

        let db = load("\\lx apple\n\\ps n\n\\hm two\n", ErrorLevel::Structure).unwrap();
        assert!(!db.records[0].contains("hm"));
        assert_eq!(db.warnings.len(), 1);
    }

    #[test]
    fn test_sequence_and_unique() {
        let db = load("\\lx bank\n\\ps n\n\\sn river; money ;river\n", ErrorLevel::Content).unwrap();
        assert_eq!(db.records[0].get("sn"), Some(&words(&["money", "river"])));

        let list = sequence(integer(), ' ')("1  2 3").unwrap();
        assert_eq!(
            list,
            FieldValue::List(vec![
                FieldValue::Integer(1),
                FieldValue::Integer(2),
                FieldValue::Integer(3)
            ])
        );
        assert!(sequence(integer(), ' ')("1 x").is_err());
        assert_eq!(unique(text())("same").unwrap(), words(&["same"]));
    }

    #[test]
    fn test_flag_values() {
        assert!(is_flag_set(""));
        assert!(is_flag_set("on"));
        assert!(is_flag_set("whatever"));
        for off in ["0", "no", "off", "false", "none", " NO "] {
            assert!(!is_flag_set(off));
        }
        assert_eq!(flag()("off").unwrap(), FieldValue::Flag(false));
    }

    #[test]
    fn test_non_empty_rejects_blank_values() {
        assert_eq!(non_empty(text())("  ").unwrap_err(), "missing value");
        assert_eq!(non_empty(text())(" x ").unwrap(), FieldValue::Text("x".to_string()));
    }
}
