//! Stylesheet records
//!
//! A [`Marker`] tells the parser how to treat one marker name: which
//! sub-parser handles its content ([`TextType`]), where it may appear
//! (`occurs_under`), whether it has an explicit end marker, and how it is
//! laid out ([`StyleType`]).
//!
//! `occurs_under` uses `None` for the top level. An empty set means the
//! marker may appear anywhere.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Selects the sub-parser used for an element's content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TextType {
    Default,
    Milestone,
    Other,
    NoteText,
    ChapterNumber,
    VerseNumber,
    VerseText,
    Section,
    Title,
    Unspecified,
    Custom(String),
}

impl TextType {
    pub fn as_str(&self) -> &str {
        match self {
            TextType::Default => "default",
            TextType::Milestone => "Milestone",
            TextType::Other => "Other",
            TextType::NoteText => "NoteText",
            TextType::ChapterNumber => "ChapterNumber",
            TextType::VerseNumber => "VerseNumber",
            TextType::VerseText => "VerseText",
            TextType::Section => "Section",
            TextType::Title => "Title",
            TextType::Unspecified => "Unspecified",
            TextType::Custom(name) => name,
        }
    }
}

impl From<&str> for TextType {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "default" => TextType::Default,
            "milestone" => TextType::Milestone,
            "other" => TextType::Other,
            "notetext" => TextType::NoteText,
            "chapternumber" => TextType::ChapterNumber,
            "versenumber" => TextType::VerseNumber,
            "versetext" => TextType::VerseText,
            "section" => TextType::Section,
            "title" => TextType::Title,
            "unspecified" => TextType::Unspecified,
            _ => TextType::Custom(s.to_string()),
        }
    }
}

impl From<String> for TextType {
    fn from(s: String) -> Self {
        TextType::from(s.as_str())
    }
}

impl From<TextType> for String {
    fn from(t: TextType) -> Self {
        t.as_str().to_string()
    }
}

impl FromStr for TextType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TextType::from(s))
    }
}

impl fmt::Display for TextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout class of a marker; drives generator spacing and implicit closure
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StyleType {
    Paragraph,
    Character,
    Note,
    Milestone,
    Custom(String),
}

impl StyleType {
    pub fn as_str(&self) -> &str {
        match self {
            StyleType::Paragraph => "Paragraph",
            StyleType::Character => "Character",
            StyleType::Note => "Note",
            StyleType::Milestone => "Milestone",
            StyleType::Custom(name) => name,
        }
    }
}

impl From<&str> for StyleType {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "paragraph" => StyleType::Paragraph,
            "character" => StyleType::Character,
            "note" => StyleType::Note,
            "milestone" => StyleType::Milestone,
            _ => StyleType::Custom(s.to_string()),
        }
    }
}

impl From<String> for StyleType {
    fn from(s: String) -> Self {
        StyleType::from(s.as_str())
    }
}

impl From<StyleType> for String {
    fn from(t: StyleType) -> Self {
        t.as_str().to_string()
    }
}

impl FromStr for StyleType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StyleType::from(s))
    }
}

impl fmt::Display for StyleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata record for one marker name
///
/// The `Default` value is an empty record: no text type, unconstrained
/// placement, no end marker. Unknown markers are described by
/// [`Marker::default_meta`] instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marker {
    pub text_type: Option<TextType>,
    pub occurs_under: BTreeSet<Option<String>>,
    pub endmarker: Option<String>,
    pub style_type: Option<StyleType>,
    pub text_properties: BTreeSet<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub rank: Option<i64>,
    pub font_size: Option<i64>,
    /// Boolean presentation fields (`bold`, `italic`, ...) that are switched on
    pub flags: BTreeSet<String>,
    /// Any other field, keyed by its lower-cased name
    pub attributes: BTreeMap<String, String>,
}

impl Marker {
    /// Record used for markers the stylesheet does not know:
    /// default text type, top level only, no end marker
    pub fn default_meta() -> Self {
        Marker {
            text_type: Some(TextType::Default),
            occurs_under: BTreeSet::from([None]),
            ..Marker::default()
        }
    }

    /// Synthetic record registered under an end marker's own name
    pub fn end_marker_for(owner: &str) -> Self {
        Marker {
            text_type: None,
            occurs_under: BTreeSet::from([Some(owner.to_string())]),
            ..Marker::default()
        }
    }

    /// True for records that close another marker instead of starting one
    pub fn is_end_marker(&self) -> bool {
        self.text_type.is_none() && self.owner().is_some()
    }

    /// The single marker an end marker record belongs to
    pub fn owner(&self) -> Option<&str> {
        match self.occurs_under.iter().collect::<Vec<_>>().as_slice() {
            [Some(owner)] => Some(owner.as_str()),
            _ => None,
        }
    }

    pub fn is_character(&self) -> bool {
        self.style_type == Some(StyleType::Character)
    }

    pub fn is_paragraph(&self) -> bool {
        self.style_type == Some(StyleType::Paragraph)
    }

    /// Whether an element of this kind may open under `parent`
    /// (`None` is the top level)
    pub fn may_occur_under(&self, parent: Option<&str>) -> bool {
        self.occurs_under.is_empty()
            || self
                .occurs_under
                .iter()
                .any(|allowed| allowed.as_deref() == parent)
    }

    pub fn with_text_type(mut self, text_type: TextType) -> Self {
        self.text_type = Some(text_type);
        self
    }

    /// Replace the permitted parents with the named markers
    pub fn with_occurs_under<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.occurs_under = parents.into_iter().map(|p| Some(p.into())).collect();
        self
    }

    /// Also permit the marker at the top level
    pub fn with_top_level(mut self) -> Self {
        self.occurs_under.insert(None);
        self
    }

    /// Permit the marker anywhere
    pub fn unconstrained(mut self) -> Self {
        self.occurs_under.clear();
        self
    }

    pub fn with_endmarker(mut self, endmarker: impl Into<String>) -> Self {
        self.endmarker = Some(endmarker.into());
        self
    }

    pub fn with_style_type(mut self, style_type: StyleType) -> Self {
        self.style_type = Some(style_type);
        self
    }

    pub fn with_text_properties<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_properties = props.into_iter().map(Into::into).collect();
        self
    }
}
