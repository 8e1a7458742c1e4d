//! Position aware text nodes
//!
//! A [`Text`] is a string that remembers where it came from. Every derived
//! value keeps a position consistent with the source:
//!
//! - slicing or left-trimming advances the column by the number of
//!   characters removed,
//! - right-trimming keeps the position,
//! - concatenation takes the position of the leftmost piece,
//! - splitting gives each piece the position of its first character.
//!
//! Offsets are counted in characters. A text node never spans more than one
//! tokenizer run, so column arithmetic is only meaningful up to the first
//! line break inside the value.

use super::element::Element;
use super::position::Position;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// A run of text with its source position and a back-reference to its parent
#[derive(Clone)]
pub struct Text {
    value: String,
    pos: Position,
    parent: RefCell<Weak<Element>>,
}

impl Text {
    pub fn new(value: impl Into<String>, pos: Position) -> Self {
        Self {
            value: value.into(),
            pos,
            parent: RefCell::new(Weak::new()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    /// The element containing this text, if it is still alive
    pub fn parent(&self) -> Option<Rc<Element>> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: Weak<Element>) {
        *self.parent.borrow_mut() = parent;
    }

    pub fn into_string(self) -> String {
        self.value
    }

    /// Number of characters in the value
    pub fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Characters `start..end` (character indices, `end` clamped to the length)
    pub fn slice(&self, start: usize, end: usize) -> Text {
        let value: String = self
            .value
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect();
        self.derive(value, start)
    }

    /// Everything after the first `n` characters
    pub fn skip(&self, n: usize) -> Text {
        let value: String = self.value.chars().skip(n).collect();
        self.derive(value, n)
    }

    pub fn trim_start(&self) -> Text {
        let trimmed = self.value.trim_start();
        let removed = self.value[..self.value.len() - trimmed.len()].chars().count();
        self.derive(trimmed.to_string(), removed)
    }

    pub fn trim_end(&self) -> Text {
        self.derive(self.value.trim_end().to_string(), 0)
    }

    pub fn trim(&self) -> Text {
        self.trim_start().trim_end()
    }

    /// Split on `sep`, giving each piece the position of its first character
    pub fn split(&self, sep: &str) -> Vec<Text> {
        let sep_len = sep.chars().count();
        let mut offset = 0;
        let mut pieces = Vec::new();
        for piece in self.value.split(sep) {
            pieces.push(self.derive(piece.to_string(), offset));
            offset += piece.chars().count() + sep_len;
        }
        pieces
    }

    /// Join adjacent texts into one node positioned at the first of them
    pub fn concat<I>(texts: I) -> Option<Text>
    where
        I: IntoIterator<Item = Text>,
    {
        let mut texts = texts.into_iter();
        let mut head = texts.next()?;
        for text in texts {
            head.value.push_str(&text.value);
        }
        Some(head)
    }

    /// This text followed by `rhs`, keeping this text's position
    pub fn join(&self, rhs: &str) -> Text {
        let mut value = String::with_capacity(self.value.len() + rhs.len());
        value.push_str(&self.value);
        value.push_str(rhs);
        self.derive(value, 0)
    }

    /// Same text, re-anchored at a different position
    pub fn with_pos(&self, pos: Position) -> Text {
        Text {
            value: self.value.clone(),
            pos,
            parent: self.parent.clone(),
        }
    }

    fn derive(&self, value: String, char_offset: usize) -> Text {
        Text {
            value,
            pos: self.pos.advance(char_offset),
            parent: self.parent.clone(),
        }
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &str {
        &self.value
    }
}

impl AsRef<str> for Text {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Text {}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text({:?} @ {}:{})", self.value, self.pos.line, self.pos.column)
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Text", 2)?;
        state.serialize_field("text", &self.value)?;
        state.serialize_field("pos", &self.pos)?;
        state.end()
    }
}
