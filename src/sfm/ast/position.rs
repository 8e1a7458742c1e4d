//! Source positions attached to tokens, text nodes and elements
//!
//! Positions are 1-based `(line, column)` pairs. Columns count characters,
//! not bytes, so a position always addresses the same character no matter
//! how the line is encoded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in SFM source (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The position `delta` characters further along the same line
    pub fn advance(self, delta: usize) -> Self {
        Self {
            line: self.line,
            column: self.column + delta,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {},{}", self.line, self.column)
    }
}
