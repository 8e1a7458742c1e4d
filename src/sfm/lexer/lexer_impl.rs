//! Implementation of the SFM tokenizer
//!
//! A single regular expression splits each line into three kinds of match:
//!
//! 1. runs of ordinary characters, which may include escaped backslash
//!    sequences (by default only `\\`),
//! 2. a backslash followed by non-whitespace, non-backslash characters,
//!    which is a raw marker,
//! 3. a lone backslash that fits neither rule, which is kept as text.
//!
//! Adjacent text matches are coalesced, across line boundaries too, into a
//! single token positioned at its first character.

use crate::sfm::ast::{Position, Text};
use crate::sfm::lexer::tokens::Token;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;

/// Escape set used when the caller does not supply one: only `\\`
pub const DEFAULT_TAG_ESCAPES: &str = r"\\";

static DEFAULT_TOKENISER: Lazy<Regex> = Lazy::new(|| {
    build_tokeniser(DEFAULT_TAG_ESCAPES).expect("default tokeniser pattern is valid")
});

fn build_tokeniser(tag_escapes: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?s)(?P<text>(?:\\(?:{tag_escapes})|[^\\])+)|(?P<marker>\\[^\s\\]+)|(?P<lone>\\)"
    ))
}

/// Compile the tokenizer pattern for an escape set
///
/// `tag_escapes` is a regular expression fragment matching whatever may
/// follow a backslash for the pair to be treated as plain text.
pub fn tokeniser(tag_escapes: &str) -> Result<Regex, regex::Error> {
    if tag_escapes == DEFAULT_TAG_ESCAPES {
        Ok(DEFAULT_TOKENISER.clone())
    } else {
        build_tokeniser(tag_escapes)
    }
}

/// Split source text into lines that keep their terminators
pub fn lines(source: &str) -> impl Iterator<Item = &str> {
    source.split_inclusive('\n')
}

/// Lazy token stream over a sequence of source lines
pub struct Tokenizer<I> {
    lines: I,
    pattern: Regex,
    line_no: usize,
    line_tokens: VecDeque<Token>,
    pending_text: Option<Text>,
}

impl<I, S> Tokenizer<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub fn new(lines: I, pattern: Regex) -> Self {
        Self {
            lines,
            pattern,
            line_no: 0,
            line_tokens: VecDeque::new(),
            pending_text: None,
        }
    }

    /// Tokenizer with the default escape set
    pub fn with_default_escapes(lines: I) -> Self {
        Self::new(lines, DEFAULT_TOKENISER.clone())
    }

    fn scan_line(&mut self, line: &str) {
        self.line_no += 1;
        let mut byte_offset = 0;
        let mut column = 1;
        for caps in self.pattern.captures_iter(line) {
            let Some(m) = caps.get(0) else { continue };
            column += line[byte_offset..m.start()].chars().count();
            byte_offset = m.start();
            let text = Text::new(m.as_str(), Position::new(self.line_no, column));
            let token = if caps.name("marker").is_some() {
                Token::Marker(text)
            } else {
                Token::Text(text)
            };
            self.line_tokens.push_back(token);
        }
    }
}

impl<I, S> Iterator for Tokenizer<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.line_tokens.pop_front() {
                match token {
                    Token::Text(text) => {
                        self.pending_text = Some(match self.pending_text.take() {
                            Some(head) => head.join(&text),
                            None => text,
                        });
                    }
                    Token::Marker(marker) => {
                        if let Some(text) = self.pending_text.take() {
                            self.line_tokens.push_front(Token::Marker(marker));
                            return Some(Token::Text(text));
                        }
                        return Some(Token::Marker(marker));
                    }
                }
                continue;
            }

            match self.lines.next() {
                Some(line) => self.scan_line(line.as_ref()),
                None => return self.pending_text.take().map(Token::Text),
            }
        }
    }
}

/// Iterator adaptor with a push-back stack and one token of look-ahead
pub struct PutBack<I: Iterator> {
    inner: I,
    stack: Vec<I::Item>,
}

impl<I: Iterator> PutBack<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            stack: Vec::new(),
        }
    }

    /// Return an item to the stream; it is the next one yielded
    pub fn put_back(&mut self, item: I::Item) {
        self.stack.push(item);
    }

    pub fn peek(&mut self) -> Option<&I::Item> {
        if self.stack.is_empty() {
            let item = self.inner.next()?;
            self.stack.push(item);
        }
        self.stack.last()
    }
}

impl<I: Iterator> Iterator for PutBack<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        self.stack.pop().or_else(|| self.inner.next())
    }
}

/// Convenience function to tokenize a string with the default escapes
pub fn tokenize(source: &str) -> Vec<Token> {
    Tokenizer::with_default_escapes(lines(source)).collect()
}

/// Convenience function to tokenize a string with a custom escape set
pub fn tokenize_with_escapes(source: &str, tag_escapes: &str) -> Result<Vec<Token>, regex::Error> {
    Ok(Tokenizer::new(lines(source), tokeniser(tag_escapes)?).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(tokens: &[Token]) -> Vec<(bool, &str, usize, usize)> {
        tokens
            .iter()
            .map(|t| (t.is_marker(), t.as_str(), t.pos().line, t.pos().column))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_plain_text_is_one_token() {
        let tokens = tokenize("plain text");
        assert_eq!(summary(&tokens), vec![(false, "plain text", 1, 1)]);
    }

    #[test]
    fn test_marker_and_text() {
        let tokens = tokenize("\\li1 text\n\\l2\n");
        assert_eq!(
            summary(&tokens),
            vec![
                (true, "\\li1", 1, 1),
                (false, " text\n", 1, 5),
                (true, "\\l2", 2, 1),
                (false, "\n", 2, 4),
            ]
        );
    }

    #[test]
    fn test_text_coalesces_across_lines() {
        let tokens = tokenize("\\sfm text\nbare text\n\\more-sfm more text\nover a line break\\marker");
        assert_eq!(
            summary(&tokens),
            vec![
                (true, "\\sfm", 1, 1),
                (false, " text\nbare text\n", 1, 5),
                (true, "\\more-sfm", 3, 1),
                (false, " more text\nover a line break", 3, 10),
                (true, "\\marker", 4, 18),
            ]
        );
    }

    #[test]
    fn test_end_markers_split_at_backslash() {
        let tokens = tokenize("\\+qt quote\\+qt*\\qt*");
        assert_eq!(
            summary(&tokens),
            vec![
                (true, "\\+qt", 1, 1),
                (false, " quote", 1, 5),
                (true, "\\+qt*", 1, 11),
                (true, "\\qt*", 1, 16),
            ]
        );
    }

    #[test]
    fn test_escaped_backslash_stays_in_text() {
        let tokens = tokenize("\\escaped backslash\\\\character");
        assert_eq!(
            summary(&tokens),
            vec![
                (true, "\\escaped", 1, 1),
                (false, " backslash\\\\character", 1, 9),
            ]
        );
    }

    #[test]
    fn test_lone_backslash_is_text() {
        let tokens = tokenize("a \\ b\\");
        assert_eq!(summary(&tokens), vec![(false, "a \\ b\\", 1, 1)]);
    }

    #[test]
    fn test_extended_escapes() {
        let tokens =
            tokenize_with_escapes("\\test2 \\\\backslash \\^hat \\%\\test3", "[^0-9a-zA-Z]").unwrap();
        assert_eq!(
            summary(&tokens),
            vec![
                (true, "\\test2", 1, 1),
                (false, " \\\\backslash \\^hat \\%", 1, 7),
                (true, "\\test3", 1, 28),
            ]
        );
    }

    #[test]
    fn test_columns_count_characters() {
        let tokens = tokenize("ἀρχῇ\\w");
        assert_eq!(summary(&tokens)[1], (true, "\\w", 1, 5));
    }

    #[test]
    fn test_invalid_escape_pattern_is_an_error() {
        assert!(tokeniser("(").is_err());
    }

    #[test]
    fn test_put_back_and_peek() {
        let mut it = PutBack::new(vec![1, 2, 3].into_iter());
        assert_eq!(it.next(), Some(1));
        assert_eq!(it.next(), Some(2));
        it.put_back(256);
        assert_eq!(it.next(), Some(256));
        assert_eq!(it.peek(), Some(&3));
        it.put_back(512);
        assert_eq!(it.peek(), Some(&512));
        assert_eq!(it.next(), Some(512));
        assert_eq!(it.next(), Some(3));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_put_back_is_last_in_first_out() {
        let mut it = PutBack::new(Vec::<i32>::new().into_iter());
        it.put_back(1);
        it.put_back(2);
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.next(), Some(1));
        assert_eq!(it.next(), None);
    }
}
