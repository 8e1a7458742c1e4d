//! Lexer module for SFM source
//!
//! Tokenization is line driven and lazy: each source line (with its
//! terminator) is split by one regular expression into raw markers and text,
//! and consecutive text pieces are merged into a single token. The tokenizer
//! never fails; every character of the input ends up in exactly one token.
//!
//! The lexer does not know about the stylesheet. An end marker such as
//! `\qt*` is just another marker token here, and a marker like `\f*text`
//! that abuts following text is only split later, by the parser, once it
//! knows which end markers are open.

pub mod lexer_impl;
pub mod tokens;

pub use lexer_impl::{
    lines, tokenize, tokenize_with_escapes, tokeniser, PutBack, Tokenizer, DEFAULT_TAG_ESCAPES,
};
pub use tokens::Token;
