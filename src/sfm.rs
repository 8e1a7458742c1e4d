//! Main module for sfm library functionality
//!
//! Parsing runs in two stages. The [lexer] cuts source lines into marker and
//! text tokens; the [parser] pulls those tokens and, guided by a
//! [stylesheet](style), builds a forest of [elements and text](ast). The
//! forest can be reshaped with the [tree] operations and written back out
//! through [formats]. Flat SFM databases, `.sty` files among them, are read
//! into [records] by the same parser.

pub mod ast;
pub mod config;
pub mod error;
pub mod formats;
pub mod lexer;
pub mod parser;
pub mod records;
pub mod style;
pub mod testing;
pub mod tree;
pub mod usfm;

pub use ast::{Element, Node, Position, Text};
pub use error::{Diagnostic, ErrorKind, ErrorLevel, ParseError};
pub use parser::{Parser, ParserOptions};
pub use style::{Marker, StyleType, Stylesheet, TextType};
