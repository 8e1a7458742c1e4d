//! # sfm
//!
//! A stylesheet guided, streaming parser for SFM (Standard Format Marker)
//! text and its USFM flavour.
//!
//! ```rust,ignore
//! use sfm::{usfm, generate};
//!
//! let doc = usfm::parse("\\id GEN\n\\c 1\n\\p\n\\v 1 In the beginning")?;
//! assert_eq!(generate(&doc), "\\id GEN\n\\c 1\n\\p\n\\v 1 In the beginning");
//! ```
//!
//! ## Testing
//!
//! Tree shape assertions live in the [testing module](sfm::testing).

pub mod sfm;

pub use sfm::ast::{Element, Node, Position, Text};
pub use sfm::error::{Diagnostic, ErrorKind, ErrorLevel, ParseError};
pub use sfm::formats::generate;
pub use sfm::parser::{parse, parse_loose, Parser, ParserOptions};
pub use sfm::style::{Marker, StyleType, Stylesheet, TextType};
pub use sfm::usfm;
