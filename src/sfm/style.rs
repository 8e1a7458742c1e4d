//! Stylesheet model
//!
//! - `marker` - the per-marker record and its text/style type enums
//! - `stylesheet` - the name to record map, with synthetic end marker records
//! - `sty_file` - loader for the textual `.sty` format

pub mod marker;
pub mod sty_file;
pub mod stylesheet;

pub use marker::{Marker, StyleType, TextType};
pub use sty_file::{from_path, is_flag_set, parse, parse_named, StyleError};
pub use stylesheet::Stylesheet;
