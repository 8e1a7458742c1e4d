//! Data model for parsed SFM documents
//!
//! A parse produces a forest of [`Node`]s: marker-rooted [`Element`]s and
//! bare [`Text`] runs, each stamped with the [`Position`] it started at.
//!
//! ## Modules
//!
//! - `position` - 1-based line/column positions
//! - `text` - position aware strings
//! - `element` - elements, nodes, annotations and the element builder

pub mod element;
pub mod position;
pub mod text;

pub use element::{
    Annotations, Element, ElementBuilder, Node, CONTENT_PROMOTED, IMPLICIT_CLOSED, NESTED,
};
pub use position::Position;
pub use text::Text;
