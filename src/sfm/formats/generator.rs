//! Re-serialisation of parsed forests to SFM source
//!
//! The output reparses (with the same stylesheet and options) to a forest
//! equal to the one it was generated from. It is not byte for byte the
//! original source:
//!
//! - an empty character style element is written with a single space body,
//! - a paragraph style element whose first child is an element is followed
//!   by a line break, whatever separated them originally,
//! - end markers that were missing in the source stay missing.

use crate::sfm::ast::{Element, Node};

/// Write a forest back out as SFM text
pub fn generate(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

/// Write a single element and its content
pub fn generate_element(element: &Element) -> String {
    let mut out = String::new();
    write_element(element, &mut out);
    out
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text.as_str()),
            Node::Element(element) => write_element(element, out),
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    let mut body = String::new();
    write_nodes(element.content(), &mut body);

    let Some(name) = element.name() else {
        out.push_str(&body);
        return;
    };

    let meta = element.meta();
    let nested = if element.is_nested() { "+" } else { "" };
    out.push('\\');
    out.push_str(nested);
    out.push_str(name);
    for arg in element.args() {
        out.push(' ');
        out.push_str(arg);
    }

    match element.content().first() {
        Some(Node::Element(_)) if meta.is_paragraph() => out.push('\n'),
        Some(_) => {
            if !body.starts_with('\n') && !body.starts_with("\r\n") {
                out.push(' ');
            }
        }
        None if meta.is_character() => body.push(' '),
        None => {}
    }
    out.push_str(&body);

    if let Some(endmarker) = &meta.endmarker {
        if !element.is_implicitly_closed() {
            out.push('\\');
            out.push_str(nested);
            out.push_str(endmarker);
        }
    }
}
