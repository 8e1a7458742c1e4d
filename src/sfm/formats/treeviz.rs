//! Treeviz formatter for parsed forests
//!
//! One line per node, with box drawing connectors showing the nesting:
//!
//! ```text
//! ⧉ 1 node
//! └─ ¶ \id
//!   ├─ ◦ "GEN\n"
//!   └─ ¶ \c 1
//!     └─ ¶ \p
//! ```
//!
//! Icons
//!     Paragraph: ¶
//!     Character: ⊙
//!     Note: †
//!     Milestone: ◆
//!     Anonymous element: ⋯
//!     Any other element: ○
//!     Text: ◦
//!
//! Element labels show the marker, its arguments and its annotation keys;
//! text labels show the escaped text, truncated to 30 characters.

use crate::sfm::ast::{Element, Node};
use crate::sfm::style::{StyleType, TextType};

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn get_icon(element: &Element) -> &'static str {
    if element.name().is_none() {
        return "⋯";
    }
    let meta = element.meta();
    match (&meta.style_type, &meta.text_type) {
        (_, Some(TextType::Milestone)) => "◆",
        (Some(StyleType::Milestone), _) => "◆",
        (Some(StyleType::Paragraph), _) => "¶",
        (Some(StyleType::Character), _) => "⊙",
        (Some(StyleType::Note), _) => "†",
        _ => "○",
    }
}

fn element_label(element: &Element) -> String {
    let mut label = match element.name() {
        Some(name) => {
            let nested = if element.is_nested() { "+" } else { "" };
            format!("\\{}{}", nested, name)
        }
        None => "(anonymous)".to_string(),
    };
    for arg in element.args() {
        label.push(' ');
        label.push_str(arg);
    }
    let annotations: Vec<&str> = element
        .annotations()
        .iter()
        .map(|(key, _)| key.as_str())
        .collect();
    if !annotations.is_empty() {
        label.push_str(&format!(" [{}]", annotations.join(", ")));
    }
    label
}

fn text_label(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('\r', "\\r").replace('\n', "\\n");
    format!("\"{}\"", truncate(&escaped, 30))
}

fn format_node(node: &Node, prefix: &str, is_last: bool, output: &mut String) {
    let connector = if is_last { "└─" } else { "├─" };
    match node {
        Node::Text(text) => {
            output.push_str(&format!("{}{} ◦ {}\n", prefix, connector, text_label(text)));
        }
        Node::Element(element) => {
            output.push_str(&format!(
                "{}{} {} {}\n",
                prefix,
                connector,
                get_icon(element),
                element_label(element)
            ));
            let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
            format_children(element.content(), &child_prefix, output);
        }
    }
}

fn format_children(nodes: &[Node], prefix: &str, output: &mut String) {
    let count = nodes.len();
    for (i, node) in nodes.iter().enumerate() {
        format_node(node, prefix, i + 1 == count, output);
    }
}

/// Render a forest as a tree, one line per node
pub fn to_treeviz_str(nodes: &[Node]) -> String {
    let noun = if nodes.len() == 1 { "node" } else { "nodes" };
    let mut output = format!("⧉ {} {}\n", nodes.len(), noun);
    format_children(nodes, "", &mut output);
    output
}
