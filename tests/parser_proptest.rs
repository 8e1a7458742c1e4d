//! Property-based tests for the parser over generated marker soup
//!
//! Documents are built from words, separators and a small set of markers
//! (known, unknown, nested and end markers) and parsed with a stylesheet of
//! one block marker and one character style. Error level is set to
//! `unrecoverable` so that only stray end markers stop a parse.

use proptest::prelude::*;
use sfm::sfm::ast::{Element, Node};
use sfm::sfm::error::ErrorLevel;
use sfm::sfm::formats::generate;
use sfm::sfm::lexer::{tokenize, Token};
use sfm::sfm::parser::{parse, ParserOptions};
use sfm::sfm::style::{Marker, StyleType, Stylesheet};
use sfm::sfm::tree::copy;
use std::rc::Rc;

fn stylesheet() -> Stylesheet {
    let mut sheet = Stylesheet::new();
    sheet.insert("p", Marker::default_meta());
    sheet.insert(
        "qt",
        Marker::default_meta()
            .with_occurs_under(["p"])
            .with_style_type(StyleType::Character)
            .with_endmarker("qt*"),
    );
    sheet
}

fn parse_doc(source: &str) -> Result<Vec<Node>, sfm::ParseError> {
    parse(
        source,
        &stylesheet(),
        ParserOptions::new().error_level(ErrorLevel::Unrecoverable),
    )
}

fn piece_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z]{1,5}",
        2 => prop::sample::select(vec![" ", "  ", "\n", " \n"]).prop_map(str::to_string),
        3 => prop::sample::select(vec![
            "\\p", "\\qt", "\\qt*", "\\+qt", "\\+qt*", "\\zz",
        ])
        .prop_map(str::to_string),
    ]
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(piece_strategy(), 0..40).prop_map(|pieces| pieces.concat())
}

/// Every element in a forest, depth first
fn elements(nodes: &[Node]) -> Vec<Rc<Element>> {
    let mut found = Vec::new();
    for node in nodes {
        if let Node::Element(e) = node {
            found.push(e.clone());
            found.extend(elements(e.content()));
        }
    }
    found
}

fn texts(nodes: &[Node]) -> Vec<sfm::Text> {
    let mut found = Vec::new();
    for node in nodes {
        match node {
            Node::Text(t) => found.push(t.clone()),
            Node::Element(e) => found.extend(texts(e.content())),
        }
    }
    found
}

#[cfg(test)]
mod invariant_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_parse_never_panics(input in document_strategy()) {
            let _ = parse_doc(&input);
        }

        #[test]
        fn test_positions_are_one_based(input in document_strategy()) {
            if let Ok(doc) = parse_doc(&input) {
                for e in elements(&doc) {
                    prop_assert!(e.pos().line >= 1 && e.pos().column >= 1);
                }
            }
        }

        #[test]
        fn test_text_positions_address_the_source(input in document_strategy()) {
            let lines: Vec<Vec<char>> = input.split('\n').map(|l| l.chars().collect()).collect();
            if let Ok(doc) = parse_doc(&input) {
                for t in texts(&doc) {
                    let first_line: Vec<char> = t.as_str().split('\n').next().unwrap_or("").chars().collect();
                    let line = &lines[t.pos().line - 1];
                    let start = t.pos().column - 1;
                    prop_assert_eq!(&line[start..start + first_line.len()], &first_line[..]);
                }
            }
        }

        #[test]
        fn test_children_point_at_their_parent(input in document_strategy()) {
            if let Ok(doc) = parse_doc(&input) {
                for node in &doc {
                    prop_assert!(node.parent().is_none());
                }
                for e in elements(&doc) {
                    for child in e.content() {
                        let parent = child.parent();
                        prop_assert!(parent.is_some_and(|p| Rc::ptr_eq(&p, &e)));
                    }
                }
            }
        }

        #[test]
        fn test_no_adjacent_text_children(input in document_strategy()) {
            if let Ok(doc) = parse_doc(&input) {
                let mut lists: Vec<&[Node]> = vec![doc.as_slice()];
                let all = elements(&doc);
                lists.extend(all.iter().map(|e| e.content()));
                for nodes in lists {
                    for pair in nodes.windows(2) {
                        prop_assert!(!(pair[0].is_text() && pair[1].is_text()));
                    }
                }
            }
        }

        #[test]
        fn test_generated_source_reparses_equal(input in document_strategy()) {
            if let Ok(doc) = parse_doc(&input) {
                let generated = generate(&doc);
                let reparsed = parse_doc(&generated);
                prop_assert!(reparsed.is_ok(), "reparse of {:?} failed", generated);
                prop_assert_eq!(reparsed.unwrap(), doc);
            }
        }

        #[test]
        fn test_copy_is_idempotent(input in document_strategy()) {
            if let Ok(doc) = parse_doc(&input) {
                let once = copy(&doc);
                let twice = copy(&once);
                prop_assert_eq!(&once, &doc);
                prop_assert_eq!(&twice, &once);
                for (a, b) in elements(&doc).iter().zip(elements(&once).iter()) {
                    prop_assert!(!Rc::ptr_eq(a, b));
                }
            }
        }

        #[test]
        fn test_tokens_rebuild_the_source(input in document_strategy()) {
            let rebuilt: String = tokenize(&input).iter().map(Token::as_str).collect();
            prop_assert_eq!(rebuilt, input);
        }

        #[test]
        fn test_text_tokens_are_coalesced(input in document_strategy()) {
            let tokens = tokenize(&input);
            for pair in tokens.windows(2) {
                prop_assert!(!(pair[0].is_text() && pair[1].is_text()));
            }
        }
    }
}
