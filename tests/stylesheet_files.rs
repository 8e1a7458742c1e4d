//! Loading `.sty` files from disk and parsing documents with them

use sfm::sfm::error::ErrorLevel;
use sfm::sfm::formats::generate;
use sfm::sfm::parser::{parse, ParserOptions};
use sfm::sfm::style::{self, StyleError, StyleType, Stylesheet, TextType};
use sfm::sfm::testing::assert_nodes;
use sfm::sfm::usfm;
use std::collections::BTreeSet;

const POETRY_STY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/poetry.sty");

const PSALM: &str = "\\book Psalms\n\\s Morning\n\\q Wake \\w up\\w* now\n\\q and \\w sing \\+w loud\\+w*\\w*\n";

fn poetry() -> Stylesheet {
    style::from_path(POETRY_STY, ErrorLevel::Content).expect("fixture stylesheet loads")
}

#[test]
fn test_records_from_file() {
    let sheet = poetry();
    let names: Vec<&str> = sheet.names().collect();
    assert_eq!(names, ["book", "q", "s", "w", "w*"]);

    let book = sheet.get("book").unwrap();
    assert_eq!(book.name.as_deref(), Some("book - Identification"));
    assert_eq!(book.occurs_under, BTreeSet::from([None]));

    let q = sheet.get("q").unwrap();
    assert_eq!(q.text_type, Some(TextType::VerseText));
    assert!(q.text_properties.contains("poetic"));

    let w = sheet.get("w").unwrap();
    assert_eq!(w.style_type, Some(StyleType::Character));
    assert_eq!(w.endmarker.as_deref(), Some("w*"));
    assert!(w.may_occur_under(Some("q")));
    assert!(w.may_occur_under(Some("w")));
    assert!(w.flags.contains("italic"));
    assert_eq!(sheet.get("w*").unwrap().owner(), Some("w"));
}

#[test]
fn test_document_follows_file_hierarchy() {
    let sheet = poetry();
    let doc = parse(PSALM, &sheet, ParserOptions::new()).unwrap();

    assert_nodes(&doc).count(1).node(0, |book| {
        book.element("book").child(1, |s| {
            s.element("s")
                .text("Morning\n")
                .children(|nodes| {
                    nodes.names(&[None, Some("q"), Some("q")]);
                })
                .child(1, |q| {
                    q.element("q")
                        .text("Wake  now\n")
                        .child(1, |w| {
                            w.element("w").nested(false).text("up");
                        });
                })
                .child(2, |q| {
                    q.element("q").pos(4, 1).child(1, |w| {
                        w.element("w").text("sing ").child(1, |inner| {
                            inner.element("w").nested(true).implicitly_closed(false).text("loud");
                        });
                    });
                });
        });
    });

    assert_eq!(generate(&doc), PSALM);
}

#[test]
fn test_layering_over_usfm() {
    let mut sheet = usfm::stylesheet().clone();
    sheet.update(&poetry());
    assert!(sheet.contains("book"));
    assert!(sheet.contains("w*"));
    assert!(sheet.contains("p"));
    assert_eq!(
        sheet.get("q").unwrap().occurs_under,
        BTreeSet::from([Some("s".to_string())])
    );
}

#[test]
fn test_missing_file() {
    let missing = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/missing.sty");
    match style::from_path(missing, ErrorLevel::Content) {
        Err(StyleError::Io(_)) => {}
        other => panic!("expected an IO error, got {:?}", other),
    }
}

#[test]
fn test_errors_name_the_file() {
    let err = style::parse_named(
        ["\\Marker x", "\\Rank first"],
        "broken.sty",
        ErrorLevel::Content,
    )
    .unwrap_err();
    assert_eq!(err.source_name(), "broken.sty");
    assert_eq!(
        err.to_string(),
        "broken.sty: line 2,1: \\rank: invalid integer 'first': invalid digit found in string"
    );
}

#[test]
fn test_record_without_marker_is_dropped_when_lenient() {
    let sheet = style::parse_named(
        ["\\Marker", "\\Bold", "\\Marker ok", "\\Italic"],
        "blank.sty",
        ErrorLevel::Structure,
    )
    .unwrap();
    let names: Vec<&str> = sheet.names().collect();
    assert_eq!(names, ["ok"]);
    assert!(sheet.get("ok").unwrap().flags.contains("italic"));
}
