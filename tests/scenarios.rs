//! End-to-end parser scenarios and error paths
//!
//! Each test parses a small document through the public API and checks the
//! resulting forest with the fluent assertions from `sfm::sfm::testing`.

use rstest::rstest;
use sfm::sfm::error::{ErrorKind, ErrorLevel};
use sfm::sfm::lexer::lines;
use sfm::sfm::parser::{parse, parse_loose, Parser, ParserOptions};
use sfm::sfm::style::{Marker, StyleType, Stylesheet};
use sfm::sfm::testing::assert_nodes;
use sfm::sfm::Node;

fn quote() -> Marker {
    Marker::default_meta()
        .with_occurs_under(["p"])
        .with_style_type(StyleType::Character)
        .with_endmarker("qt*")
}

fn title_sheet() -> Stylesheet {
    let mut sheet = Stylesheet::new();
    sheet.extend(["id"]);
    sheet.insert("mt", Marker::default_meta().with_occurs_under(["id"]));
    sheet.insert("p", Marker::default_meta().with_occurs_under(["mt"]));
    sheet.insert("qt", quote());
    sheet
}

fn paragraph_sheet() -> Stylesheet {
    let mut sheet = Stylesheet::new();
    sheet.extend(["p"]);
    sheet.insert("qt", quote());
    sheet
}

#[test]
fn test_bare_text() {
    let doc = parse_loose("plain text").unwrap();
    assert_nodes(&doc).count(1).node(0, |t| {
        t.text("plain text").pos(1, 1);
    });
}

#[test]
fn test_markers_coalesce_text() {
    let doc = parse_loose(
        "\\lonely\n\\sfm text\nbare text\n\\more-sfm more text\nover a line break\\marker",
    )
    .unwrap();

    assert_nodes(&doc)
        .names(&[Some("lonely"), Some("sfm"), Some("more-sfm"), Some("marker")])
        .node(0, |lonely| {
            lonely.element("lonely").text("\n");
        })
        .node(1, |sfm| {
            sfm.element("sfm").pos(2, 1).text("text\nbare text\n");
        })
        .node(2, |more| {
            more.element("more-sfm").text("more text\nover a line break");
        })
        .node(3, |marker| {
            marker.element("marker").pos(5, 18).empty();
        });
}

#[test]
fn test_escaped_backslash() {
    let doc = parse_loose("\\marker text\n\\escaped backslash\\\\character").unwrap();
    assert_nodes(&doc).count(2).node(1, |escaped| {
        escaped
            .element("escaped")
            .child_count(1)
            .text("backslash\\\\character");
    });
}

#[test]
fn test_stylesheet_hierarchy() {
    let mut sheet = Stylesheet::new();
    sheet.extend(["id", "ide", "h"]);
    sheet.insert("rem", Marker::default_meta().with_occurs_under(["ide"]));
    let doc = parse(
        "\\id MAT EN\n\\ide UTF-8\n\\rem from MATTHEW\n\\h Mathew",
        &sheet,
        ParserOptions::new(),
    )
    .unwrap();

    assert_nodes(&doc)
        .names(&[Some("id"), Some("ide"), Some("h")])
        .node(1, |ide| {
            ide.element("ide")
                .text("UTF-8\n")
                .child(1, |rem| {
                    rem.element("rem").pos(3, 1).text("from MATTHEW\n");
                });
        })
        .node(2, |h| {
            h.element("h").text("Mathew");
        });
}

#[test]
fn test_nested_inline() {
    let doc = parse(
        "\\id TEST\\mt \\p A paragraph \\qt A \\+qt quote\\+qt*\\qt*",
        &title_sheet(),
        ParserOptions::new(),
    )
    .unwrap();

    assert_nodes(&doc).count(1).node(0, |id| {
        id.element("id").text("TEST").child(1, |mt| {
            mt.element("mt").child_count(1).child(0, |p| {
                p.element("p").text("A paragraph ").child(1, |qt| {
                    qt.element("qt")
                        .nested(false)
                        .implicitly_closed(false)
                        .text("A ")
                        .child(1, |inner| {
                            inner
                                .element("qt")
                                .nested(true)
                                .implicitly_closed(false)
                                .text("quote");
                        });
                });
            });
        });
    });
}

#[rstest]
#[case::at_end_of_text("\\p text \\qt open", "open")]
#[case::right_after_marker("\\p text \\qt ", "")]
fn test_implicit_close_at_end_of_input(#[case] source: &str, #[case] quoted: &str) {
    let sheet = paragraph_sheet();
    let mut parser = Parser::new(lines(source), &sheet, ParserOptions::new()).unwrap();
    let doc: Vec<Node> = parser.by_ref().collect::<Result<_, _>>().unwrap();

    assert_nodes(&doc).count(1).node(0, |p| {
        p.element("p").implicitly_closed(false).child(1, |qt| {
            qt.element("qt").implicitly_closed(true).text(quoted);
        });
    });
    assert!(parser.warnings().is_empty());
}

// ----------------------------------------------------------------------------
// Error paths
// ----------------------------------------------------------------------------

#[rstest]
#[case::strict(ErrorLevel::Marker, true)]
#[case::loose(ErrorLevel::Content, false)]
fn test_unknown_marker(#[case] level: ErrorLevel, #[case] fatal: bool) {
    let sheet = paragraph_sheet();
    let options = ParserOptions::new().error_level(level);
    let result = parse("\\p text\n\\xyz more", &sheet, options);

    match result {
        Err(err) if fatal => {
            assert_eq!(err.kind(), ErrorKind::UnknownMarker);
            assert_eq!(
                err.to_string(),
                "<string>: line 2,1: unknown marker \\xyz: not in stylesheet"
            );
        }
        Ok(doc) if !fatal => {
            assert_nodes(&doc).names(&[Some("p"), Some("xyz")]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[rstest]
#[case::loose(ErrorLevel::Content)]
#[case::lenient(ErrorLevel::Unrecoverable)]
fn test_orphan_end_marker(#[case] level: ErrorLevel) {
    let sheet = paragraph_sheet();
    let options = ParserOptions::new().source_name("orphan.sfm").error_level(level);
    let err = parse("\\qt*", &sheet, options).unwrap_err();

    assert_eq!(err.level(), ErrorLevel::Unrecoverable);
    assert_eq!(err.kind(), ErrorKind::OrphanEndMarker);
    assert_eq!(
        err.to_string(),
        "orphan.sfm: line 1,1: orphan end marker \\qt*: no matching opening marker \\qt"
    );
}

#[rstest]
#[case::note(ErrorLevel::Note)]
#[case::content(ErrorLevel::Content)]
fn test_implicit_close_of_inline_span(#[case] level: ErrorLevel) {
    let sheet = paragraph_sheet();
    let options = ParserOptions::new().error_level(level);
    let mut parser = Parser::new(lines("\\p one \\qt two \\p three"), &sheet, options).unwrap();
    let doc: Vec<Node> = parser.by_ref().collect::<Result<_, _>>().unwrap();

    assert_nodes(&doc)
        .names(&[Some("p"), Some("p")])
        .node(0, |p| {
            p.element("p").child(1, |qt| {
                qt.element("qt").implicitly_closed(true).text("two ");
            });
        });

    let warnings = parser.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].level, ErrorLevel::Note);
    assert_eq!(warnings[0].kind, ErrorKind::ImplicitClose);
    assert_eq!(
        warnings[0].message,
        "implicit end marker before \\p: \\qt (line 1,8) closed without \\qt*"
    );
}

fn section_sheet() -> Stylesheet {
    let mut sheet = Stylesheet::new();
    sheet.insert("sec", Marker::default_meta().with_endmarker("sec*"));
    sheet
}

#[test]
fn test_unterminated_block_is_fatal_at_content() {
    let sheet = section_sheet();
    let options = ParserOptions::new().error_level(ErrorLevel::Content);
    let err = parse("\\sec one \\sec two", &sheet, options).unwrap_err();

    assert_eq!(err.level(), ErrorLevel::Content);
    assert_eq!(err.kind(), ErrorKind::ImplicitClose);
    assert_eq!(err.pos().line, 1);
    assert_eq!(err.pos().column, 10);
    assert_eq!(
        err.message(),
        "implicit end marker before \\sec: \\sec (line 1,1) should be closed with \\sec*"
    );
}

#[test]
fn test_unterminated_block_is_a_warning_at_structure() {
    let sheet = section_sheet();
    let options = ParserOptions::new().error_level(ErrorLevel::Structure);
    let mut parser = Parser::new(lines("\\sec one \\sec two"), &sheet, options).unwrap();
    let doc: Vec<Node> = parser.by_ref().collect::<Result<_, _>>().unwrap();

    assert_nodes(&doc)
        .names(&[Some("sec"), Some("sec")])
        .node(0, |sec| {
            sec.element("sec").implicitly_closed(true).text("one ");
        });
    assert_eq!(parser.warnings().len(), 1);
    assert_eq!(parser.warnings()[0].level, ErrorLevel::Content);
}
