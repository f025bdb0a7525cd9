use super::*;

fn test_doc(text: &str) -> Document {
    Document::new(Url::parse("file:///packet.h").unwrap(), text.to_string(), 1)
}

fn pos(
    line: u32,
    character: u32,
) -> Position {
    Position {
        line,
        character,
    }
}

#[test]
fn line_offsets_basic() {
    let doc = test_doc("struct A {\n    int x;\n};\n");
    assert_eq!(doc.line_count(), 4);
    assert_eq!(doc.line_text(1), Some("    int x;"));
    assert_eq!(doc.line_text(3), Some(""));
    assert_eq!(doc.line_text(4), None);
}

#[test]
fn offset_roundtrip() {
    let doc = test_doc("struct A {\n    int x;\n};\n");
    let off = doc.offset_of(pos(1, 4)).unwrap();
    assert_eq!(off, 15);
    assert_eq!(doc.position_of(off), pos(1, 4));
}

#[test]
fn offset_past_line_end_clamps_before_newline() {
    let doc = test_doc("ab\ncd");
    assert_eq!(doc.offset_of(pos(0, 40)), Some(2));
}

#[test]
fn text_in_selection() {
    let doc = test_doc("    TransmissionHeader header;\n");
    let range = Range {
        start: pos(0, 4),
        end: pos(0, 22),
    };
    assert_eq!(doc.text_in(range), Some("TransmissionHeader"));

    let reversed = Range {
        start: pos(0, 22),
        end: pos(0, 4),
    };
    assert_eq!(doc.text_in(reversed), None);
}

#[test]
fn word_at_position() {
    let doc = test_doc("    struct EventChain* n;");
    let (word, range) = doc.word_at(pos(0, 14)).unwrap();
    assert_eq!(word, "EventChain");
    assert_eq!(range.start, pos(0, 11));
    assert_eq!(range.end, pos(0, 21));
}

#[test]
fn word_at_end_of_identifier() {
    let doc = test_doc("Packet");
    assert_eq!(doc.word_at(pos(0, 6)).map(|(w, _)| w), Some("Packet".to_string()));
    assert!(test_doc("a = ;").word_at(pos(0, 4)).is_none());
}

#[test]
fn incremental_change() {
    let mut doc = test_doc("struct Old {};");
    doc.apply_changes(
        vec![TextDocumentContentChangeEvent {
            range: Some(Range {
                start: pos(0, 7),
                end: pos(0, 10),
            }),
            range_length: None,
            text: "Renamed".to_string(),
        }],
        2,
    );
    assert_eq!(doc.text, "struct Renamed {};");
    assert_eq!(doc.version, 2);
}

#[test]
fn full_change_replaces_text() {
    let mut doc = test_doc("one\ntwo");
    doc.apply_changes(
        vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "a\nb\nc\n".to_string(),
        }],
        3,
    );
    assert_eq!(doc.line_count(), 4);
    assert_eq!(doc.version, 3);
}
