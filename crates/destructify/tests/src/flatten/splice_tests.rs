use super::*;

const BLOCK: &str = "|\n    char* buf;\n    int len;\n|\n| header;";

#[test]
fn token_at_column_zero() {
    assert_eq!(splice("TransmissionHeader header;", "TransmissionHeader", BLOCK), BLOCK);
}

#[test]
fn struct_keyword_is_dropped_before_measuring() {
    assert_eq!(splice("struct TransmissionHeader header;", "TransmissionHeader", BLOCK), BLOCK);
}

#[test]
fn later_lines_align_with_token_column() {
    let spliced = splice("const volatile Header* h;", "Header", BLOCK);
    let mut lines = spliced.lines();
    assert_eq!(lines.next(), Some("const volatile |"));
    for line in lines {
        assert!(line.starts_with(&" ".repeat(15)), "misaligned: {line:?}");
    }
    assert!(!spliced.contains(" h;"), "remainder belongs to the nested label");
}

#[test]
fn missing_token_means_no_indentation() {
    assert_eq!(splice("int x;", "Header", "|\n    a;\n|"), "|\n    a;\n|");
}

#[test]
fn find_word_respects_identifier_boundaries() {
    assert_eq!(find_word("HeaderList Header h;", "Header"), Some(11));
    assert_eq!(find_word("MyHeader h;", "Header"), None);
    assert_eq!(find_word("Header* h;", "Header"), Some(0));
    assert_eq!(find_word("anything", ""), None);
}

#[test]
fn strip_struct_keyword_only_touches_the_keyword() {
    assert_eq!(strip_struct_keyword("struct   Node* next;"), "Node* next;");
    assert_eq!(strip_struct_keyword("const struct Node* n;"), "const Node* n;");
    assert_eq!(strip_struct_keyword("structure s;"), "structure s;");
}
