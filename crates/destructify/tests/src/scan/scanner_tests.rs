use std::path::{Path, PathBuf};

use super::*;
use crate::{
    catalog::{CatalogEntryKind, TypedefAlias},
    error::BlockError,
    scan::scan_workspace,
};

fn scan(text: &str) -> (SymbolCatalog, ScanReport) {
    let mut catalog = SymbolCatalog::new();
    let report = Scanner::default().scan(&mut catalog, Path::new("src/types.h"), text);
    (catalog, report)
}

fn alias(
    catalog: &SymbolCatalog,
    name: &str,
) -> (String, bool) {
    let TypedefAlias {
        target,
        is_pointer,
        ..
    } = catalog.alias(name).unwrap_or_else(|| panic!("alias {name} should be registered"));
    (target.clone(), *is_pointer)
}

#[test]
fn header_name_at_reads_back_scanned_offsets() {
    let src = "typedef struct Point {\n    int x;\n} Point_t;\nclass K;\nstruct Derived : public Base {\n    int y;\n};\n";
    let (catalog, _) = scan(src);
    for name in ["Point", "Derived"] {
        let def = catalog.struct_definition(name).expect("registered");
        assert_eq!(header_name_at(src, def.offset), Some(name));
    }
    let in_body = src.find("int x").expect("field");
    assert_eq!(header_name_at(src, in_body), None);
    assert_eq!(header_name_at(src, src.len()), None);
}

#[test]
fn registers_struct_at_its_opening_brace() {
    let src = "#include \"x.h\"\n\nstruct TransmissionHeader {\n    char* buf;\n    int len;\n};\n";
    let (catalog, report) = scan(src);
    let def = catalog.struct_definition("TransmissionHeader").expect("registered");
    assert_eq!(def.path, PathBuf::from("src/types.h"));
    assert_eq!(&src[def.offset..def.offset + 1], "{");
    assert_eq!(def.base, None);
    assert_eq!(report.structs, 1);
    assert!(report.problems.is_empty());
}

#[test]
fn records_inheritance_base() {
    let (catalog, _) = scan("struct Derived : public Base {\n    int extra;\n};\nstruct Plain: Root {};\n");
    assert_eq!(catalog.struct_definition("Derived").and_then(|d| d.base.as_deref()), Some("Base"));
    assert_eq!(catalog.struct_definition("Plain").and_then(|d| d.base.as_deref()), Some("Root"));
}

#[test]
fn typedef_body_registers_plain_and_pointer_aliases() {
    let src = "typedef struct MyTestStruct {\n    int x;\n    int y;\n} ALIAS, *PALIAS;\n";
    let (catalog, report) = scan(src);
    assert!(catalog.contains_struct("MyTestStruct"));
    assert_eq!(alias(&catalog, "ALIAS"), ("MyTestStruct".into(), false));
    assert_eq!(alias(&catalog, "PALIAS"), ("MyTestStruct".into(), true));
    assert_eq!(report.aliases, 2);
}

#[test]
fn typedef_with_inheritance_registers_aliases() {
    let src = "typedef struct MyTestStruct2 : MyParentTestStruct {\n    int a;\n    int b;\n    int z;\n} ALIAS2, *PALIAS2;";
    let (catalog, _) = scan(src);
    assert_eq!(
        catalog.struct_definition("MyTestStruct2").and_then(|d| d.base.as_deref()),
        Some("MyParentTestStruct")
    );
    assert_eq!(alias(&catalog, "ALIAS2"), ("MyTestStruct2".into(), false));
    assert_eq!(alias(&catalog, "PALIAS2"), ("MyTestStruct2".into(), true));
}

#[test]
fn typedef_body_with_nested_braces_and_comments() {
    let src = "typedef struct Outer {\n    struct { int a; } inner; // } not the end\n    int b;\n} Outer_t;\n";
    let (catalog, _) = scan(src);
    assert_eq!(alias(&catalog, "Outer_t"), ("Outer".into(), false));
}

#[test]
fn single_line_alias_statements() {
    let src = "\
typedef struct _RTL_CRITICAL_SECTION CRITICAL_SECTION;
typedef struct _RTL_CRITICAL_SECTION_DEBUG* PRTL_CRITICAL_SECTION_DEBUG;
typedef struct MyTestStruct MyAliasStruct, * PMyAliasStruct;
typedef struct Other *POther, Other_t;
";
    let (catalog, report) = scan(src);
    assert_eq!(alias(&catalog, "CRITICAL_SECTION"), ("_RTL_CRITICAL_SECTION".into(), false));
    assert_eq!(alias(&catalog, "PRTL_CRITICAL_SECTION_DEBUG"), ("_RTL_CRITICAL_SECTION_DEBUG".into(), true));
    assert_eq!(alias(&catalog, "MyAliasStruct"), ("MyTestStruct".into(), false));
    assert_eq!(alias(&catalog, "PMyAliasStruct"), ("MyTestStruct".into(), true));
    assert_eq!(alias(&catalog, "POther"), ("Other".into(), true));
    assert_eq!(alias(&catalog, "Other_t"), ("Other".into(), false));
    assert_eq!(report.aliases, 6);
    assert_eq!(catalog.struct_count(), 0, "alias statements never define structs");
}

#[test]
fn malformed_alias_statement_is_reported_and_skipped() {
    let src = "typedef struct Lonely;\nstruct Fine { int a; };\ntypedef struct Fine Fine_t;\n";
    let (catalog, report) = scan(src);
    assert!(catalog.contains_struct("Fine"));
    assert_eq!(alias(&catalog, "Fine_t"), ("Fine".into(), false));
    assert_eq!(report.problems.len(), 1);
    assert!(matches!(
        &report.problems[0],
        Error::MalformedAliasStatement { statement, .. } if statement == "typedef struct Lonely;"
    ));
}

#[test]
fn identity_typedef_does_not_create_alias() {
    let src = "typedef struct Node Node;\ntypedef struct Node {\n    struct Node* next;\n} Node;\n";
    let (catalog, _) = scan(src);
    assert!(catalog.contains_struct("Node"));
    assert!(catalog.alias("Node").is_none());
    assert_eq!(catalog.resolve_root("Node").expect("no cycle").root, "Node");
}

#[test]
fn headers_inside_comments_are_ignored() {
    let src = "/*\nstruct Ghost {\n    int boo;\n};\n*/\n// struct LineGhost { int x; };\nstruct Real { int x; };\n";
    let (catalog, _) = scan(src);
    assert!(!catalog.contains_struct("Ghost"));
    assert!(!catalog.contains_struct("LineGhost"));
    assert!(catalog.contains_struct("Real"));
}

#[test]
fn header_with_brace_on_next_line_is_a_known_gap() {
    let (catalog, _) = scan("struct Split\n{\n    int a;\n};\n");
    assert!(!catalog.contains_struct("Split"));
}

#[test]
fn anonymous_typedef_struct_is_unparseable() {
    let src = "typedef struct {\n    int x;\n    int y;\n} Point2, *PPoint2;\n";
    let (catalog, report) = scan(src);
    assert_eq!(catalog.struct_count(), 0);
    assert!(catalog.alias("Point2").is_none());
    let entry = catalog.unparseable("Point2").expect("recorded as unparseable");
    assert!(entry.reason.contains("missing struct name"), "reason: {}", entry.reason);
    assert!(catalog.unparseable("PPoint2").is_some());
    assert_eq!(report.unparseable, 2);
}

#[test]
fn non_identifier_names_are_unparseable() {
    let (catalog, _) = scan("struct Box<T> {\n    T value;\n};\nstruct struct { int a; };\nstruct Outer::Inner { int b; };\n");
    assert_eq!(catalog.struct_count(), 0);
    assert!(catalog.unparseable("Box<T>").is_some());
    assert!(catalog.unparseable("struct").is_some());
    assert!(catalog.unparseable("Outer::Inner").is_some());
    let kinds: Vec<CatalogEntryKind> = catalog.search("", 10).into_iter().map(|e| e.kind).collect();
    assert!(kinds.iter().all(|k| *k == CatalogEntryKind::Unparseable));
}

#[test]
fn unbalanced_typedef_body_is_contained() {
    let src = "typedef struct Broken {\n    int a;\n";
    let (catalog, report) = scan(src);
    assert!(catalog.contains_struct("Broken"), "the header itself is still registered");
    assert_eq!(report.problems.len(), 1);
    assert!(matches!(
        report.problems[0],
        Error::MalformedBlock {
            reason: BlockError::Unbalanced { .. },
            ..
        }
    ));
}

#[test]
fn scan_ceiling_applies_to_typedef_bodies() {
    let mut src = String::from("typedef struct Huge {\n");
    for i in 0..100 {
        src.push_str(&format!("    int field_{i};\n"));
    }
    src.push_str("} Huge_t;\n");
    let mut catalog = SymbolCatalog::new();
    let report = Scanner::new(128).scan(&mut catalog, Path::new("huge.h"), &src);
    assert!(catalog.alias("Huge_t").is_none());
    assert!(matches!(
        report.problems[0],
        Error::MalformedBlock {
            reason: BlockError::ScanLimit { .. },
            ..
        }
    ));
}

#[test]
fn rescanning_unchanged_file_is_idempotent() {
    let src = "typedef struct A { int x; } A_t, *PA;\nstruct B { A_t a; };\ntypedef struct B B_t;\n";
    let scanner = Scanner::default();
    let path = Path::new("ab.h");

    let mut once = SymbolCatalog::new();
    scanner.rescan(&mut once, path, src);
    let mut twice = once.clone();
    scanner.rescan(&mut twice, path, src);
    assert_eq!(once, twice);
}

#[test]
fn rescan_drops_entries_removed_from_file() {
    let scanner = Scanner::default();
    let path = Path::new("ab.h");
    let mut catalog = SymbolCatalog::new();
    scanner.rescan(&mut catalog, path, "struct A { int x; };\ntypedef struct A A_t;\n");
    scanner.rescan(&mut catalog, path, "struct B { int y; };\n");
    assert!(!catalog.contains_struct("A"));
    assert!(catalog.alias("A_t").is_none());
    assert!(catalog.contains_struct("B"));
}

#[test]
fn scan_workspace_keeps_last_definition() {
    let (catalog, report) = scan_workspace(
        &Scanner::default(),
        vec![("a.h", "struct Dup { int a; };"), ("b.h", "\nstruct Dup { int b; };")],
    );
    let def = catalog.struct_definition("Dup").expect("registered");
    assert_eq!(def.path, PathBuf::from("b.h"));
    assert_eq!(def.offset, 12);
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.structs, 2);
}
