use std::path::{Path, PathBuf};

use super::*;

fn def(
    path: &str,
    offset: usize,
) -> StructDefinition {
    StructDefinition {
        path: PathBuf::from(path),
        offset,
        base: None,
    }
}

#[test]
fn last_struct_write_wins() {
    let mut catalog = SymbolCatalog::new();
    assert!(catalog.insert_struct("Node".into(), def("a.h", 10)).is_none());
    let previous = catalog.insert_struct("Node".into(), def("b.h", 20));
    assert_eq!(previous, Some(def("a.h", 10)));
    assert_eq!(catalog.struct_definition("Node"), Some(&def("b.h", 20)));
    assert_eq!(catalog.struct_count(), 1);
}

#[test]
fn real_struct_shadows_unparseable_entry() {
    let mut catalog = SymbolCatalog::new();
    let entry = UnparseableStruct {
        path: PathBuf::from("a.h"),
        offset: 3,
        reason: "not an identifier".into(),
    };
    catalog.insert_unparseable("Thing".into(), entry.clone());
    assert!(catalog.unparseable("Thing").is_some());

    catalog.insert_struct("Thing".into(), def("b.h", 0));
    assert!(catalog.unparseable("Thing").is_none());

    catalog.insert_unparseable("Thing".into(), entry);
    assert!(catalog.unparseable("Thing").is_none(), "struct entry keeps precedence");
}

#[test]
fn remove_path_only_drops_that_file() {
    let mut catalog = SymbolCatalog::new();
    catalog.insert_struct("A".into(), def("a.h", 0));
    catalog.insert_struct("B".into(), def("b.h", 0));
    catalog.insert_alias(
        "PA".into(),
        TypedefAlias {
            target: "A".into(),
            is_pointer: true,
            path: PathBuf::from("a.h"),
        },
    );

    catalog.remove_path(Path::new("a.h"));
    assert!(!catalog.contains_struct("A"));
    assert!(catalog.contains_struct("B"));
    assert!(catalog.alias("PA").is_none());
    assert_eq!(catalog.paths(), vec![PathBuf::from("b.h")]);
}

#[test]
fn search_is_case_insensitive_and_capped() {
    let mut catalog = SymbolCatalog::new();
    catalog.insert_struct("EventChain".into(), def("event.h", 0));
    catalog.insert_struct("EventType".into(), def("event.h", 40));
    catalog.insert_struct("Packet".into(), def("net.h", 0));
    catalog.insert_alias(
        "PEventChain".into(),
        TypedefAlias {
            target: "EventChain".into(),
            is_pointer: true,
            path: PathBuf::from("event.h"),
        },
    );

    let hits = catalog.search("event", 10);
    let names: Vec<&str> = hits.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["EventChain", "EventType", "PEventChain"]);
    assert_eq!(hits[2].kind, CatalogEntryKind::Alias);
    assert_eq!(hits[2].detail.as_deref(), Some("*EventChain"));

    assert_eq!(catalog.search("EVENT", 1).len(), 1);
    assert!(catalog.search("missing", 10).is_empty());
}
