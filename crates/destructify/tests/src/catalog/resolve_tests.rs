use std::path::PathBuf;

use super::*;
use crate::catalog::{StructDefinition, TypedefAlias};

fn catalog_with_aliases(aliases: &[(&str, &str, bool)]) -> SymbolCatalog {
    let mut catalog = SymbolCatalog::new();
    for (name, target, is_pointer) in aliases {
        catalog.insert_alias(
            (*name).to_owned(),
            TypedefAlias {
                target: (*target).to_owned(),
                is_pointer: *is_pointer,
                path: PathBuf::from("types.h"),
            },
        );
    }
    catalog.insert_struct(
        "C".to_owned(),
        StructDefinition {
            path: PathBuf::from("types.h"),
            offset: 0,
            base: None,
        },
    );
    catalog
}

#[test]
fn unaliased_symbol_resolves_to_itself() {
    let catalog = catalog_with_aliases(&[]);
    let resolved = catalog.resolve_root("C").expect("resolves");
    assert_eq!(
        resolved,
        ResolvedSymbol {
            root: "C".to_owned(),
            is_pointer: false
        }
    );
}

#[test]
fn chain_resolves_to_root_struct() {
    let catalog = catalog_with_aliases(&[("A", "B", false), ("B", "C", false)]);
    let resolved = catalog.resolve_root("A").expect("resolves");
    assert_eq!(resolved.root, "C");
    assert!(!resolved.is_pointer);
}

#[test]
fn pointer_flag_is_ored_across_hops() {
    let first_hop = catalog_with_aliases(&[("A", "B", true), ("B", "C", false)]);
    assert!(first_hop.resolve_root("A").expect("resolves").is_pointer);

    let last_hop = catalog_with_aliases(&[("A", "B", false), ("B", "C", true)]);
    assert!(last_hop.resolve_root("A").expect("resolves").is_pointer);

    // Starting mid-chain only sees the remaining hops.
    assert!(!first_hop.resolve_root("B").expect("resolves").is_pointer);
}

#[test]
fn trailing_star_forces_pointer_flag() {
    let catalog = catalog_with_aliases(&[("A", "B", false), ("B", "C", false)]);
    let plain = catalog.resolve_root("A").expect("resolves");
    let starred = catalog.resolve_root("A*").expect("resolves");
    assert_eq!(starred.root, plain.root);
    assert!(starred.is_pointer);

    let spaced = catalog.resolve_root("C **").expect("resolves");
    assert_eq!(spaced.root, "C");
    assert!(spaced.is_pointer);
}

#[test]
fn cyclic_aliases_fail_instead_of_looping() {
    let catalog = catalog_with_aliases(&[("A", "B", false), ("B", "A", false)]);
    match catalog.resolve_root("A") {
        Err(Error::CyclicAlias {
            symbol,
            hops,
        }) => {
            assert_eq!(symbol, "A");
            assert_eq!(hops, 3);
        },
        other => panic!("expected CyclicAlias, got {other:?}"),
    }
}

#[test]
fn configured_hop_cap_is_respected() {
    let mut catalog = catalog_with_aliases(&[("A", "B", false), ("B", "C", false)]);
    catalog.set_max_alias_hops(Some(1));
    assert!(matches!(catalog.resolve_root("A"), Err(Error::CyclicAlias { .. })));
    assert_eq!(catalog.resolve_root("B").expect("one hop is allowed").root, "C");

    catalog.set_max_alias_hops(Some(0));
    assert_eq!(catalog.resolve_root("A").expect("zero means automatic").root, "C");
}

#[test]
fn unknown_symbol_resolves_to_itself() {
    let catalog = SymbolCatalog::new();
    let resolved = catalog.resolve_root("int").expect("resolves");
    assert_eq!(resolved.root, "int");
    assert!(!resolved.is_pointer);
}
