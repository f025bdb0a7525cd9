use std::fs;

use tempfile::TempDir;

use super::*;
use crate::vfs::{FsSources, MemorySources};

fn write(
    root: &Path,
    relative: &str,
    text: &str,
) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    normalized_path(&path)
}

fn names(files: &[PathBuf]) -> Vec<String> {
    let mut names: Vec<String> =
        files.iter().filter_map(|p| p.file_name()).map(|n| n.to_string_lossy().into_owned()).collect();
    names.sort();
    names
}

#[test]
fn discovery_filters_by_extension() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    write(&root, "a.h", "struct A {};");
    write(&root, "src/b.cpp", "struct B {};");
    write(&root, "src/c.HPP", "struct C {};");
    write(&root, "README.md", "struct NotCode {};");
    write(&root, "src/d.rs", "struct D {}");

    let discovered = discover_source_files(&[root], &IndexingSettings::default());
    assert_eq!(names(&discovered.files), vec!["a.h", "b.cpp", "c.HPP"]);
    assert_eq!(discovered.skipped, 0);
}

#[test]
fn discovery_honours_size_cap() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    write(&root, "small.h", "struct Small {};");
    write(&root, "huge.h", &"x".repeat(20 * 1024));

    let settings = IndexingSettings {
        max_file_size_kb: 16,
        ..IndexingSettings::default()
    };
    let discovered = discover_source_files(&[root], &settings);
    assert_eq!(names(&discovered.files), vec!["small.h"]);
    assert_eq!(discovered.skipped, 1);
}

#[test]
fn discovery_honours_exclusions_and_hidden_dirs() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    write(&root, "keep/a.h", "");
    write(&root, "third_party/lib/b.h", "");
    write(&root, ".destructify/c.h", "");
    write(&root, "node_modules/d.h", "");

    let settings = IndexingSettings {
        exclude_paths: vec!["third_party".into()],
        ..IndexingSettings::default()
    };
    let discovered = discover_source_files(&[root], &settings);
    assert_eq!(names(&discovered.files), vec!["a.h"]);
}

#[test]
fn overlapping_roots_are_deduplicated() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    write(&root, "sub/a.h", "");

    let discovered = discover_source_files(&[root.clone(), root.join("sub")], &IndexingSettings::default());
    assert_eq!(discovered.files.len(), 1);
}

#[test]
fn custom_extensions() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    write(&root, "a.h", "");
    write(&root, "b.inl", "");

    let settings = IndexingSettings {
        extensions: vec!["inl".into()],
        ..IndexingSettings::default()
    };
    assert_eq!(names(&discover_source_files(&[root], &settings).files), vec!["b.inl"]);
}

#[test]
fn scan_paths_records_unreadable_files() {
    let sources = MemorySources::new().with("a.h", "struct A { int x; };");
    let paths = vec![PathBuf::from("a.h"), PathBuf::from("missing.h")];
    let (catalog, report) = scan_paths(&Scanner::default(), &sources, &paths);
    assert!(catalog.contains_struct("A"));
    assert_eq!(report.files_scanned, 1);
    assert_eq!(report.files_skipped, 1);
    assert!(matches!(report.problems.as_slice(), [Error::FileRead { path, .. }] if path == Path::new("missing.h")));
}

#[test]
fn build_catalog_from_disk() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    let header = write(&root, "include/packet.h", "typedef struct Packet {\n    int len;\n} Packet_t;\n");

    let flatten = FlattenSettings {
        max_alias_hops: 7,
        ..FlattenSettings::default()
    };
    let (catalog, report) = build_catalog(&[root], &IndexingSettings::default(), &flatten, &FsSources);
    assert_eq!(catalog.struct_definition("Packet").map(|d| d.path.clone()), Some(header));
    assert_eq!(catalog.alias("Packet_t").map(|a| a.target.as_str()), Some("Packet"));
    assert_eq!(report.files_scanned, 1);
    assert!(report.problems.is_empty());
}
