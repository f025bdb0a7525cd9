//! Workspace enumeration and full-catalog builds.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    catalog::SymbolCatalog,
    config::{FlattenSettings, IndexingSettings},
    error::Error,
    scan::{ScanReport, Scanner},
    vfs::{SourceReader, normalized_path},
};

/// Source files found under the workspace roots.
#[derive(Debug, Default)]
pub struct DiscoveredFiles {
    /// Normalized, de-duplicated paths in walk order.
    pub files: Vec<PathBuf>,
    /// Files with a matching extension that exceeded the size cap.
    pub skipped: usize,
}

/// Walk `roots` for C/C++ sources accepted by `settings`.
pub fn discover_source_files(
    roots: &[PathBuf],
    settings: &IndexingSettings,
) -> DiscoveredFiles {
    let excluded_prefixes = build_exclude_prefixes(roots, &settings.exclude_paths);
    let max_file_size_bytes = settings.max_file_size_bytes();
    let mut discovered = DiscoveredFiles::default();
    let mut seen = HashSet::new();

    for root in roots {
        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| should_descend_into_workspace_entry(entry, &excluded_prefixes))
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !has_source_extension(path, &settings.extensions) {
                continue;
            }

            if let Ok(metadata) = entry.metadata()
                && metadata.len() > max_file_size_bytes
            {
                debug!("[workspace] skipping large source file ({} bytes): {}", metadata.len(), path.display());
                discovered.skipped += 1;
                continue;
            }

            let normalized = normalized_path(path);
            if seen.insert(normalized.clone()) {
                discovered.files.push(normalized);
            }
        }
    }
    discovered
}

/// Read and scan `paths` into a fresh catalog. Unreadable files are
/// recorded in the report and skipped.
pub fn scan_paths<R: SourceReader + ?Sized>(
    scanner: &Scanner,
    reader: &R,
    paths: &[PathBuf],
) -> (SymbolCatalog, ScanReport) {
    let mut catalog = SymbolCatalog::new();
    let report = scan_into(scanner, reader, &mut catalog, paths);
    (catalog, report)
}

/// Rescan `paths` into an existing catalog.
pub fn scan_into<R: SourceReader + ?Sized>(
    scanner: &Scanner,
    reader: &R,
    catalog: &mut SymbolCatalog,
    paths: &[PathBuf],
) -> ScanReport {
    let mut report = ScanReport::default();
    for path in paths {
        match reader.read(path) {
            Ok(text) => report.absorb(scanner.rescan(catalog, path, &text)),
            Err(source) => {
                warn!("[workspace] failed to read {}: {source}", path.display());
                report.files_skipped += 1;
                report.problems.push(Error::FileRead {
                    path: path.clone(),
                    source,
                });
            },
        }
    }
    report
}

/// Discover and scan every source file under `roots`.
pub fn build_catalog<R: SourceReader + ?Sized>(
    roots: &[PathBuf],
    indexing: &IndexingSettings,
    flatten: &FlattenSettings,
    reader: &R,
) -> (SymbolCatalog, ScanReport) {
    let discovered = discover_source_files(roots, indexing);
    let scanner = Scanner::new(flatten.max_scan_bytes);
    let (mut catalog, mut report) = scan_paths(&scanner, reader, &discovered.files);
    catalog.set_max_alias_hops(flatten.alias_hop_cap());
    report.files_skipped += discovered.skipped;
    info!("[workspace] {}", report.summary());
    (catalog, report)
}

pub(crate) fn has_source_extension(
    path: &Path,
    extensions: &[String],
) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

fn should_descend_into_workspace_entry(
    entry: &DirEntry,
    excluded_prefixes: &[PathBuf],
) -> bool {
    let normalized = normalized_path(entry.path());
    if is_path_excluded(&normalized, excluded_prefixes) {
        return false;
    }

    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return true;
    }

    let Some(name) = entry.file_name().to_str() else {
        return false;
    };

    if name.starts_with('.') {
        return false;
    }

    !matches!(name, "target" | "node_modules" | "out" | "bin" | "obj" | "CMakeFiles")
}

/// Relative exclusions apply under every root; absolute ones as given.
pub(crate) fn build_exclude_prefixes(
    roots: &[PathBuf],
    exclude_paths: &[String],
) -> Vec<PathBuf> {
    let mut excluded_prefixes = Vec::new();
    let mut seen = HashSet::new();

    for raw_path in exclude_paths {
        let exclude_path = PathBuf::from(raw_path);
        if exclude_path.is_absolute() {
            let normalized = normalized_path(&exclude_path);
            if seen.insert(normalized.clone()) {
                excluded_prefixes.push(normalized);
            }
            continue;
        }

        for root in roots {
            let normalized = normalized_path(&root.join(&exclude_path));
            if seen.insert(normalized.clone()) {
                excluded_prefixes.push(normalized);
            }
        }
    }

    excluded_prefixes
}

fn is_path_excluded(
    path: &Path,
    excluded_prefixes: &[PathBuf],
) -> bool {
    excluded_prefixes.iter().any(|excluded_prefix| path.starts_with(excluded_prefix))
}

#[cfg(test)]
#[path = "../../tests/src/workspace/workspace_tests.rs"]
mod tests;
