//! Regex-and-scanner structural parsing of C/C++ struct definitions.

pub mod block;
mod scanner;
mod typedef;

use std::path::PathBuf;

pub use block::{BlockOptions, BlockSpan, DEFAULT_MAX_SCAN_BYTES, comment_spans, extract_block, strip_comments};
pub(crate) use scanner::header_name_at;
pub use scanner::Scanner;

use crate::{catalog::SymbolCatalog, error::Error};

/// Statistics and contained problems from one or more file scans.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub structs: usize,
    pub aliases: usize,
    pub unparseable: usize,
    /// Per-file problems; none of them stopped the scan.
    pub problems: Vec<Error>,
}

impl ScanReport {
    pub fn absorb(
        &mut self,
        other: ScanReport,
    ) {
        self.files_scanned += other.files_scanned;
        self.files_skipped += other.files_skipped;
        self.structs += other.structs;
        self.aliases += other.aliases;
        self.unparseable += other.unparseable;
        self.problems.extend(other.problems);
    }

    pub fn summary(&self) -> String {
        format!(
            "{} file(s) scanned, {} skipped: {} struct(s), {} alias(es), {} unparseable, {} problem(s)",
            self.files_scanned,
            self.files_skipped,
            self.structs,
            self.aliases,
            self.unparseable,
            self.problems.len()
        )
    }
}

/// Build a fresh catalog from already-read `(path, text)` pairs.
///
/// Files are scanned in order, so a struct defined in several files ends
/// up pointing at the last one.
pub fn scan_workspace<I, P, T>(
    scanner: &Scanner,
    files: I,
) -> (SymbolCatalog, ScanReport)
where
    I: IntoIterator<Item = (P, T)>,
    P: Into<PathBuf>,
    T: AsRef<str>,
{
    let mut catalog = SymbolCatalog::new();
    let mut report = ScanReport::default();
    for (path, text) in files {
        let path = path.into();
        report.absorb(scanner.rescan(&mut catalog, &path, text.as_ref()));
    }
    (catalog, report)
}
