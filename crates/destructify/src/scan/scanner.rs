use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{
    ScanReport,
    block::{BlockOptions, DEFAULT_MAX_SCAN_BYTES, comment_spans, extract_block, in_spans},
    typedef::{AliasTarget, is_identifier, parse_declarators, parse_single_line, register_aliases},
};
use crate::{
    catalog::{StructDefinition, SymbolCatalog, UnparseableStruct},
    error::Error,
};

/// One-line struct header ending in `{`: optional `typedef`, optional
/// qualifiers, `struct`, a name, an optional `: Base` clause.
///
/// The name group is deliberately loose so that headers with empty or
/// non-identifier names still match and can be reported as unparseable.
static STRUCT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?P<typedef>typedef[ \t]+)?(?:[A-Za-z_]\w*[ \t]+)*?\bstruct\b[ \t]*(?P<name>[^\s:{;(),*]*)[ \t]*(?::[ \t]*(?P<base>[^{;\n]*?)[ \t]*)?\{",
    )
    .expect("struct header regex is valid")
});

/// Name of the struct whose one-line header ends with the `{` at `brace`.
///
/// Mirrors how [`Scanner::scan`] finds headers, so a scanned offset still
/// names its struct until the file is edited.
pub(crate) fn header_name_at(
    text: &str,
    brace: usize,
) -> Option<&str> {
    let header = text.get(..=brace)?;
    let line = &header[header.rfind('\n').map_or(0, |i| i + 1)..];
    let captures = STRUCT_HEADER.captures(line)?;
    if captures.get(0)?.end() != line.len() {
        return None;
    }
    captures.name("name").map(|m| m.as_str())
}

/// Body-less alias statement: `typedef struct Name Alias1, *Alias2;`.
static ALIAS_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\btypedef[ \t]+struct\b(?P<body>[^{};\n]*);").expect("alias statement regex is valid")
});

/// Populates a [`SymbolCatalog`] from source text.
#[derive(Debug, Clone, Copy)]
pub struct Scanner {
    block_options: BlockOptions,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SCAN_BYTES)
    }
}

impl Scanner {
    pub fn new(max_scan_bytes: usize) -> Self {
        Self {
            block_options: BlockOptions::declaration().with_max_scan(max_scan_bytes),
        }
    }

    /// Scan `text` and register its structs and aliases. Existing entries
    /// with the same names are overwritten.
    pub fn scan(
        &self,
        catalog: &mut SymbolCatalog,
        path: &Path,
        text: &str,
    ) -> ScanReport {
        let mut report = ScanReport {
            files_scanned: 1,
            ..ScanReport::default()
        };
        let comments = comment_spans(text);

        for captures in STRUCT_HEADER.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let brace = whole.end() - 1;
            if in_spans(&comments, brace) {
                continue;
            }

            let matched_name = captures.name("name").map_or("", |m| m.as_str());
            let raw_base = captures.name("base").map(|m| m.as_str().trim());
            let is_typedef = captures.name("typedef").is_some();

            // `struct Outer::Inner {` reaches the base group as `:Inner`.
            let (name, base, invalid) = match raw_base {
                Some(raw) if raw.starts_with(':') => {
                    let qualified = format!("{matched_name}:{}", raw.split_whitespace().next().unwrap_or(raw));
                    (qualified, None, Some("qualified struct names are not supported"))
                },
                _ => (
                    matched_name.to_owned(),
                    raw_base.and_then(|raw| raw.split_whitespace().last()).map(str::to_owned),
                    name_problem(matched_name),
                ),
            };
            let name = name.as_str();

            match invalid {
                None => {
                    debug!("[scan] struct '{name}' at {}:{brace}", path.display());
                    catalog.insert_struct(
                        name.to_owned(),
                        StructDefinition {
                            path: path.to_path_buf(),
                            offset: brace,
                            base,
                        },
                    );
                    report.structs += 1;
                },
                Some(reason) => {
                    debug!("[scan] unparseable struct header '{}' in {}: {reason}", whole.as_str().trim(), path.display());
                    if !name.is_empty() {
                        catalog.insert_unparseable(
                            name.to_owned(),
                            UnparseableStruct {
                                path: path.to_path_buf(),
                                offset: brace,
                                reason: reason.to_owned(),
                            },
                        );
                        report.unparseable += 1;
                    }
                },
            }

            if !is_typedef {
                continue;
            }

            let span = match extract_block(text, brace, self.block_options) {
                Ok(span) => span,
                Err(reason) => {
                    warn!("[scan] could not extract typedef body at {}:{brace}: {reason}", path.display());
                    report.problems.push(Error::MalformedBlock {
                        path: path.to_path_buf(),
                        reason,
                    });
                    continue;
                },
            };

            let declarators = parse_declarators(span.trailer(text));
            if declarators.is_empty() {
                debug!("[scan] typedef at {}:{brace} declares no alias", path.display());
                continue;
            }
            let target = match invalid {
                None => AliasTarget::Struct(name),
                Some(reason) => AliasTarget::Unparseable {
                    offset: brace,
                    reason,
                },
            };
            let registered = register_aliases(catalog, path, target, &declarators);
            match target {
                AliasTarget::Struct(_) => report.aliases += registered,
                AliasTarget::Unparseable {
                    ..
                } => report.unparseable += registered,
            }
        }

        for captures in ALIAS_STATEMENT.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            if in_spans(&comments, whole.start()) {
                continue;
            }
            let body = captures.name("body").map_or("", |m| m.as_str());
            match parse_single_line(body) {
                Some((name, declarators)) => {
                    report.aliases += register_aliases(catalog, path, AliasTarget::Struct(name), &declarators);
                },
                None => {
                    warn!(
                        "[scan] skipping malformed struct alias '{}' in {}",
                        whole.as_str(),
                        path.display()
                    );
                    report.problems.push(Error::MalformedAliasStatement {
                        path: path.to_path_buf(),
                        statement: whole.as_str().to_owned(),
                    });
                },
            }
        }

        report
    }

    /// Drop everything previously registered from `path`, then scan it again.
    pub fn rescan(
        &self,
        catalog: &mut SymbolCatalog,
        path: &Path,
        text: &str,
    ) -> ScanReport {
        catalog.remove_path(path);
        self.scan(catalog, path, text)
    }
}

fn name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("missing struct name")
    } else if name == "struct" {
        Some("keyword `struct` in name position")
    } else if !is_identifier(name) {
        Some("name is not an identifier")
    } else {
        None
    }
}

#[cfg(test)]
#[path = "../../tests/src/scan/scanner_tests.rs"]
mod tests;
