//! Recursive struct expansion.
//!
//! [`destructify`] turns one struct (or alias) into a marker-delimited,
//! indented listing where every struct-typed field is replaced in place by
//! the field list of the struct it names:
//!
//! ```text
//! |
//!     |
//!         char* buf;
//!         int len;
//!     |
//!     | header;
//!     int x;
//! |
//! | Packet
//! ```
//!
//! Each top-level query owns an append-only visited set. A struct that is
//! already in the set, whether through recursion or because a sibling
//! field expanded it earlier, is rendered as its bare name.

mod splice;

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexSet;
pub use splice::splice;
use tracing::{debug, warn};

use crate::{
    catalog::{StructDefinition, SymbolCatalog},
    config::FlattenSettings,
    error::{BlockError, Error, Result},
    scan::{BlockOptions, extract_block, header_name_at, strip_comments},
    vfs::SourceReader,
};

/// Result of one top-level query.
#[derive(Debug)]
pub struct Expansion {
    pub text: String,
    /// Fields that were rendered as leaves instead of being expanded.
    pub issues: Vec<Error>,
}

/// Expand `query` against `catalog`, reading struct bodies through
/// `reader`.
///
/// Fails only when the query itself cannot be expanded: unknown names give
/// [`Error::NotFound`], names that look like structs but could not be
/// parsed give [`Error::Unparseable`] and an alias cycle gives
/// [`Error::CyclicAlias`]. Problems further down are recorded in
/// [`Expansion::issues`].
pub fn destructify<R: SourceReader + ?Sized>(
    catalog: &SymbolCatalog,
    reader: &R,
    query: &str,
    settings: &FlattenSettings,
) -> Result<Expansion> {
    let query = query.trim();
    let resolved = catalog.resolve_root(query)?;

    if !catalog.contains_struct(&resolved.root) {
        let stripped = query.trim_end_matches(|c: char| c == '*' || c.is_whitespace());
        let unparseable = catalog.unparseable(stripped).or_else(|| catalog.unparseable(&resolved.root));
        return Err(match unparseable {
            Some(entry) => Error::Unparseable {
                name: stripped.to_owned(),
                path: entry.path.clone(),
                reason: entry.reason.clone(),
            },
            None => Error::NotFound(query.to_owned()),
        });
    }

    let mut flattener = Destructifier::new(catalog, reader, settings);
    let text = match flattener.expand(query, query, 0) {
        Expanded::Block(text) | Expanded::Leaf(text) => text,
    };
    debug!(
        "[flatten] '{query}' expanded {} struct(s) with {} issue(s)",
        flattener.visited.len(),
        flattener.issues.len()
    );
    Ok(Expansion {
        text,
        issues: flattener.issues,
    })
}

enum Expanded {
    Block(String),
    /// Bare struct name used in place of a body.
    Leaf(String),
}

struct Destructifier<'a, R: ?Sized> {
    catalog: &'a SymbolCatalog,
    reader: &'a R,
    settings: &'a FlattenSettings,
    visited: IndexSet<String>,
    /// File text per top-level query, or why the file could not be read.
    files: HashMap<PathBuf, Result<Arc<str>, io::ErrorKind>>,
    issues: Vec<Error>,
}

impl<'a, R: SourceReader + ?Sized> Destructifier<'a, R> {
    fn new(
        catalog: &'a SymbolCatalog,
        reader: &'a R,
        settings: &'a FlattenSettings,
    ) -> Self {
        Self {
            catalog,
            reader,
            settings,
            visited: IndexSet::new(),
            files: HashMap::new(),
            issues: Vec::new(),
        }
    }

    /// Expand `symbol` whose nested block is labelled `label`.
    fn expand(
        &mut self,
        symbol: &str,
        label: &str,
        depth: usize,
    ) -> Expanded {
        let resolved = match self.catalog.resolve_root(symbol) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.issues.push(err);
                return Expanded::Leaf(symbol.trim_end_matches('*').to_owned());
            },
        };
        let root = resolved.root;

        if depth > 0 && self.visited.contains(&root) {
            return Expanded::Leaf(root);
        }
        self.visited.insert(root.clone());

        let Some(definition) = self.catalog.struct_definition(&root) else {
            warn!("[flatten] no definition for '{root}'");
            self.issues.push(Error::UnresolvedSymbol(root.clone()));
            return Expanded::Leaf(root);
        };
        let body = match self.body(&root, definition) {
            Ok(body) => body,
            Err(err) => {
                warn!("[flatten] rendering '{root}' as a leaf: {err}");
                self.issues.push(err);
                return Expanded::Leaf(root);
            },
        };

        let mut lines = Vec::new();
        for declaration in split_declarations(&body) {
            lines.push(self.flatten_declaration(&declaration, depth));
        }

        let indent = " ".repeat(self.settings.indent_width);
        let mut out = String::from("|");
        for line in lines.iter().flat_map(|line| line.lines()) {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
            out.push_str(line);
        }
        out.push_str("\n|\n| ");
        out.push_str(if resolved.is_pointer {
            "*"
        } else {
            label
        });
        Expanded::Block(out)
    }

    /// Rewrite one field declaration, expanding at most one struct-typed
    /// token.
    fn flatten_declaration(
        &mut self,
        declaration: &str,
        depth: usize,
    ) -> String {
        let mut current = declaration.to_owned();
        let mut search_from = 0;

        while let Some((at, token)) = next_token(&current, search_from) {
            let token = token.to_owned();
            search_from = at + token.len();

            let candidate = token.trim_end_matches('*');
            if candidate.is_empty() {
                continue;
            }
            let remainder = current[at + token.len()..].trim();
            let is_pointer = candidate.len() != token.len() || remainder.starts_with('*');

            let resolved = match self.catalog.resolve_root(candidate) {
                Ok(resolved) => resolved,
                Err(err) => {
                    warn!("[flatten] leaving '{candidate}' untouched: {err}");
                    self.issues.push(err);
                    continue;
                },
            };
            let root = resolved.root;

            if self.visited.contains(&root) {
                let leaf = leaf_name(&root, resolved.is_pointer && !is_pointer);
                current.replace_range(at..at + candidate.len(), &leaf);
                search_from = at + leaf.len() + (token.len() - candidate.len());
                continue;
            }

            if !self.catalog.contains_struct(&root) {
                self.note_unexpandable(candidate, &root);
                continue;
            }

            if depth + 1 >= self.settings.max_depth {
                debug!("[flatten] depth {} reached at '{root}'", depth + 1);
                self.issues.push(Error::DepthLimit {
                    symbol: root.clone(),
                    depth: depth + 1,
                });
                let leaf = leaf_name(&root, resolved.is_pointer && !is_pointer);
                current.replace_range(at..at + candidate.len(), &leaf);
                search_from = at + leaf.len() + (token.len() - candidate.len());
                continue;
            }

            let symbol = if is_pointer {
                format!("{candidate}*")
            } else {
                candidate.to_owned()
            };
            let label = declarator_of(remainder).to_owned();
            match self.expand(&symbol, &label, depth + 1) {
                Expanded::Block(block) => return splice(&current, candidate, &block),
                Expanded::Leaf(leaf) => {
                    current.replace_range(at..at + candidate.len(), &leaf);
                    search_from = at + leaf.len() + (token.len() - candidate.len());
                },
            }
        }

        current
    }

    /// Record why a token that names a struct-like type stays as written.
    fn note_unexpandable(
        &mut self,
        candidate: &str,
        root: &str,
    ) {
        if let Some(entry) = self.catalog.unparseable(candidate).or_else(|| self.catalog.unparseable(root)) {
            self.issues.push(Error::Unparseable {
                name: candidate.to_owned(),
                path: entry.path.clone(),
                reason: entry.reason.clone(),
            });
        } else if root != candidate {
            debug!("[flatten] alias '{candidate}' names undefined struct '{root}'");
            self.issues.push(Error::UnresolvedSymbol(root.to_owned()));
        }
    }

    /// Field-list text of `definition`, comments removed.
    ///
    /// The offset may predate an unsaved edit, so the header ending at it
    /// must still name `name`.
    fn body(
        &mut self,
        name: &str,
        definition: &StructDefinition,
    ) -> Result<String> {
        let text = self.source(&definition.path)?;
        let options = BlockOptions::body().with_max_scan(self.settings.max_scan_bytes);
        let malformed = |reason| Error::MalformedBlock {
            path: definition.path.clone(),
            reason,
        };
        let span = extract_block(&text, definition.offset, options).map_err(malformed)?;
        if header_name_at(&text, definition.offset) != Some(name) {
            return Err(malformed(BlockError::StaleHeader {
                offset: definition.offset,
                expected: name.to_owned(),
            }));
        }
        Ok(strip_comments(span.text(&text)))
    }

    fn source(
        &mut self,
        path: &Path,
    ) -> Result<Arc<str>> {
        let read = match self.files.get(path) {
            Some(cached) => cached.clone().map_err(io::Error::from),
            None => self.reader.read(path).map(Arc::from),
        };
        match read {
            Ok(text) => {
                self.files.insert(path.to_path_buf(), Ok(text.clone()));
                Ok(text)
            },
            Err(source) => {
                self.files.insert(path.to_path_buf(), Err(source.kind()));
                Err(Error::FileRead {
                    path: path.to_path_buf(),
                    source,
                })
            },
        }
    }
}

/// Bare root name of a struct that is not expanded.
///
/// `add_pointer` is set when the field's type was an alias that implies a
/// pointer (`PNode next;`). The leaf then reads `Node* next;` so the field
/// is still declared as a pointer.
fn leaf_name(
    root: &str,
    add_pointer: bool,
) -> String {
    if add_pointer {
        format!("{root}*")
    } else {
        root.to_owned()
    }
}

/// Declarator part of the text after a field's type. An inline nested
/// definition (`{ int x; } in;`) contributes only what follows its body.
fn declarator_of(remainder: &str) -> &str {
    match remainder.rfind('}') {
        Some(close) if remainder.starts_with('{') => remainder[close + 1..].trim(),
        _ => remainder,
    }
}

/// Next whitespace-delimited token at or after byte `from`.
fn next_token(
    text: &str,
    from: usize,
) -> Option<(usize, &str)> {
    let rest = text.get(from..)?;
    let start = from + rest.find(|c: char| !c.is_whitespace())?;
    let len = text[start..].find(char::is_whitespace).unwrap_or(text.len() - start);
    Some((start, &text[start..start + len]))
}

/// Split a field list into `;`-terminated declarations at brace depth 0.
///
/// Whitespace runs are collapsed, access specifiers (`public:`) are
/// dropped, and a trailing fragment without `;` is kept as written.
pub(crate) fn split_declarations(body: &str) -> Vec<String> {
    let mut declarations = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                push_declaration(&mut declarations, &body[start..=i]);
                start = i + 1;
            },
            _ => {},
        }
    }
    push_declaration(&mut declarations, &body[start..]);
    declarations
}

fn push_declaration(
    declarations: &mut Vec<String>,
    raw: &str,
) {
    let mut text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    for specifier in ["public:", "protected:", "private:"] {
        if let Some(rest) = text.strip_prefix(specifier) {
            text = rest.trim_start().to_owned();
        }
    }
    if !text.is_empty() && text != ";" {
        declarations.push(text);
    }
}

#[cfg(test)]
#[path = "../../tests/src/flatten/flatten_tests.rs"]
mod tests;
