//! Alias-list parsing for `typedef struct` statements.

use std::path::Path;

use tracing::debug;

use crate::catalog::{SymbolCatalog, TypedefAlias, UnparseableStruct};

/// One declarator from an alias list, e.g. `*PFoo` or `Foo_t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AliasDeclarator {
    pub name: String,
    pub is_pointer: bool,
}

/// What the aliases in a statement point at.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AliasTarget<'a> {
    Struct(&'a str),
    Unparseable {
        offset: usize,
        reason: &'a str,
    },
}

/// Split a comma-separated declarator list (`Foo_t, *PFoo, * PPFoo;`).
///
/// Pointer markers may be attached or separated by whitespace, and
/// `const`/`volatile` qualifiers are ignored. Declarators that are not
/// plain identifiers (arrays, function pointers) are skipped.
pub(crate) fn parse_declarators(list: &str) -> Vec<AliasDeclarator> {
    let list = list.trim().trim_end_matches(';');
    let mut declarators = Vec::new();

    for raw in list.split(',') {
        let mut rest = raw.trim();
        let mut is_pointer = false;
        loop {
            if let Some(stripped) = rest.strip_prefix('*') {
                is_pointer = true;
                rest = stripped.trim_start();
                continue;
            }
            if let Some(stripped) = strip_qualifier(rest) {
                rest = stripped;
                continue;
            }
            break;
        }

        if rest.is_empty() {
            continue;
        }
        if !is_identifier(rest) {
            debug!("[typedef] skipping declarator '{}'", raw.trim());
            continue;
        }
        declarators.push(AliasDeclarator {
            name: rest.to_owned(),
            is_pointer,
        });
    }

    declarators
}

fn strip_qualifier(text: &str) -> Option<&str> {
    ["const", "volatile"].iter().find_map(|kw| {
        let rest = text.strip_prefix(kw)?;
        let boundary = rest.chars().next().is_none_or(|c| c.is_whitespace() || c == '*');
        boundary.then(|| rest.trim_start())
    })
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Register every declarator against `target`. Returns how many aliases
/// were recorded.
pub(crate) fn register_aliases(
    catalog: &mut SymbolCatalog,
    path: &Path,
    target: AliasTarget<'_>,
    declarators: &[AliasDeclarator],
) -> usize {
    let mut registered = 0;
    for declarator in declarators {
        match target {
            AliasTarget::Struct(canonical) => {
                if declarator.name == canonical {
                    debug!("[typedef] ignoring identity alias '{canonical}'");
                    continue;
                }
                debug!(
                    "[typedef] alias '{}' -> {}{canonical}",
                    declarator.name,
                    if declarator.is_pointer {
                        "*"
                    } else {
                        ""
                    }
                );
                catalog.insert_alias(
                    declarator.name.clone(),
                    TypedefAlias {
                        target: canonical.to_owned(),
                        is_pointer: declarator.is_pointer,
                        path: path.to_path_buf(),
                    },
                );
            },
            AliasTarget::Unparseable {
                offset,
                reason,
            } => {
                catalog.insert_unparseable(
                    declarator.name.clone(),
                    UnparseableStruct {
                        path: path.to_path_buf(),
                        offset,
                        reason: format!("alias of a struct whose name could not be parsed ({reason})"),
                    },
                );
            },
        }
        registered += 1;
    }
    registered
}

/// Parse the body of a one-line alias statement, i.e. everything between
/// `typedef struct` and `;` (`Name Alias1, *Alias2`).
///
/// Returns the canonical name and its declarators, or `None` when the
/// statement names no alias.
pub(crate) fn parse_single_line(body: &str) -> Option<(&str, Vec<AliasDeclarator>)> {
    let body = body.trim();
    let name_end = body.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(body.len());
    let name = &body[..name_end];
    if !is_identifier(name) {
        return None;
    }
    let declarators = parse_declarators(&body[name_end..]);
    if declarators.is_empty() {
        return None;
    }
    Some((name, declarators))
}

#[cfg(test)]
#[path = "../../tests/src/scan/typedef_tests.rs"]
mod tests;
