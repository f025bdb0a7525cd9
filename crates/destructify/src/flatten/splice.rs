//! Splicing a multi-line nested block into a one-line field declaration.

use std::borrow::Cow;

/// Column correction subtracted from the token column. Nested body lines
/// already carry their own indent unit, so none is needed.
const DELIMITER_CORRECTION: usize = 0;

/// Replace `token` in `declaration` with the multi-line `replacement`.
///
/// A leading `struct` keyword is dropped first. Every replacement line
/// after the first is indented to the column where the token started, so
/// the nested block lines up under its field. The text after the token is
/// not re-appended: it has already become the nested block's label.
pub fn splice(
    declaration: &str,
    token: &str,
    replacement: &str,
) -> String {
    let stripped = strip_struct_keyword(declaration);
    let stripped: &str = &stripped;
    let (prefix, column) = match find_word(stripped, token) {
        Some(at) => (&stripped[..at], stripped[..at].chars().count()),
        None => ("", 0),
    };
    let indent = " ".repeat(column.saturating_sub(DELIMITER_CORRECTION));

    let mut lines = replacement.lines();
    let mut out = String::with_capacity(declaration.len() + replacement.len());
    out.push_str(prefix);
    out.push_str(lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&indent);
        }
        out.push_str(line);
    }
    out
}

/// Drop the first `struct` keyword and the whitespace after it.
pub(crate) fn strip_struct_keyword(declaration: &str) -> Cow<'_, str> {
    match find_word(declaration, "struct") {
        Some(at) => {
            let rest = declaration[at + "struct".len()..].trim_start();
            Cow::Owned(format!("{}{rest}", &declaration[..at]))
        },
        None => Cow::Borrowed(declaration),
    }
}

/// Byte offset of `word` in `text` where it is not part of a longer
/// identifier.
pub(crate) fn find_word(
    text: &str,
    word: &str,
) -> Option<usize> {
    if word.is_empty() {
        return None;
    }
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    text.match_indices(word).map(|(at, _)| at).find(|&at| {
        let before = text[..at].chars().next_back().is_none_or(|c| !is_ident(c));
        let after = text[at + word.len()..].chars().next().is_none_or(|c| !is_ident(c));
        before && after
    })
}

#[cfg(test)]
#[path = "../../tests/src/flatten/splice_tests.rs"]
mod tests;
