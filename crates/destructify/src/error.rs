use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the scanner, resolver and flattener can report.
///
/// Scan-time variants are collected per file and never abort a workspace
/// scan. Expansion-time variants either fail the top-level query
/// (`NotFound`, `Unparseable`, `CyclicAlias` on the query itself) or are
/// recorded as degraded leaves in [`crate::flatten::Expansion::issues`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed struct alias `{statement}` in {}", path.display())]
    MalformedAliasStatement { path: PathBuf, statement: String },

    #[error("struct `{0}` is referenced but never defined in a scanned file")]
    UnresolvedSymbol(String),

    #[error("alias chain for `{symbol}` did not settle after {hops} hops")]
    CyclicAlias { symbol: String, hops: usize },

    #[error("`{0}` is not a known struct or struct alias")]
    NotFound(String),

    #[error("`{name}` looks like a struct in {} but could not be parsed: {reason}", path.display())]
    Unparseable {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("malformed block in {}: {reason}", path.display())]
    MalformedBlock { path: PathBuf, reason: BlockError },

    #[error("expansion of `{symbol}` stopped at depth {depth}")]
    DepthLimit { symbol: String, depth: usize },

    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why a brace/comment scan could not produce a span.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("no opening brace at offset {0}")]
    MissingOpenBrace(usize),

    #[error("offset {0} is past the end of the text or not on a character boundary")]
    InvalidStart(usize),

    #[error("block opened at offset {start} is never closed")]
    Unbalanced { start: usize },

    #[error("block comment opened at offset {0} is never closed")]
    UnterminatedComment(usize),

    #[error("alias list after offset {0} has no terminating `;`")]
    MissingTerminator(usize),

    #[error("scan from offset {start} exceeded the {limit}-byte ceiling")]
    ScanLimit { start: usize, limit: usize },

    #[error("brace at offset {offset} no longer opens `struct {expected}`")]
    StaleHeader { offset: usize, expected: String },
}
