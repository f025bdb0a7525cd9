//! Balanced-brace extraction of struct bodies.
//!
//! The extractor only understands braces and C/C++ comments. String and
//! character literals are not special, which is adequate for field lists
//! but means a `'{'` literal in a body will skew the depth count.

use std::ops::Range;

use crate::error::BlockError;

/// Scan ceiling used when no explicit limit is configured (1 MiB).
pub const DEFAULT_MAX_SCAN_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOptions {
    /// Keep the braces and continue to the `;` closing the trailing alias list.
    pub retain_braces: bool,
    /// Skip `//` and `/* */` comments while counting braces.
    pub skip_comments: bool,
    /// Maximum number of bytes examined from the start offset.
    pub max_scan: usize,
}

impl BlockOptions {
    /// Field-list extraction: the span starts at the first field token and
    /// ends before the closing brace.
    pub fn body() -> Self {
        Self {
            retain_braces: false,
            skip_comments: true,
            max_scan: DEFAULT_MAX_SCAN_BYTES,
        }
    }

    /// Typedef extraction: the span covers `{ ... } Alias, *PAlias;`.
    pub fn declaration() -> Self {
        Self {
            retain_braces: true,
            ..Self::body()
        }
    }

    pub fn with_max_scan(
        mut self,
        max_scan: usize,
    ) -> Self {
        self.max_scan = max_scan;
        self
    }
}

/// Byte offsets of an extracted block.
///
/// `close` is always the offset of the completing `}`. Without retained
/// braces `end == close`; with retained braces `end` is one past the `;`
/// that terminates the alias list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub start: usize,
    pub close: usize,
    pub end: usize,
}

impl BlockSpan {
    pub fn text<'a>(
        &self,
        source: &'a str,
    ) -> &'a str {
        &source[self.start..self.end]
    }

    /// Text between the closing brace and the end of the span, e.g.
    /// ` Alias, *PAlias;`. Empty when braces were not retained.
    pub fn trailer<'a>(
        &self,
        source: &'a str,
    ) -> &'a str {
        if self.end <= self.close {
            return "";
        }
        &source[self.close + 1..self.end]
    }
}

/// Extract the brace-delimited block whose opening brace is at `start`
/// (optionally preceded by whitespace).
pub fn extract_block(
    text: &str,
    start: usize,
    options: BlockOptions,
) -> Result<BlockSpan, BlockError> {
    if start > text.len() || !text.is_char_boundary(start) {
        return Err(BlockError::InvalidStart(start));
    }

    let mut cursor = Cursor::new(text, start, options);
    let open = cursor.skip_whitespace();
    if text.as_bytes().get(open) != Some(&b'{') {
        return Err(BlockError::MissingOpenBrace(start));
    }
    cursor.pos = open + 1;

    let body_start = if options.retain_braces {
        open
    } else {
        cursor.skip_whitespace()
    };

    let close = cursor.find_close(open)?;
    if !options.retain_braces {
        return Ok(BlockSpan {
            start: body_start,
            close,
            end: close,
        });
    }

    cursor.pos = close + 1;
    let terminator = cursor.find_terminator(close)?;
    Ok(BlockSpan {
        start: body_start,
        close,
        end: terminator + 1,
    })
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    start: usize,
    limit: usize,
    skip_comments: bool,
}

impl<'a> Cursor<'a> {
    fn new(
        text: &'a str,
        start: usize,
        options: BlockOptions,
    ) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: start,
            start,
            limit: start.saturating_add(options.max_scan).min(text.len()),
            skip_comments: options.skip_comments,
        }
    }

    fn skip_whitespace(&mut self) -> usize {
        while self.pos < self.limit && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        self.pos
    }

    fn exhausted(
        &self,
        otherwise: BlockError,
    ) -> BlockError {
        if self.limit < self.bytes.len() {
            BlockError::ScanLimit {
                start: self.start,
                limit: self.limit - self.start,
            }
        } else {
            otherwise
        }
    }

    /// Skip a comment starting at the cursor. Returns `Ok(false)` when the
    /// cursor is not on a comment.
    fn skip_comment(&mut self) -> Result<bool, BlockError> {
        if !self.skip_comments || self.pos + 1 >= self.limit || self.bytes[self.pos] != b'/' {
            return Ok(false);
        }
        match self.bytes[self.pos + 1] {
            b'/' => {
                while self.pos < self.limit && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                Ok(true)
            },
            b'*' => {
                let opened = self.pos;
                self.pos += 2;
                while self.pos + 1 < self.limit {
                    if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                        self.pos += 2;
                        return Ok(true);
                    }
                    self.pos += 1;
                }
                Err(self.exhausted(BlockError::UnterminatedComment(opened)))
            },
            _ => Ok(false),
        }
    }

    fn find_close(
        &mut self,
        open: usize,
    ) -> Result<usize, BlockError> {
        let mut depth = 0usize;
        while self.pos < self.limit {
            if self.skip_comment()? {
                continue;
            }
            match self.bytes[self.pos] {
                b'{' => depth += 1,
                b'}' if depth == 0 => return Ok(self.pos),
                b'}' => depth -= 1,
                _ => {},
            }
            self.pos += 1;
        }
        Err(self.exhausted(BlockError::Unbalanced {
            start: open,
        }))
    }

    fn find_terminator(
        &mut self,
        close: usize,
    ) -> Result<usize, BlockError> {
        while self.pos < self.limit {
            if self.skip_comment()? {
                continue;
            }
            if self.bytes[self.pos] == b';' {
                return Ok(self.pos);
            }
            self.pos += 1;
        }
        Err(self.exhausted(BlockError::MissingTerminator(close)))
    }
}

/// Byte ranges of every comment in `text`. An unterminated block comment
/// runs to the end of the text.
pub fn comment_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;
    while pos + 1 < bytes.len() {
        if bytes[pos] != b'/' {
            pos += 1;
            continue;
        }
        match bytes[pos + 1] {
            b'/' => {
                let end = text[pos..].find('\n').map(|i| pos + i).unwrap_or(bytes.len());
                spans.push(pos..end);
                pos = end;
            },
            b'*' => {
                let end = text[pos + 2..].find("*/").map(|i| pos + 2 + i + 2).unwrap_or(bytes.len());
                spans.push(pos..end);
                pos = end;
            },
            _ => pos += 1,
        }
    }
    spans
}

/// Replace each comment with a single space, keeping line breaks that
/// terminate line comments.
pub fn strip_comments(text: &str) -> String {
    let spans = comment_spans(text);
    if spans.is_empty() {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in spans {
        out.push_str(&text[last..span.start]);
        out.push(' ');
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}

pub(crate) fn in_spans(
    spans: &[Range<usize>],
    offset: usize,
) -> bool {
    let idx = spans.partition_point(|span| span.end <= offset);
    spans.get(idx).is_some_and(|span| span.start <= offset)
}

#[cfg(test)]
#[path = "../../tests/src/scan/block_tests.rs"]
mod tests;
