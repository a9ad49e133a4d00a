//! Source positions and the line index used to report them.

use std::fmt;

/// A location in the source text. `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Byte offsets of every line start, for offset -> line/column conversion.
#[derive(Debug, Clone)]
pub struct SourceIndex<'source> {
    source: &'source str,
    line_starts: Vec<usize>,
}

impl<'source> SourceIndex<'source> {
    pub fn new(source: &'source str) -> Self {
        let mut starts = vec![0];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                starts.push(i + 1);
            }
        }
        Self {
            source,
            line_starts: starts,
        }
    }

    pub fn source(&self) -> &'source str {
        self.source
    }

    /// Convert a byte offset into a 1-based position.
    pub fn position(&self, offset: usize) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(insert_pos) => insert_pos.saturating_sub(1),
        };
        let start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        let column = self
            .source
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset.saturating_sub(start));
        Position {
            offset,
            line: line_idx + 1,
            column: column + 1,
        }
    }

    /// The trimmed text of the line containing `offset`.
    pub fn line_context(&self, offset: usize) -> String {
        let offset = offset.min(self.source.len());
        let line_start = self.source[..offset]
            .rfind('\n')
            .map(|pos| pos + 1)
            .unwrap_or(0);
        let line_end = self.source[offset..]
            .find('\n')
            .map(|pos| offset + pos)
            .unwrap_or(self.source.len());

        self.source[line_start..line_end].trim().to_string()
    }

    /// Position just past the last byte of the source.
    pub fn end(&self) -> Position {
        self.position(self.source.len())
    }
}
