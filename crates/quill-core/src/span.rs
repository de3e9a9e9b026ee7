//! Source location tracking for diagnostics.

use std::fmt;

/// Position of a token or node in its source file.
///
/// Lines and columns are 1-indexed; the column counts bytes. `len` is the
/// byte length of the covered text and is only used to widen carets when
/// rendering a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// A zero-length span, used for synthesized nodes and end of input.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Extend `self` so it also covers `other`.
    ///
    /// Spans on different lines keep the start position of `self`; only the
    /// caret width is approximated.
    pub fn to(self, other: Span) -> Span {
        if self.line != other.line {
            return Span {
                len: self.len.max(1),
                ..self
            };
        }
        let start = self.col.min(other.col);
        let end = (self.col + self.len).max(other.col + other.len);
        Span::new(self.line, start, end - start)
    }

    /// Render the offending source line with a caret marker underneath.
    pub fn render_in(&self, source: &str) -> Option<String> {
        let text = source.lines().nth(self.line.checked_sub(1)? as usize)?;
        let pad = " ".repeat(self.col.saturating_sub(1) as usize);
        let marker = "^".repeat(self.len.max(1) as usize);
        Some(format!("{:>4} | {text}\n     | {pad}{marker}", self.line))
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
