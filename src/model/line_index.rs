// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Newline table mapping byte offsets to 1-based line/column positions.
///
/// Columns count bytes, not grapheme clusters; good enough for the error
/// pane and cheap to build on every input change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for nl in memchr::memchr_iter(b'\n', text.as_bytes()) {
            line_starts.push(nl + 1);
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line/column of a byte offset. Offsets past the end clamp to
    /// the final position.
    pub fn line_col(&self, offset: usize) -> LineCol {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        LineCol {
            line: line + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }

    /// Byte offset of the start of a 1-based line, if it exists.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        self.line_starts.get(line - 1).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    line: usize,
    column: usize,
}

impl LineCol {
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

#[cfg(test)]
mod tests {
    use super::LineIndex;

    #[test]
    fn single_line_positions() {
        let index = LineIndex::new("abc");
        assert_eq!(index.line_count(), 1);
        let pos = index.line_col(0);
        assert_eq!((pos.line(), pos.column()), (1, 1));
        let pos = index.line_col(2);
        assert_eq!((pos.line(), pos.column()), (1, 3));
    }

    #[test]
    fn multi_line_positions() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.line_count(), 3);
        let pos = index.line_col(3);
        assert_eq!((pos.line(), pos.column()), (2, 1));
        let pos = index.line_col(4);
        assert_eq!((pos.line(), pos.column()), (2, 2));
        assert_eq!(index.line_start(2), Some(3));
        assert_eq!(index.line_start(4), None);
    }

    #[test]
    fn offset_past_end_clamps() {
        let index = LineIndex::new("ab");
        let pos = index.line_col(99);
        assert_eq!((pos.line(), pos.column()), (1, 3));
    }
}
