// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Rendering for parse trees.
//!
//! The renderer produces Unicode text plus a stable highlight index that
//! the TUI uses for cell-accurate selection highlighting.

use std::collections::BTreeMap;

use crate::model::NodePath;

mod canvas;
mod text;
mod tree;

pub use canvas::{Canvas, CanvasError};
pub use tree::{render_layout_unicode, TreeRenderError};

/// A contiguous run of highlighted cells within a single rendered line.
///
/// Coordinates are `(y, x0, x1)` in character-cell indices, inclusive,
/// relative to the returned rendered text lines.
pub type LineSpan = (usize, usize, usize);

/// Mapping from node paths to the spans that should be highlighted for
/// that node.
pub type HighlightIndex = BTreeMap<NodePath, Vec<LineSpan>>;

/// Render output plus an index suitable for stable, cell-accurate UI
/// highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedRender {
    pub text: String,
    pub highlight_index: HighlightIndex,
}

/// Trims spans that fall outside the final text, which loses cells to
/// trailing-space trimming.
pub(crate) fn clamp_highlight_index_to_text(highlight_index: &mut HighlightIndex, text: &str) {
    let line_lens: Vec<usize> = text.split('\n').map(text::text_len).collect();

    highlight_index.retain(|_, spans| {
        spans.retain_mut(|span| {
            let (y, x0, x1) = span;

            let len = match line_lens.get(*y) {
                Some(len) => *len,
                None => return false,
            };

            if len == 0 || *x0 >= len {
                return false;
            }

            let max_x = len - 1;
            if *x1 > max_x {
                *x1 = max_x;
            }

            *x0 <= *x1
        });
        !spans.is_empty()
    });
}

#[cfg(test)]
mod tests {
    use super::{clamp_highlight_index_to_text, HighlightIndex};
    use crate::model::NodePath;

    #[test]
    fn clamping_trims_spans_to_the_rendered_lines() {
        let mut index = HighlightIndex::new();
        index.insert(NodePath::root(), vec![(0, 0, 9), (1, 4, 6), (2, 0, 2)]);
        index.insert(NodePath::from_indices([0]), vec![(1, 0, 1)]);

        clamp_highlight_index_to_text(&mut index, "abcde\nxy");

        assert_eq!(
            index.get(&NodePath::root()),
            Some(&vec![(0usize, 0usize, 4usize)])
        );
        assert_eq!(
            index.get(&NodePath::from_indices([0])),
            Some(&vec![(1usize, 0usize, 1usize)])
        );
    }

    #[test]
    fn entries_with_no_surviving_spans_are_dropped() {
        let mut index = HighlightIndex::new();
        index.insert(NodePath::root(), vec![(5, 0, 3)]);

        clamp_highlight_index_to_text(&mut index, "ab");

        assert!(index.is_empty());
    }
}
