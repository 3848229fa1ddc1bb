// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Character-cell rendering of a laid-out parse tree.
//!
//! Each cell becomes a three-row box with its label centered inside;
//! connectors run from a parent's bottom border through a shared rail row
//! to each child's top border. The viewport contributes horizontal scale
//! and pan; rows are discretized to a fixed pitch per depth level, and a
//! leftward pan past the origin is clamped so the leftmost cell stays
//! visible.

use std::fmt;

use crate::layout::{LayoutTree, Rect, Viewport};

use super::canvas::{BoxEdges, Canvas, CanvasError};
use super::text::{canvas_to_string_trimmed, text_len, truncate_with_ellipsis};
use super::{clamp_highlight_index_to_text, AnnotatedRender, HighlightIndex, LineSpan};

const BOX_HEIGHT: usize = 3;
const LEVEL_GAP_ROWS: usize = 2;
const MIN_BOX_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRect {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
    cx: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeRenderError {
    Canvas(CanvasError),
}

impl fmt::Display for TreeRenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canvas(err) => write!(f, "canvas error: {err}"),
        }
    }
}

impl std::error::Error for TreeRenderError {}

impl From<CanvasError> for TreeRenderError {
    fn from(value: CanvasError) -> Self {
        Self::Canvas(value)
    }
}

/// Renders `layout` to Unicode text plus a highlight index mapping each
/// node path to the line spans its box occupies.
pub fn render_layout_unicode(
    layout: &LayoutTree,
    viewport: Option<&Viewport>,
) -> Result<AnnotatedRender, TreeRenderError> {
    if layout.is_empty() {
        return Ok(AnnotatedRender {
            text: String::new(),
            highlight_index: HighlightIndex::new(),
        });
    }

    let cells = discretize(layout, viewport);

    let width = cells.iter().map(|c| c.x1 + 1).max().unwrap_or(0);
    let height = cells.iter().map(|c| c.y1 + 1).max().unwrap_or(0);
    let mut canvas = Canvas::new(width, height)?;

    for (node, cell) in layout.nodes().iter().zip(&cells) {
        canvas.draw_box(cell.x0, cell.y0, cell.x1, cell.y1)?;

        let inner_width = cell.x1 - cell.x0 - 1;
        let clipped = truncate_with_ellipsis(node.label(), inner_width);
        let left_pad = inner_width.saturating_sub(text_len(&clipped)) / 2;
        canvas.write_str(cell.x0 + 1 + left_pad, cell.y0 + 1, &clipped)?;
    }

    for (node, cell) in layout.nodes().iter().zip(&cells) {
        if node.children().is_empty() {
            continue;
        }
        draw_connector(&mut canvas, cell, node.children(), &cells)?;
    }

    let mut highlight_index = HighlightIndex::new();
    for (node, cell) in layout.nodes().iter().zip(&cells) {
        let spans: Vec<LineSpan> = (cell.y0..=cell.y1).map(|y| (y, cell.x0, cell.x1)).collect();
        highlight_index.insert(node.path().clone(), spans);
    }

    let text = canvas_to_string_trimmed(&canvas);
    clamp_highlight_index_to_text(&mut highlight_index, &text);
    Ok(AnnotatedRender {
        text,
        highlight_index,
    })
}

/// Maps layout rectangles to integer cell boxes. Same-depth nodes share
/// the same layout `y`, so the sorted distinct `y` values enumerate the
/// levels.
fn discretize(layout: &LayoutTree, viewport: Option<&Viewport>) -> Vec<CellRect> {
    let rects: Vec<Rect> = layout
        .nodes()
        .iter()
        .map(|node| match viewport {
            Some(vp) => vp.project(node.rect()),
            None => node.rect(),
        })
        .collect();

    let mut level_ys: Vec<f32> = rects.iter().map(|r| r.y()).collect();
    level_ys.sort_by(f32::total_cmp);
    level_ys.dedup();

    let x_off = rects
        .iter()
        .map(|r| r.x())
        .fold(f32::INFINITY, f32::min)
        .min(0.0);

    rects
        .iter()
        .map(|r| {
            let x0 = (r.x() - x_off).round() as usize;
            let width = (r.width().round() as usize).max(MIN_BOX_WIDTH);
            let level = level_ys.iter().position(|y| *y == r.y()).unwrap_or(0);
            let y0 = level * (BOX_HEIGHT + LEVEL_GAP_ROWS);
            CellRect {
                x0,
                x1: x0 + width - 1,
                y0,
                y1: y0 + BOX_HEIGHT - 1,
                cx: x0 + width / 2,
            }
        })
        .collect()
}

fn draw_connector(
    canvas: &mut Canvas,
    parent: &CellRect,
    children: &[usize],
    cells: &[CellRect],
) -> Result<(), CanvasError> {
    let rail_y = cells[children[0]].y0 - 1;

    canvas.merge(parent.cx, parent.y1, BoxEdges::DOWN)?;
    for y in (parent.y1 + 1)..rail_y {
        canvas.merge(parent.cx, y, BoxEdges::UP.union(BoxEdges::DOWN))?;
    }

    let child_cxs: Vec<usize> = children.iter().map(|&c| cells[c].cx).collect();
    let lo = child_cxs.iter().copied().min().unwrap_or(parent.cx).min(parent.cx);
    let hi = child_cxs.iter().copied().max().unwrap_or(parent.cx).max(parent.cx);

    for x in lo..=hi {
        let mut edges = BoxEdges::NONE;
        if x > lo {
            edges = edges.union(BoxEdges::LEFT);
        }
        if x < hi {
            edges = edges.union(BoxEdges::RIGHT);
        }
        if x == parent.cx {
            edges = edges.union(BoxEdges::UP);
        }
        if child_cxs.contains(&x) {
            edges = edges.union(BoxEdges::DOWN);
        }
        canvas.merge(x, rail_y, edges)?;
    }

    for &child in children {
        let cell = cells[child];
        for y in (rail_y + 1)..cell.y0 {
            canvas.merge(cell.cx, y, BoxEdges::UP.union(BoxEdges::DOWN))?;
        }
        canvas.merge(cell.cx, cell.y0, BoxEdges::UP)?;
    }

    Ok(())
}
