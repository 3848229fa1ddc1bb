// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Layered placement for parse trees.
//!
//! Nodes are leveled by depth and children packed left to right in child
//! order; a parent sits centered over the midpoint of its children. The
//! whole layout is recomputed per outcome, there is no incremental
//! patching. Identical tree, config and extents produce identical
//! rectangles.

use crate::model::{GrammarPair, NodePath, TreeNode};
use crate::present::{label_for, LabelMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}

/// Axis-aligned rectangle in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn union(&self, other: Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }
}

/// Measured size of one node cell before clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    width: f32,
}

impl Extent {
    pub fn new(width: f32) -> Self {
        Self { width }
    }

    pub fn width(&self) -> f32 {
        self.width
    }
}

/// Default measurement: label character count plus one cell of padding on
/// each side.
pub fn default_extent(_node: &TreeNode, label: &str) -> Extent {
    Extent::new(label.chars().count() as f32 + 2.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    min_cell_width: f32,
    terminal_width: f32,
    row_height: f32,
    h_gap: f32,
    level_gap: f32,
    label_mode: LabelMode,
}

impl LayoutConfig {
    pub fn min_cell_width(&self) -> f32 {
        self.min_cell_width
    }

    pub fn terminal_width(&self) -> f32 {
        self.terminal_width
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn h_gap(&self) -> f32 {
        self.h_gap
    }

    pub fn level_gap(&self) -> f32 {
        self.level_gap
    }

    pub fn label_mode(&self) -> LabelMode {
        self.label_mode
    }

    pub fn with_label_mode(mut self, label_mode: LabelMode) -> Self {
        self.label_mode = label_mode;
        self
    }

    pub fn with_gaps(mut self, h_gap: f32, level_gap: f32) -> Self {
        self.h_gap = h_gap;
        self.level_gap = level_gap;
        self
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_cell_width: 6.0,
            terminal_width: 4.0,
            row_height: 1.0,
            h_gap: 2.0,
            level_gap: 1.0,
            label_mode: LabelMode::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutNodeKind {
    Rule,
    Terminal,
    Error,
}

/// One placed cell. References its tree node by path, never by pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    path: NodePath,
    label: String,
    kind: LayoutNodeKind,
    rect: Rect,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl LayoutNode {
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> LayoutNodeKind {
        self.kind
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// Placed tree. Node 0 is the root; children always follow their parent, so
/// descending indices give a post-order traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTree {
    nodes: Vec<LayoutNode>,
    bounds: Rect,
}

impl LayoutTree {
    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&LayoutNode> {
        self.nodes.get(idx)
    }

    pub fn root(&self) -> &LayoutNode {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Hit test in layout units. Linear scan over all cells; queries are
    /// O(n), which is fine at the tens to low thousands of nodes a preview
    /// tree has.
    pub fn node_at(&self, point: Point) -> Option<&LayoutNode> {
        self.nodes.iter().find(|node| node.rect.contains(point))
    }

    pub fn index_of(&self, path: &NodePath) -> Option<usize> {
        self.nodes.iter().position(|node| node.path == *path)
    }

    pub fn rect_of(&self, path: &NodePath) -> Option<Rect> {
        self.index_of(path).map(|idx| self.nodes[idx].rect)
    }

    pub fn bounding_box(&self) -> Rect {
        self.bounds
    }
}

/// Lays out `root` top-down. `measure` sizes one cell given the node and
/// its label; internal cells are clamped to the configured minimum width,
/// terminal and error cells to the terminal minimum.
pub fn layout_tree(
    root: &TreeNode,
    pair: &GrammarPair,
    config: &LayoutConfig,
    measure: impl Fn(&TreeNode, &str) -> Extent,
) -> LayoutTree {
    let mut nodes = Vec::with_capacity(root.node_count());
    build(root, NodePath::root(), None, pair, config, &measure, &mut nodes);

    let mut spans = vec![0.0f32; nodes.len()];
    for idx in (0..nodes.len()).rev() {
        let node = &nodes[idx];
        spans[idx] = if node.children.is_empty() {
            node.rect.width
        } else {
            let gaps = config.h_gap * (node.children.len() - 1) as f32;
            let total: f32 = node.children.iter().map(|&c| spans[c]).sum::<f32>() + gaps;
            total.max(node.rect.width)
        };
    }

    place(0, 0.0, 0, config, &spans, &mut nodes);

    let bounds = nodes
        .iter()
        .skip(1)
        .fold(nodes[0].rect, |acc, node| acc.union(node.rect));

    LayoutTree { nodes, bounds }
}

fn build(
    node: &TreeNode,
    path: NodePath,
    parent: Option<usize>,
    pair: &GrammarPair,
    config: &LayoutConfig,
    measure: &impl Fn(&TreeNode, &str) -> Extent,
    nodes: &mut Vec<LayoutNode>,
) -> usize {
    let label = label_for(node, pair, config.label_mode);
    let kind = match node {
        TreeNode::Rule(_) => LayoutNodeKind::Rule,
        TreeNode::Terminal(_) => LayoutNodeKind::Terminal,
        TreeNode::Error(_) => LayoutNodeKind::Error,
    };
    let min_width = match kind {
        LayoutNodeKind::Rule => config.min_cell_width,
        LayoutNodeKind::Terminal | LayoutNodeKind::Error => config.terminal_width,
    };
    let width = measure(node, &label).width().max(min_width);

    let idx = nodes.len();
    nodes.push(LayoutNode {
        path: path.clone(),
        label,
        kind,
        rect: Rect::new(0.0, 0.0, width, config.row_height),
        parent,
        children: Vec::with_capacity(node.children().len()),
    });

    for (i, child) in node.children().iter().enumerate() {
        let child_idx = build(
            child,
            path.child(i as u32),
            Some(idx),
            pair,
            config,
            measure,
            nodes,
        );
        nodes[idx].children.push(child_idx);
    }
    idx
}

fn place(
    idx: usize,
    x: f32,
    depth: usize,
    config: &LayoutConfig,
    spans: &[f32],
    nodes: &mut [LayoutNode],
) {
    let y = depth as f32 * (config.row_height + config.level_gap);
    let children = nodes[idx].children.clone();

    if children.is_empty() {
        let width = nodes[idx].rect.width;
        nodes[idx].rect = Rect::new(x + (spans[idx] - width) / 2.0, y, width, config.row_height);
        return;
    }

    let gaps = config.h_gap * (children.len() - 1) as f32;
    let children_total: f32 = children.iter().map(|&c| spans[c]).sum::<f32>() + gaps;
    let mut child_x = x + (spans[idx] - children_total) / 2.0;
    for &child in &children {
        place(child, child_x, depth + 1, config, spans, nodes);
        child_x += spans[child] + config.h_gap;
    }

    let first = nodes[children[0]].rect;
    let last = nodes[children[children.len() - 1]].rect;
    let mid = (first.center_x() + last.center_x()) / 2.0;
    let width = nodes[idx].rect.width;
    nodes[idx].rect = Rect::new(mid - width / 2.0, y, width, config.row_height);
}

#[cfg(test)]
mod tests {
    use super::{default_extent, layout_tree, LayoutConfig, LayoutNodeKind, Point};
    use crate::model::fixtures::{tiny_ok_tree, tiny_pair};
    use crate::model::NodePath;

    fn tiny_layout() -> super::LayoutTree {
        layout_tree(
            &tiny_ok_tree(),
            &tiny_pair(),
            &LayoutConfig::default(),
            default_extent,
        )
    }

    #[test]
    fn parents_center_over_their_children() {
        let layout = tiny_layout();
        let root = layout.root();
        assert_eq!(root.children().len(), 3);

        let first = layout.node(root.children()[0]).unwrap().rect();
        let last = layout.node(root.children()[2]).unwrap().rect();
        let mid = (first.center_x() + last.center_x()) / 2.0;
        assert_eq!(root.rect().center_x(), mid);
    }

    #[test]
    fn depth_drives_the_vertical_position() {
        let layout = tiny_layout();
        let config = LayoutConfig::default();
        assert_eq!(layout.root().rect().y(), 0.0);
        for &child in layout.root().children() {
            let rect = layout.node(child).unwrap().rect();
            assert_eq!(rect.y(), config.row_height() + config.level_gap());
        }
    }

    #[test]
    fn siblings_do_not_overlap() {
        let layout = tiny_layout();
        let root = layout.root();
        for pair in root.children().windows(2) {
            let left = layout.node(pair[0]).unwrap().rect();
            let right = layout.node(pair[1]).unwrap().rect();
            assert!(left.right() <= right.x(), "{left:?} overlaps {right:?}");
        }
    }

    #[test]
    fn hit_testing_finds_the_cell_under_a_point() {
        let layout = tiny_layout();
        let target = layout.node(layout.root().children()[1]).unwrap();
        let inside = Point::new(target.rect().center_x(), target.rect().center_y());
        assert_eq!(layout.node_at(inside).map(|n| n.path()), Some(target.path()));

        let outside = Point::new(layout.bounding_box().right() + 10.0, 0.0);
        assert!(layout.node_at(outside).is_none());
    }

    #[test]
    fn rect_lookup_is_the_inverse_of_hit_testing() {
        let layout = tiny_layout();
        let path = NodePath::from_indices([0]);
        let rect = layout.rect_of(&path).unwrap();
        let found = layout.node_at(Point::new(rect.center_x(), rect.center_y()));
        assert_eq!(found.map(|n| n.path()), Some(&path));

        assert!(layout.rect_of(&NodePath::from_indices([7])).is_none());
    }

    #[test]
    fn bounding_box_covers_every_cell() {
        let layout = tiny_layout();
        let bounds = layout.bounding_box();
        for node in layout.nodes() {
            let rect = node.rect();
            assert!(rect.x() >= bounds.x());
            assert!(rect.right() <= bounds.right());
            assert!(rect.y() >= bounds.y());
            assert!(rect.bottom() <= bounds.bottom());
        }
    }

    #[test]
    fn identical_inputs_produce_identical_rectangles() {
        let a = tiny_layout();
        let b = tiny_layout();
        assert_eq!(a, b);
    }

    #[test]
    fn terminal_cells_keep_their_minimum_width() {
        let layout = tiny_layout();
        let config = LayoutConfig::default();
        for node in layout.nodes() {
            if node.kind() == LayoutNodeKind::Terminal {
                assert!(node.rect().width() >= config.terminal_width());
            }
        }
    }
}
