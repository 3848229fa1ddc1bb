// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Layout algorithms for parse trees.
//!
//! This module computes node placement for the layered tree view and the
//! viewport mapping between layout and view coordinates.

pub mod tree;
pub mod viewport;

pub use tree::{
    default_extent, layout_tree, Extent, LayoutConfig, LayoutNode, LayoutNodeKind, LayoutTree,
    Point, Rect,
};
pub use viewport::Viewport;
