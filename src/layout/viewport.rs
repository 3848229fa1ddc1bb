// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Zoom and pan over a laid-out tree.
//!
//! The viewport maps layout coordinates to view coordinates with a clamped
//! continuous scale and a pan offset. `project` carries layout rectangles
//! into the view for painting; `unproject` carries pointer positions back
//! into layout space for hit-testing.

use crate::layout::tree::{Point, Rect};

const DEFAULT_MIN_SCALE: f32 = 0.25;
const DEFAULT_MAX_SCALE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f32,
    min_scale: f32,
    max_scale: f32,
    pan_x: f32,
    pan_y: f32,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Replaces the scale limits and re-clamps the current scale. A reversed
    /// pair is swapped into order.
    pub fn with_scale_limits(mut self, min_scale: f32, max_scale: f32) -> Self {
        let (lo, hi) = if min_scale <= max_scale {
            (min_scale, max_scale)
        } else {
            (max_scale, min_scale)
        };
        self.min_scale = lo;
        self.max_scale = hi;
        self.scale = self.scale.clamp(lo, hi);
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(self.min_scale, self.max_scale);
    }

    /// Multiplies the scale by `factor`, keeping the layout point under
    /// `anchor` fixed in view space.
    pub fn zoom_by(&mut self, factor: f32, anchor: Point) {
        let before = self.unproject_point(anchor);
        self.set_scale(self.scale * factor);
        let after = self.project_point(before);
        self.pan_x += anchor.x() - after.x();
        self.pan_y += anchor.y() - after.y();
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Fits `bounds` into a view of the given size: the smaller of the
    /// horizontal and vertical ratios becomes the scale, clamped to the
    /// limits, and the pan centers the bounds in the view. Degenerate
    /// bounds or view sizes leave the viewport at scale 1 over the bounds
    /// origin.
    pub fn fit_to(&mut self, view_width: f32, view_height: f32, bounds: Rect) {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 || view_width <= 0.0 || view_height <= 0.0
        {
            self.scale = 1.0f32.clamp(self.min_scale, self.max_scale);
            self.pan_x = -bounds.x() * self.scale;
            self.pan_y = -bounds.y() * self.scale;
            return;
        }

        let ratio_x = view_width / bounds.width();
        let ratio_y = view_height / bounds.height();
        self.scale = ratio_x.min(ratio_y).clamp(self.min_scale, self.max_scale);

        self.pan_x = (view_width - bounds.width() * self.scale) / 2.0 - bounds.x() * self.scale;
        self.pan_y = (view_height - bounds.height() * self.scale) / 2.0 - bounds.y() * self.scale;
    }

    pub fn project_point(&self, point: Point) -> Point {
        Point::new(
            point.x() * self.scale + self.pan_x,
            point.y() * self.scale + self.pan_y,
        )
    }

    pub fn unproject_point(&self, point: Point) -> Point {
        Point::new(
            (point.x() - self.pan_x) / self.scale,
            (point.y() - self.pan_y) / self.scale,
        )
    }

    pub fn project(&self, rect: Rect) -> Rect {
        Rect::new(
            rect.x() * self.scale + self.pan_x,
            rect.y() * self.scale + self.pan_y,
            rect.width() * self.scale,
            rect.height() * self.scale,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Viewport;
    use crate::layout::tree::{Point, Rect};

    #[test]
    fn the_scale_is_clamped_to_the_limits() {
        let mut vp = Viewport::new();
        vp.set_scale(100.0);
        assert_eq!(vp.scale(), 4.0);
        vp.set_scale(0.0);
        assert_eq!(vp.scale(), 0.25);

        let custom = Viewport::new().with_scale_limits(0.5, 2.0);
        assert_eq!(custom.scale(), 1.0);
        let mut custom = custom;
        custom.set_scale(3.0);
        assert_eq!(custom.scale(), 2.0);
    }

    #[test]
    fn reversed_scale_limits_are_reordered() {
        let vp = Viewport::new().with_scale_limits(2.0, 0.5);
        assert_eq!(vp.min_scale(), 0.5);
        assert_eq!(vp.max_scale(), 2.0);
    }

    #[test]
    fn fit_prefers_the_tighter_axis() {
        let mut vp = Viewport::new();
        vp.fit_to(100.0, 50.0, Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(vp.scale(), 1.0);

        let mut vp = Viewport::new();
        vp.fit_to(100.0, 100.0, Rect::new(0.0, 0.0, 50.0, 25.0));
        assert_eq!(vp.scale(), 2.0);
    }

    #[test]
    fn fit_centers_the_bounds_in_the_view() {
        let mut vp = Viewport::new();
        vp.fit_to(100.0, 100.0, Rect::new(10.0, 20.0, 50.0, 50.0));

        let projected = vp.project(Rect::new(10.0, 20.0, 50.0, 50.0));
        assert_eq!(projected.x(), 0.0);
        assert_eq!(projected.y(), 0.0);
        assert_eq!(projected.width(), 100.0);
        assert_eq!(projected.height(), 100.0);
    }

    #[test]
    fn fit_respects_the_scale_cap() {
        let mut vp = Viewport::new();
        vp.fit_to(1000.0, 1000.0, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(vp.scale(), 4.0);
    }

    #[test]
    fn degenerate_bounds_reset_to_unit_scale_over_the_origin() {
        let mut vp = Viewport::new();
        vp.fit_to(100.0, 100.0, Rect::new(5.0, 7.0, 0.0, 0.0));
        assert_eq!(vp.scale(), 1.0);
        assert_eq!(vp.project_point(Point::new(5.0, 7.0)), Point::new(0.0, 0.0));
    }

    #[test]
    fn unproject_inverts_project() {
        let mut vp = Viewport::new();
        vp.set_scale(2.0);
        vp.pan_by(13.0, -4.0);

        let layout = Point::new(3.5, 8.0);
        let view = vp.project_point(layout);
        assert_eq!(vp.unproject_point(view), layout);
    }

    #[test]
    fn zooming_keeps_the_anchor_fixed() {
        let mut vp = Viewport::new();
        vp.pan_by(10.0, 10.0);
        let anchor = Point::new(30.0, 30.0);
        let under_anchor = vp.unproject_point(anchor);

        vp.zoom_by(2.0, anchor);

        assert_eq!(vp.project_point(under_anchor), anchor);
        assert_eq!(vp.scale(), 2.0);
    }
}
