// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlap and containment predicates over [`kurbo::Rect`].
//!
//! Kurbo's own `Rect::overlaps` treats touching edges as overlapping. Broad-
//! and narrow-phase collision tests in this workspace want the opposite, so
//! the predicates live here with the convention spelled out per method.

use kurbo::{Point, Rect, Vec2};

/// Extension predicates for [`Rect`] used by the tree and its callers.
pub trait RectExt {
    /// Open-interval overlap: true iff the interiors intersect.
    ///
    /// Rectangles that merely touch at an edge or corner do **not** overlap,
    /// and a zero-width or zero-height rectangle overlaps nothing.
    fn overlaps_open(&self, other: Rect) -> bool;

    /// Boundary-inclusive point containment (hit-testing convention).
    ///
    /// A point on an edge or corner is inside. This is the variant used by
    /// [`DynamicBoxTree::query_point`](crate::DynamicBoxTree::query_point).
    fn contains_point_inclusive(&self, p: Point) -> bool;

    /// Boundary-exclusive point containment.
    ///
    /// A point on an edge or corner is outside, matching the open-interval
    /// overlap convention of [`RectExt::overlaps_open`].
    fn contains_point_strict(&self, p: Point) -> bool;

    /// Boundary-inclusive rectangle containment: `other` lies entirely
    /// within `self`. Used for the escaped-fattened-box check.
    fn contains_rect(&self, other: Rect) -> bool;

    /// Grow in the direction of `delta` only: the min edge moves for a
    /// negative component, the max edge for a positive one.
    fn extended_by(&self, delta: Vec2) -> Rect;
}

impl RectExt for Rect {
    #[inline]
    fn overlaps_open(&self, other: Rect) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }

    #[inline]
    fn contains_point_inclusive(&self, p: Point) -> bool {
        self.x0 <= p.x && p.x <= self.x1 && self.y0 <= p.y && p.y <= self.y1
    }

    #[inline]
    fn contains_point_strict(&self, p: Point) -> bool {
        self.x0 < p.x && p.x < self.x1 && self.y0 < p.y && p.y < self.y1
    }

    #[inline]
    fn contains_rect(&self, other: Rect) -> bool {
        self.x0 <= other.x0 && other.x1 <= self.x1 && self.y0 <= other.y0 && other.y1 <= self.y1
    }

    #[inline]
    fn extended_by(&self, delta: Vec2) -> Rect {
        let mut r = *self;
        if delta.x < 0.0 {
            r.x0 += delta.x;
        } else {
            r.x1 += delta.x;
        }
        if delta.y < 0.0 {
            r.y0 += delta.y;
        } else {
            r.y1 += delta.y;
        }
        r
    }
}
