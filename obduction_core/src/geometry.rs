// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer rectangles and bounding-rectangle reduction.
//!
//! Hardware overlay layers accept only axis-aligned integer rectangles, so
//! every region computed in floating point is reduced to its integer bounding
//! rectangle before reaching a layer property. This is a deliberate precision
//! loss versus exact-region software compositing.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use core::fmt;

/// An axis-aligned integer rectangle (position + size).
///
/// A rectangle with non-positive width or height is *empty*; all operations
/// normalize empty results to [`IRect::EMPTY`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub w: i32,
    /// Height.
    pub h: i32,
}

impl IRect {
    /// The empty rectangle at the origin.
    pub const EMPTY: Self = Self {
        x: 0,
        y: 0,
        w: 0,
        h: 0,
    };

    /// Creates a rectangle from position and size.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Creates a rectangle at the origin with the given size.
    #[inline]
    #[must_use]
    pub const fn from_size(w: i32, h: i32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    /// Returns whether this rectangle has no area.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Intersects two rectangles, returning [`IRect::EMPTY`] when they do not
    /// overlap.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.w).min(other.x + other.w);
        let y2 = (self.y + self.h).min(other.y + other.h);
        if x2 <= x1 || y2 <= y1 {
            return Self::EMPTY;
        }
        Self {
            x: x1,
            y: y1,
            w: x2 - x1,
            h: y2 - y1,
        }
    }

    /// Converts to a floating-point [`kurbo::Rect`].
    #[inline]
    #[must_use]
    pub fn to_rect(self) -> kurbo::Rect {
        kurbo::Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x + self.w),
            f64::from(self.y + self.h),
        )
    }

    /// Reduces a floating-point rectangle to its integer bounding rectangle.
    ///
    /// Minimum edges are floored and maximum edges are ceiled, so the result
    /// always covers the input. Degenerate input reduces to
    /// [`IRect::EMPTY`].
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "coordinates are output-space pixels, far below i32 range"
    )]
    pub fn bounding(rect: kurbo::Rect) -> Self {
        let x1 = rect.min_x().floor();
        let y1 = rect.min_y().floor();
        let x2 = rect.max_x().ceil();
        let y2 = rect.max_y().ceil();
        if !(x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite()) {
            return Self::EMPTY;
        }
        let out = Self {
            x: x1 as i32,
            y: y1 as i32,
            w: (x2 - x1) as i32,
            h: (y2 - y1) as i32,
        };
        if out.is_empty() { Self::EMPTY } else { out }
    }
}

impl fmt::Debug for IRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IRect({},{} {}x{})", self.x, self.y, self.w, self.h)
    }
}
