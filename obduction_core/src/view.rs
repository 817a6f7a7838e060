// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance view geometry and overlay placement.
//!
//! [`place`] is the region transformer: it turns one content instance's
//! geometry plus the frame's damage into the destination rectangle (output
//! space), source crop rectangle (buffer space), and rotation mode that a
//! hardware layer accepts. All region math goes through the integer
//! bounding-rectangle reduction in [`crate::geometry`].

use kurbo::{Affine, Point};

use crate::geometry::IRect;
use crate::output::OutputProjection;
use crate::rotation::Rotation;

/// Geometry of one content instance for one frame.
#[derive(Clone, Copy, Debug)]
pub struct ViewGeometry {
    /// Content width in surface coordinates.
    pub surface_width: i32,
    /// Content height in surface coordinates.
    pub surface_height: i32,
    /// Position in global space, used when `transform` is `None`.
    pub position: Point,
    /// Full surface-to-global transform. `None` means pure translation by
    /// `position`.
    pub transform: Option<Affine>,
    /// Surface-to-buffer transform (buffer scale, viewport).
    pub surface_to_buffer: Affine,
}

impl ViewGeometry {
    /// The surface-to-global transform, resolving the translation-only case.
    #[inline]
    #[must_use]
    pub fn to_global(&self) -> Affine {
        self.transform
            .unwrap_or_else(|| Affine::translate(self.position.to_vec2()))
    }
}

/// What a hardware layer needs to present one instance: where on the output,
/// which part of the buffer, and how it is rotated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerPlacement {
    /// Destination rectangle in output pixel space.
    pub dst: IRect,
    /// Source crop rectangle in buffer space.
    pub src: IRect,
    /// Rotation the layer must apply.
    pub rotation: Rotation,
}

impl LayerPlacement {
    /// A placement covering nothing.
    pub const EMPTY: Self = Self {
        dst: IRect::EMPTY,
        src: IRect::EMPTY,
        rotation: Rotation::None,
    };

    /// Returns whether this placement presents any pixels.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dst.is_empty() || self.src.is_empty()
    }
}

/// Computes the layer placement for one instance against this frame's damage.
///
/// `damage` is in global space. The destination is the instance's extent in
/// output space intersected with the projected damage; the source is the
/// destination mapped back through the output and view inverses into buffer
/// space. A non-invertible view transform, empty damage, or a zero-sized
/// surface all produce [`LayerPlacement::EMPTY`].
#[must_use]
pub fn place(output: &OutputProjection, view: &ViewGeometry, damage: IRect) -> LayerPlacement {
    if damage.is_empty() || view.surface_width <= 0 || view.surface_height <= 0 {
        return LayerPlacement::EMPTY;
    }
    let to_global = view.to_global();
    if to_global.determinant() == 0.0 {
        return LayerPlacement::EMPTY;
    }

    let extent = IRect::from_size(view.surface_width, view.surface_height).to_rect();
    let on_output = IRect::bounding((output.matrix() * to_global).transform_rect_bbox(extent));
    let dst = on_output.intersect(output.project_damage(damage));
    if dst.is_empty() {
        return LayerPlacement::EMPTY;
    }

    // Output space back to buffer space. The same map's linear part decides
    // the layer's rotation mode.
    let out_to_buffer = view.surface_to_buffer * to_global.inverse() * output.inverse();
    let src = IRect::bounding(out_to_buffer.transform_rect_bbox(dst.to_rect()));
    if src.is_empty() {
        return LayerPlacement::EMPTY;
    }

    LayerPlacement {
        dst,
        src,
        rotation: Rotation::classify(out_to_buffer),
    }
}
