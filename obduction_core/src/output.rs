// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display identity, mode enumeration, and the output projection.
//!
//! An [`OutputProjection`] is the affine map from global (compositor) space
//! into output pixel space, combining origin translation, scale, whole-output
//! rotation, and any zoom the host applies. The projection carries its inverse
//! so per-frame placement math never recomputes it.

use kurbo::Affine;

use crate::geometry::IRect;
use crate::rotation::Rotation;

/// Identifies one display device.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DeviceId(pub u32);

impl core::fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

/// One display mode as enumerated by the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct OutputMode {
    /// Driver-assigned mode id.
    pub id: u32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Refresh rate in millihertz (60 Hz is stored as 60_000).
    pub refresh_mhz: u32,
}

impl OutputMode {
    /// The full-mode extent as a rectangle at the origin.
    #[inline]
    #[must_use]
    pub const fn extent(&self) -> IRect {
        IRect::from_size(self.width, self.height)
    }
}

/// The affine map from global space into output pixel space, with its inverse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputProjection {
    matrix: Affine,
    inverse: Affine,
}

impl OutputProjection {
    /// The identity projection (global space is output space).
    pub const IDENTITY: Self = Self {
        matrix: Affine::IDENTITY,
        inverse: Affine::IDENTITY,
    };

    /// Builds the projection for an output at `(x, y)` in global space with
    /// the given logical size, integer scale, and whole-output rotation.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is not strictly positive.
    #[must_use]
    pub fn new(x: f64, y: f64, logical_width: f64, logical_height: f64, scale: f64, rotation: Rotation) -> Self {
        assert!(scale > 0.0, "output scale must be positive");
        let rotate = rotation_affine(rotation, logical_width * scale, logical_height * scale);
        let matrix = rotate * Affine::scale(scale) * Affine::translate((-x, -y));
        // Translation, positive scale, and quarter-turn rotation are each
        // invertible, so the composite is too.
        let inverse = matrix.inverse();
        Self { matrix, inverse }
    }

    /// Wraps an arbitrary projection matrix (e.g. with zoom applied).
    ///
    /// Returns `None` when the matrix is not invertible.
    #[must_use]
    pub fn from_matrix(matrix: Affine) -> Option<Self> {
        if matrix.determinant() == 0.0 {
            return None;
        }
        Some(Self {
            matrix,
            inverse: matrix.inverse(),
        })
    }

    /// The global-to-output matrix.
    #[inline]
    #[must_use]
    pub const fn matrix(&self) -> Affine {
        self.matrix
    }

    /// The output-to-global matrix.
    #[inline]
    #[must_use]
    pub const fn inverse(&self) -> Affine {
        self.inverse
    }

    /// Maps a global-space damage rectangle into output pixel space,
    /// reduced to its integer bounding rectangle.
    #[must_use]
    pub fn project_damage(&self, damage: IRect) -> IRect {
        if damage.is_empty() {
            return IRect::EMPTY;
        }
        IRect::bounding(self.matrix.transform_rect_bbox(damage.to_rect()))
    }
}

/// The affine for a quarter-turn rotation of a `width` x `height` pixel area,
/// keeping coordinates non-negative.
fn rotation_affine(rotation: Rotation, width: f64, height: f64) -> Affine {
    match rotation {
        Rotation::None => Affine::IDENTITY,
        // (x, y) -> (height - y, x)
        Rotation::Rotate90 => Affine::new([0.0, 1.0, -1.0, 0.0, height, 0.0]),
        // (x, y) -> (width - x, height - y)
        Rotation::Rotate180 => Affine::new([-1.0, 0.0, 0.0, -1.0, width, height]),
        // (x, y) -> (y, width - x)
        Rotation::Rotate270 => Affine::new([0.0, -1.0, 1.0, 0.0, 0.0, width]),
    }
}
