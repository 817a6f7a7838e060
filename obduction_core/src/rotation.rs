// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Four-way rotation classification.
//!
//! Fixed-function overlay hardware exposes rotation as one of four transform
//! modes without an independent mirror axis. The classifier reduces an
//! arbitrary affine transform to that vocabulary by inspecting the sign
//! pattern of its 2×2 linear block: mirrored variants collapse into the
//! unmirrored bucket.

use kurbo::Affine;

/// Rotation mode accepted by an overlay layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// No rotation (includes horizontally/vertically mirrored content).
    #[default]
    None,
    /// 90° rotation (includes mirrored 90°).
    Rotate90,
    /// 180° rotation (includes mirrored 180°).
    Rotate180,
    /// 270° rotation (includes mirrored 270°).
    Rotate270,
}

impl Rotation {
    /// Classifies an affine transform into one of the four rotation buckets.
    ///
    /// The transform is expected to map output space to buffer space. With
    /// [`Affine::as_coeffs`] ordering `[a, b, c, d, _, _]` (`x' = a·x + c·y`,
    /// `y' = b·x + d·y`):
    ///
    /// - When both diagonal terms are zero the transform is in the 90° family;
    ///   the sign of `b` picks 90 vs 270, while the sign of `c` only separates
    ///   mirrored variants, which collapse.
    /// - Otherwise the sign of `d` picks 0 vs 180, with the mirrored variants
    ///   collapsing the same way.
    ///
    /// A degenerate (all-zero) block classifies as [`Rotation::None`]. The
    /// function is pure and idempotent: it reads only the matrix.
    #[must_use]
    pub fn classify(transform: Affine) -> Self {
        let [a, b, c, d, _, _] = transform.as_coeffs();
        if a == 0.0 && d == 0.0 {
            if b > 0.0 && c != 0.0 {
                Self::Rotate90
            } else if b < 0.0 && c != 0.0 {
                Self::Rotate270
            } else {
                Self::None
            }
        } else if d < 0.0 && a != 0.0 {
            Self::Rotate180
        } else {
            Self::None
        }
    }
}
