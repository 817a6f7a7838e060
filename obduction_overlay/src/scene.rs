// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame scene input from the host.

use obduction_core::view::ViewGeometry;

use crate::binding::SurfaceId;

/// What kind of content a surface carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Ordinary pixel content, composited by the device.
    Graphic,
    /// Video passthrough; pixels travel out of band.
    Video,
}

/// One content instance in this frame's scene.
///
/// The host hands the repaint call a slice of these in draw order, top to
/// bottom. The compositor iterates it bottom to top when assigning stacking
/// order.
#[derive(Clone, Copy, Debug)]
pub struct ContentView {
    /// Which surface this instance shows.
    pub surface: SurfaceId,
    /// Content kind.
    pub kind: ContentKind,
    /// This frame's geometry.
    pub geometry: ViewGeometry,
}
