// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability surface hosts drive.
//!
//! [`RendererOps`] is what a display server calls: attach a buffer, repaint
//! an output, tear down a surface. [`OverlayRenderer`] implements it by
//! owning the device, the allocator, the compositor, and the frame pipeline
//! outright, so nothing downcasts or reaches back into host state.
//!
//! Some operations are deliberately inert: this renderer never touches
//! pixels, so damage flushing and pixel readback have nothing to do, and no
//! format list is advertised because buffers are accepted opportunistically
//! at attach time.

use alloc::boxed::Box;
use core::fmt;

use obduction_core::buffer::{BufferHandle, BufferImport, PixelFormat};
use obduction_core::device::{BufferAllocator, DeviceError, Fence, OverlayDevice, current_mode};
use obduction_core::geometry::IRect;
use obduction_core::output::{DeviceId, OutputMode, OutputProjection};
use obduction_core::trace::{TraceSink, Tracer};

use crate::binding::SurfaceId;
use crate::compose::FrameCompositor;
use crate::pipeline::{FrameError, FramebufferPool, OutputFramePipeline};
use crate::scene::{ContentKind, ContentView};

/// What the host can ask of a renderer.
pub trait RendererOps {
    /// Commits a buffer to a surface.
    fn attach(&mut self, surface: SurfaceId, kind: ContentKind, import: BufferImport);

    /// Repaints the output: composites the scene and commits the frame.
    ///
    /// `views` is the scene in draw order, top to bottom; `damage` is in
    /// global space. Returns the device's release fence, if any.
    fn repaint_output(
        &mut self,
        damage: IRect,
        views: &[ContentView],
    ) -> Result<Option<Fence>, FrameError>;

    /// Flushes pending surface damage. A no-op here: damage is consumed
    /// whole at repaint time.
    fn flush_damage(&mut self, surface: SurfaceId);

    /// Reads back composited pixels. A successful no-op here: the device
    /// owns the pixels and offers no readback path.
    fn read_pixels(&mut self, rect: IRect, dst: &mut [u8]);

    /// The formats this renderer advertises for import. Empty: buffers are
    /// accepted opportunistically.
    fn import_formats(&self) -> &[PixelFormat];

    /// The attached buffer's dimensions for a surface, if one is committed.
    fn surface_content_size(&self, surface: SurfaceId) -> Option<(i32, i32)>;

    /// Tears down a destroyed surface.
    fn surface_destroyed(&mut self, surface: SurfaceId);
}

/// The hardware-overlay renderer for one output.
pub struct OverlayRenderer<D: OverlayDevice, A: BufferAllocator> {
    device: D,
    allocator: A,
    compositor: FrameCompositor,
    pipeline: OutputFramePipeline,
    projection: OutputProjection,
    mode: OutputMode,
    trace: Option<Box<dyn TraceSink>>,
}

impl<D: OverlayDevice, A: BufferAllocator> fmt::Debug for OverlayRenderer<D, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayRenderer")
            .field("mode", &self.mode)
            .field("compositor", &self.compositor)
            .finish_non_exhaustive()
    }
}

impl<D: OverlayDevice, A: BufferAllocator> OverlayRenderer<D, A> {
    /// Builds a renderer for one device: resolves the active mode and
    /// allocates the framebuffer ring.
    pub fn new(mut device: D, mut allocator: A, device_id: DeviceId) -> Result<Self, DeviceError> {
        let mode = current_mode(&mut device, device_id)?;
        let pool = FramebufferPool::new(&mut allocator, &mode, &mut Tracer::none())?;
        Ok(Self {
            device,
            allocator,
            compositor: FrameCompositor::new(device_id),
            pipeline: OutputFramePipeline::new(device_id, pool),
            projection: OutputProjection::IDENTITY,
            mode,
            trace: None,
        })
    }

    /// Installs a trace sink for subsequent frames.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    /// Sets the output projection (scale, rotation, zoom).
    pub fn set_projection(&mut self, projection: OutputProjection) {
        self.projection = projection;
    }

    /// The resolved output mode.
    #[must_use]
    pub fn mode(&self) -> &OutputMode {
        &self.mode
    }

    /// The owned device, for host bookkeeping.
    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The owned allocator, for host bookkeeping.
    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Hands off the GPU-composited framebuffer as its own layer.
    pub fn set_gpu_buffer(&mut self, buffer: &BufferHandle) -> Result<(), DeviceError> {
        let mut tracer = tracer_for(&mut self.trace);
        self.compositor
            .set_gpu_buffer(&mut self.device, buffer, &mut tracer)
    }

    /// Tears down every binding, the GPU layer, and the framebuffer ring,
    /// returning the device and allocator to the host.
    pub fn release(self) -> (D, A) {
        let Self {
            mut device,
            mut allocator,
            mut compositor,
            pipeline,
            mut trace,
            ..
        } = self;
        let mut tracer = tracer_for(&mut trace);
        compositor.release(&mut device, &mut allocator, &mut tracer);
        pipeline.release(&mut allocator, &mut tracer);
        (device, allocator)
    }
}

impl<D: OverlayDevice, A: BufferAllocator> RendererOps for OverlayRenderer<D, A> {
    fn attach(&mut self, surface: SurfaceId, kind: ContentKind, import: BufferImport) {
        let mut tracer = tracer_for(&mut self.trace);
        self.compositor
            .attach(surface, kind, import, &mut self.allocator, &mut tracer);
    }

    fn repaint_output(
        &mut self,
        damage: IRect,
        views: &[ContentView],
    ) -> Result<Option<Fence>, FrameError> {
        let mut tracer = tracer_for(&mut self.trace);
        let frame = self.compositor.frame_index();
        let mut txn = self.pipeline.begin();
        self.pipeline.repaint(
            &mut txn,
            &mut self.compositor,
            &mut self.device,
            &mut self.allocator,
            &self.projection,
            &self.mode,
            damage,
            views,
            &mut tracer,
        );
        self.pipeline.flush(&mut self.device, txn, frame, &mut tracer)
    }

    fn flush_damage(&mut self, surface: SurfaceId) {
        _ = surface;
    }

    fn read_pixels(&mut self, rect: IRect, dst: &mut [u8]) {
        _ = (rect, dst);
    }

    fn import_formats(&self) -> &[PixelFormat] {
        &[]
    }

    fn surface_content_size(&self, surface: SurfaceId) -> Option<(i32, i32)> {
        let buffer = self.compositor.binding(surface)?.buffer()?;
        Some((buffer.handle.width, buffer.handle.height))
    }

    fn surface_destroyed(&mut self, surface: SurfaceId) {
        let mut tracer = tracer_for(&mut self.trace);
        self.compositor
            .surface_destroyed(surface, &mut self.device, &mut self.allocator, &mut tracer);
    }
}

fn tracer_for(trace: &mut Option<Box<dyn TraceSink>>) -> Tracer<'_> {
    match trace {
        Some(sink) => Tracer::new(sink.as_mut()),
        None => Tracer::none(),
    }
}
