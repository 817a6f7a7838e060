// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The output frame pipeline.
//!
//! [`FramebufferPool`] is a fixed two-slot ring of scanout buffers for the
//! client-composited fallback path; the frame being displayed and the frame
//! being built never share a buffer. [`RepaintTransaction`] brackets one
//! repaint cycle: created by [`OutputFramePipeline::begin`], it is consumed
//! by value in [`OutputFramePipeline::flush`], so a transaction cannot leak
//! into a later frame.

use core::fmt;

use obduction_core::buffer::{BufferHandle, CommittedBuffer, PixelFormat};
use obduction_core::device::{
    AllocSpec, AllocUsage, BufferAllocator, DeviceError, Fence, OverlayDevice,
};
use obduction_core::geometry::IRect;
use obduction_core::output::{DeviceId, OutputMode, OutputProjection};
use obduction_core::trace::{
    CommitEvent, DeviceCall, DeviceCallEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer,
};

use crate::compose::FrameCompositor;
use crate::mapping::{map_if_needed, unmap_now};
use crate::scene::ContentView;

/// Size of the framebuffer ring.
pub const FRAMEBUFFER_COUNT: usize = 2;

/// A failed frame. Subsequent frames are unaffected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// The device rejected the pending layer set.
    Prepare(DeviceError),
    /// The commit (or the client buffer hand-off before it) failed.
    Commit(DeviceError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare(e) => write!(f, "prepare rejected layer set: {e}"),
            Self::Commit(e) => write!(f, "commit failed: {e}"),
        }
    }
}

impl core::error::Error for FrameError {}

/// The fixed ring of client-composition framebuffers.
///
/// Both slots are allocated (and CPU-mapped where the allocator permits) up
/// front; [`FramebufferPool::advance`] alternates between them with period
/// two.
#[derive(Debug)]
pub struct FramebufferPool {
    buffers: [CommittedBuffer; FRAMEBUFFER_COUNT],
    index: usize,
}

impl FramebufferPool {
    /// Allocates and maps both slots, sized to the mode.
    pub fn new<A: BufferAllocator + ?Sized>(
        allocator: &mut A,
        mode: &OutputMode,
        tracer: &mut Tracer<'_>,
    ) -> Result<Self, DeviceError> {
        let spec = AllocSpec {
            width: mode.width,
            height: mode.height,
            format: PixelFormat::Bgra8888,
            usage: AllocUsage {
                dma: true,
                cpu_read: true,
                cpu_write: true,
            },
        };
        let mut slot = |allocator: &mut A, tracer: &mut Tracer<'_>| {
            let buffer = CommittedBuffer::new(allocator.allocate(&spec)?);
            // An unmappable slot is still scannable; CPU access just fails
            // until a later map succeeds.
            let _ = map_if_needed(allocator, &buffer, tracer);
            Ok(buffer)
        };
        Ok(Self {
            buffers: [slot(allocator, tracer)?, slot(allocator, tracer)?],
            index: 0,
        })
    }

    /// Steps to the next slot and returns it.
    pub fn advance(&mut self) -> &CommittedBuffer {
        self.index = (self.index + 1) % FRAMEBUFFER_COUNT;
        &self.buffers[self.index]
    }

    /// The slot the last [`advance`](Self::advance) selected.
    #[must_use]
    pub fn current(&self) -> &CommittedBuffer {
        &self.buffers[self.index]
    }

    /// Unmaps and frees both slots, each exactly once.
    pub fn release<A: BufferAllocator + ?Sized>(self, allocator: &mut A, tracer: &mut Tracer<'_>) {
        for buffer in self.buffers {
            unmap_now(allocator, &buffer, tracer);
            allocator.free(buffer.handle);
        }
    }
}

/// One repaint cycle's device state.
///
/// Holds the framebuffer the cycle will hand to the device, once the
/// compositor decides one is needed. Consumed by value in
/// [`OutputFramePipeline::flush`].
#[derive(Debug)]
pub struct RepaintTransaction {
    device: DeviceId,
    framebuffer: Option<BufferHandle>,
}

impl RepaintTransaction {
    /// The framebuffer this cycle will scan out, if any.
    #[must_use]
    pub fn framebuffer(&self) -> Option<&BufferHandle> {
        self.framebuffer.as_ref()
    }
}

/// Drives the repaint cycle for one output: advance the ring, run the
/// compositor, flush through prepare / client buffer / commit.
#[derive(Debug)]
pub struct OutputFramePipeline {
    device_id: DeviceId,
    pool: FramebufferPool,
}

impl OutputFramePipeline {
    /// Creates the pipeline around an allocated pool.
    #[must_use]
    pub fn new(device_id: DeviceId, pool: FramebufferPool) -> Self {
        Self { device_id, pool }
    }

    /// Opens a transaction for one repaint cycle.
    #[must_use]
    pub fn begin(&self) -> RepaintTransaction {
        RepaintTransaction {
            device: self.device_id,
            framebuffer: None,
        }
    }

    /// Runs the compositor for this cycle.
    ///
    /// The ring advances once per cycle. When the compositor composited
    /// anything, the cycle's framebuffer is recorded in the transaction for
    /// [`flush`](Self::flush) to hand to the device.
    pub fn repaint<D, A>(
        &mut self,
        txn: &mut RepaintTransaction,
        compositor: &mut FrameCompositor,
        device: &mut D,
        allocator: &mut A,
        projection: &OutputProjection,
        mode: &OutputMode,
        damage: IRect,
        views: &[ContentView],
        tracer: &mut Tracer<'_>,
    ) where
        D: OverlayDevice + ?Sized,
        A: BufferAllocator + ?Sized,
    {
        let framebuffer = self.pool.advance().handle;
        let composited =
            compositor.repaint(device, allocator, projection, mode, damage, views, tracer);
        if composited {
            txn.framebuffer = Some(framebuffer);
        }
    }

    /// Flushes the cycle to the device.
    ///
    /// A transaction without a framebuffer is a valid nothing-changed frame
    /// and returns `Ok(None)` without touching the device. Otherwise:
    /// validate the layer set, hand over the client buffer if the device
    /// asks for one, and commit. Returns the release fence, if any.
    pub fn flush<D: OverlayDevice + ?Sized>(
        &mut self,
        device: &mut D,
        txn: RepaintTransaction,
        frame_index: u64,
        tracer: &mut Tracer<'_>,
    ) -> Result<Option<Fence>, FrameError> {
        let Some(framebuffer) = txn.framebuffer else {
            return Ok(None);
        };
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Flush,
        });
        let result = flush_steps(device, txn.device, &framebuffer, tracer);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Flush,
        });
        match &result {
            Ok(fence) => tracer.commit(&CommitEvent {
                frame_index,
                fence: fence.is_some(),
                status: 0,
            }),
            Err(FrameError::Prepare(e) | FrameError::Commit(e)) => tracer.commit(&CommitEvent {
                frame_index,
                fence: false,
                status: e.status(),
            }),
        }
        result
    }

    /// Tears down the framebuffer ring.
    pub fn release<A: BufferAllocator + ?Sized>(
        self,
        allocator: &mut A,
        tracer: &mut Tracer<'_>,
    ) {
        self.pool.release(allocator, tracer);
    }
}

/// Prepare, optional client buffer hand-off, commit. Each call traced.
fn flush_steps<D: OverlayDevice + ?Sized>(
    device: &mut D,
    id: DeviceId,
    framebuffer: &BufferHandle,
    tracer: &mut Tracer<'_>,
) -> Result<Option<Fence>, FrameError> {
    let prepared = device.prepare_display_layers(id);
    tracer.device_call(&DeviceCallEvent::new(
        DeviceCall::PrepareDisplayLayers,
        None,
        &prepared,
    ));
    let needs_client = prepared.map_err(FrameError::Prepare)?;

    if needs_client {
        let handed = device.set_client_buffer(id, framebuffer, None);
        tracer.device_call(&DeviceCallEvent::new(
            DeviceCall::SetClientBuffer,
            None,
            &handed,
        ));
        handed.map_err(FrameError::Commit)?;
    }

    let committed = device.commit(id);
    tracer.device_call(&DeviceCallEvent::new(DeviceCall::Commit, None, &committed));
    committed.map_err(FrameError::Commit)
}
