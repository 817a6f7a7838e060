// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the repaint loop.
//!
//! [`TraceSink`] has one method per event with default no-op bodies, so a
//! sink implements only the events it cares about. [`Tracer`] wraps an
//! optional `&mut dyn TraceSink`: with the `trace` feature off every method
//! compiles to nothing, with it on each method costs one `Option` branch.
//!
//! The engine is clock-free, so events carry frame indices rather than
//! timestamps; sinks that want ordering or timing stamp events themselves.

use crate::device::HwLayerId;
use crate::geometry::IRect;
use crate::output::DeviceId;

/// Which stage of a repaint is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Rebuilding the live layer set from this frame's views.
    Build,
    /// Closing layers that dropped out of the live set.
    Diff,
    /// Pushing layer properties to the device.
    Push,
    /// Prepare, client buffer hand-off, and commit.
    Flush,
}

/// Emitted once at the start of each repaint.
#[derive(Clone, Copy, Debug)]
pub struct RepaintEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// The device being repainted.
    pub device: DeviceId,
    /// This frame's damage in global space.
    pub damage: IRect,
}

/// Marks the start of a repaint phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a repaint phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// What happened to a hardware layer binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerEventKind {
    /// A new layer was created.
    Created,
    /// Layer creation failed; the instance is skipped this frame.
    CreateFailed,
    /// The layer was closed.
    Closed,
    /// An existing layer was reused without a driver call.
    Reused,
}

/// Emitted on every layer lifecycle transition.
#[derive(Clone, Copy, Debug)]
pub struct LayerEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// What happened.
    pub kind: LayerEventKind,
    /// The layer involved, absent when creation failed.
    pub layer: Option<HwLayerId>,
}

/// Which driver entry point was called.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceCall {
    /// `create_layer`.
    CreateLayer,
    /// `close_layer`.
    CloseLayer,
    /// `set_layer_buffer`.
    SetBuffer,
    /// `set_layer_alpha`.
    SetAlpha,
    /// `set_layer_size`.
    SetSize,
    /// `set_layer_crop`.
    SetCrop,
    /// `set_layer_zorder`.
    SetZorder,
    /// `set_layer_blend`.
    SetBlend,
    /// `set_layer_composition`.
    SetComposition,
    /// `set_layer_rotation`.
    SetRotation,
    /// `prepare_display_layers`.
    PrepareDisplayLayers,
    /// `set_client_buffer`.
    SetClientBuffer,
    /// `commit`.
    Commit,
    /// Allocator `map`.
    Map,
    /// Allocator `unmap`.
    Unmap,
}

/// Emitted after each driver call with its status (0 is success).
#[derive(Clone, Copy, Debug)]
pub struct DeviceCallEvent {
    /// Which entry point was called.
    pub call: DeviceCall,
    /// The layer it targeted, if any.
    pub layer: Option<HwLayerId>,
    /// Driver status code; 0 is success.
    pub status: i32,
}

impl DeviceCallEvent {
    /// Builds an event from a call's `Result` status.
    #[must_use]
    pub fn new<T>(
        call: DeviceCall,
        layer: Option<HwLayerId>,
        result: &Result<T, crate::device::DeviceError>,
    ) -> Self {
        Self {
            call,
            layer,
            status: match result {
                Ok(_) => 0,
                Err(e) => e.status(),
            },
        }
    }
}

/// Emitted after the commit concludes a frame.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Whether the driver returned a release fence.
    pub fence: bool,
    /// Commit status; 0 is success.
    pub status: i32,
}

/// Receives trace events from the repaint loop.
///
/// All methods default to no-ops.
pub trait TraceSink {
    /// Called once at the start of each repaint.
    fn on_repaint(&mut self, e: &RepaintEvent) {
        _ = e;
    }

    /// Called at the start of a repaint phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a repaint phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called on each layer lifecycle transition.
    fn on_layer_event(&mut self, e: &LayerEvent) {
        _ = e;
    }

    /// Called after each driver call.
    fn on_device_call(&mut self, e: &DeviceCallEvent) {
        _ = e;
    }

    /// Called when the commit concludes a frame.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// Thin wrapper around an optional [`TraceSink`].
///
/// With the `trace` feature off, every method compiles to nothing. With it
/// on, each method checks the inner `Option` before dispatching.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`RepaintEvent`].
    #[inline]
    pub fn repaint(&mut self, e: &RepaintEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_repaint(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayerEvent`].
    #[inline]
    pub fn layer_event(&mut self, e: &LayerEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_layer_event(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DeviceCallEvent`].
    #[inline]
    pub fn device_call(&mut self, e: &DeviceCallEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_device_call(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceError;

    fn sample_repaint() -> RepaintEvent {
        RepaintEvent {
            frame_index: 3,
            device: DeviceId(0),
            damage: IRect::from_size(1920, 1080),
        }
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        sink.on_repaint(&sample_repaint());
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 3,
            phase: PhaseKind::Build,
        });
        sink.on_commit(&CommitEvent {
            frame_index: 3,
            fence: false,
            status: 0,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.repaint(&sample_repaint());
        tracer.device_call(&DeviceCallEvent {
            call: DeviceCall::Commit,
            layer: None,
            status: 0,
        });
    }

    #[test]
    fn device_call_event_status_from_result() {
        let ok: Result<(), DeviceError> = Ok(());
        assert_eq!(DeviceCallEvent::new(DeviceCall::SetSize, None, &ok).status, 0);
        let err: Result<(), DeviceError> = Err(DeviceError::Failed(-5));
        assert_eq!(
            DeviceCallEvent::new(DeviceCall::SetSize, None, &err).status,
            -5
        );
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_repaint(&mut self, e: &RepaintEvent) {
                self.frames.push(e.frame_index);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.repaint(&sample_repaint());
        drop(tracer);
        assert_eq!(sink.frames, &[3]);
    }
}
