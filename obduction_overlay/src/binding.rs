// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-surface hardware-layer bindings.
//!
//! A [`SurfaceBinding`] ties one content surface to at most one hardware
//! overlay layer. The layer is created lazily on the first frame the surface
//! is composited, reused for as long as it stays in the live set, and closed
//! when the surface drops out or is destroyed. A failed creation marks the
//! binding for this frame only; the next frame retries from scratch.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use core::fmt;

use obduction_core::buffer::{BufferImport, CommittedBuffer};
use obduction_core::device::{
    BlendMode, BufferAllocator, DeviceError, HwLayerId, LayerDescriptor, LayerPixelSpec,
    OverlayDevice,
};
use obduction_core::output::{DeviceId, OutputMode};
use obduction_core::trace::{DeviceCall, DeviceCallEvent, LayerEvent, LayerEventKind, Tracer};
use obduction_core::view::LayerPlacement;

use crate::mapping::{map_if_needed, unmap_now};
use crate::scene::ContentKind;

/// Engine-side identity of a content surface.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u64);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// Hardware-layer state of a binding.
///
/// A layer id exists only inside [`LayerState::Created`], so no code path can
/// address a layer that was never created or already failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LayerState {
    /// No layer; the next composited frame creates one.
    #[default]
    Uncreated,
    /// A live layer the device knows about.
    Created(HwLayerId),
    /// Creation failed this frame; reset to `Uncreated` next frame.
    FailedThisFrame,
}

/// The binding between one surface and its hardware layer.
#[derive(Debug)]
pub struct SurfaceBinding {
    /// Which surface this binds.
    pub surface: SurfaceId,
    /// Content kind, refreshed from the scene each frame.
    pub kind: ContentKind,
    /// This frame's placement.
    pub placement: LayerPlacement,
    /// This frame's stacking order.
    pub zorder: u32,
    /// This frame's blend mode.
    pub blend: BlendMode,
    layer: LayerState,
    buffer: Option<Rc<CommittedBuffer>>,
}

impl SurfaceBinding {
    fn new(surface: SurfaceId, kind: ContentKind) -> Self {
        Self {
            surface,
            kind,
            placement: LayerPlacement::EMPTY,
            zorder: 0,
            blend: BlendMode::SourceOver,
            layer: LayerState::Uncreated,
            buffer: None,
        }
    }

    /// The current layer state.
    #[inline]
    #[must_use]
    pub fn layer_state(&self) -> LayerState {
        self.layer
    }

    /// The live layer id, if one exists.
    #[inline]
    #[must_use]
    pub fn hw_layer(&self) -> Option<HwLayerId> {
        match self.layer {
            LayerState::Created(id) => Some(id),
            LayerState::Uncreated | LayerState::FailedThisFrame => None,
        }
    }

    /// The committed buffer, if one is attached.
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> Option<&Rc<CommittedBuffer>> {
        self.buffer.as_ref()
    }

    /// Commits a new buffer to this binding.
    ///
    /// The previous buffer's CPU mapping is released exactly once before the
    /// new buffer takes its place.
    pub fn attach<A: BufferAllocator + ?Sized>(
        &mut self,
        import: BufferImport,
        allocator: &mut A,
        tracer: &mut Tracer<'_>,
    ) {
        if let Some(old) = self.buffer.take() {
            unmap_now(allocator, &old, tracer);
        }
        self.buffer = Some(Rc::new(import.into_committed()));
    }

    /// Clears a previous frame's creation failure so this frame retries.
    pub fn reset_failed(&mut self) {
        if self.layer == LayerState::FailedThisFrame {
            self.layer = LayerState::Uncreated;
        }
    }

    /// Returns the binding's layer, creating one if needed.
    ///
    /// An existing layer is reused without a driver call. Creation sizes the
    /// layer to the active mode; graphic content additionally needs a mapped
    /// buffer to derive the pixel layout, and an unmapped or missing buffer
    /// skips the instance for this frame without marking the binding failed.
    /// A rejected `create_layer` marks the binding [`LayerState::FailedThisFrame`].
    pub fn ensure_layer<D, A>(
        &mut self,
        device: &mut D,
        allocator: &mut A,
        device_id: DeviceId,
        mode: &OutputMode,
        frame_index: u64,
        tracer: &mut Tracer<'_>,
    ) -> Result<HwLayerId, DeviceError>
    where
        D: OverlayDevice + ?Sized,
        A: BufferAllocator + ?Sized,
    {
        if let LayerState::Created(id) = self.layer {
            tracer.layer_event(&LayerEvent {
                frame_index,
                kind: LayerEventKind::Reused,
                layer: Some(id),
            });
            return Ok(id);
        }

        let pixel = match self.kind {
            ContentKind::Video => None,
            ContentKind::Graphic => {
                let Some(buffer) = self.buffer.as_ref() else {
                    return Err(DeviceError::BadParam);
                };
                if map_if_needed(allocator, buffer, tracer).is_none() {
                    return Err(DeviceError::BadParam);
                }
                Some(LayerPixelSpec {
                    bpp: buffer.handle.bits_per_pixel(),
                    format: buffer.handle.format,
                })
            }
        };
        let desc = LayerDescriptor {
            width: mode.width,
            height: mode.height,
            pixel,
        };

        let result = device.create_layer(device_id, &desc);
        tracer.device_call(&DeviceCallEvent::new(DeviceCall::CreateLayer, None, &result));
        match result {
            Ok(id) => {
                self.layer = LayerState::Created(id);
                tracer.layer_event(&LayerEvent {
                    frame_index,
                    kind: LayerEventKind::Created,
                    layer: Some(id),
                });
                Ok(id)
            }
            Err(e) => {
                self.layer = LayerState::FailedThisFrame;
                tracer.layer_event(&LayerEvent {
                    frame_index,
                    kind: LayerEventKind::CreateFailed,
                    layer: None,
                });
                Err(e)
            }
        }
    }

    /// Closes the binding's layer if one exists. Reappearance creates a
    /// fresh layer.
    pub fn close<D: OverlayDevice + ?Sized>(
        &mut self,
        device: &mut D,
        device_id: DeviceId,
        frame_index: u64,
        tracer: &mut Tracer<'_>,
    ) {
        if let LayerState::Created(id) = self.layer {
            let result = device.close_layer(device_id, id);
            tracer.device_call(&DeviceCallEvent::new(DeviceCall::CloseLayer, Some(id), &result));
            tracer.layer_event(&LayerEvent {
                frame_index,
                kind: LayerEventKind::Closed,
                layer: Some(id),
            });
            self.layer = LayerState::Uncreated;
        }
    }

    /// Full teardown: close the layer, release the mapping, drop the buffer.
    pub fn release<D, A>(
        &mut self,
        device: &mut D,
        allocator: &mut A,
        device_id: DeviceId,
        frame_index: u64,
        tracer: &mut Tracer<'_>,
    ) where
        D: OverlayDevice + ?Sized,
        A: BufferAllocator + ?Sized,
    {
        self.close(device, device_id, frame_index, tracer);
        if let Some(buffer) = self.buffer.take() {
            unmap_now(allocator, &buffer, tracer);
        }
    }
}

/// All bindings for one output, keyed by surface.
#[derive(Debug, Default)]
pub struct BindingTable {
    map: BTreeMap<SurfaceId, SurfaceBinding>,
}

impl BindingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the binding for a surface, creating it on first use.
    ///
    /// Idempotent: an existing binding is returned untouched apart from its
    /// content kind, which follows the caller.
    pub fn bind(&mut self, surface: SurfaceId, kind: ContentKind) -> &mut SurfaceBinding {
        let binding = self
            .map
            .entry(surface)
            .or_insert_with(|| SurfaceBinding::new(surface, kind));
        binding.kind = kind;
        binding
    }

    /// Looks up a binding.
    #[must_use]
    pub fn get(&self, surface: SurfaceId) -> Option<&SurfaceBinding> {
        self.map.get(&surface)
    }

    /// Looks up a binding mutably.
    pub fn get_mut(&mut self, surface: SurfaceId) -> Option<&mut SurfaceBinding> {
        self.map.get_mut(&surface)
    }

    /// Removes and returns a binding.
    pub fn remove(&mut self, surface: SurfaceId) -> Option<SurfaceBinding> {
        self.map.remove(&surface)
    }

    /// Drops every binding.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Iterates all bindings mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SurfaceBinding> {
        self.map.values_mut()
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
