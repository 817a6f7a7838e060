// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame compositor.
//!
//! [`FrameCompositor::repaint`] runs three phases per output refresh:
//!
//! 1. **Building** rebuilds the live layer set from this frame's views,
//!    bottom to top, creating or reusing each binding's hardware layer and
//!    computing its placement.
//! 2. **Diffing** closes the layer of every binding that was live last frame
//!    but is absent now. The binding object survives; a reappearing surface
//!    gets a fresh layer.
//! 3. **Committing** pushes every live layer's properties to the device in a
//!    fixed order. Property failures are traced and the frame continues.
//!
//! Stacking starts at zorder 2: the device background owns 0 and the
//! GPU-composited fallback layer owns 1.

use alloc::vec::Vec;
use core::mem;

use obduction_core::buffer::{BufferHandle, BufferImport};
use obduction_core::device::{
    BlendMode, BufferAllocator, CompositionKind, DeviceError, HwLayerId, LayerAlpha,
    LayerDescriptor, LayerPixelSpec, OverlayDevice,
};
use obduction_core::geometry::IRect;
use obduction_core::output::{DeviceId, OutputMode, OutputProjection};
use obduction_core::rotation::Rotation;
use obduction_core::trace::{
    DeviceCall, DeviceCallEvent, LayerEvent, LayerEventKind, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, RepaintEvent, Tracer,
};
use obduction_core::view::place;

use crate::binding::{BindingTable, SurfaceId};
use crate::mapping::map_if_needed;
use crate::scene::{ContentKind, ContentView};

/// Stacking position of the GPU-composited fallback layer.
pub const GPU_LAYER_ZORDER: u32 = 1;

/// First stacking position handed to surface layers.
const SURFACE_ZORDER_BASE: u32 = GPU_LAYER_ZORDER + 1;

/// Where the repaint state machine currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RepaintPhase {
    /// Between frames.
    #[default]
    Idle,
    /// Rebuilding the live layer set.
    Building,
    /// Closing layers that dropped out.
    Diffing,
    /// Pushing layer properties.
    Committing,
}

/// Per-output compositor state: the binding table, the live layer set, and
/// the GPU fallback layer.
#[derive(Debug)]
pub struct FrameCompositor {
    device_id: DeviceId,
    bindings: BindingTable,
    live: Vec<SurfaceId>,
    gpu_layer: Option<HwLayerId>,
    phase: RepaintPhase,
    frame_index: u64,
}

impl FrameCompositor {
    /// Creates a compositor for one device.
    #[must_use]
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            bindings: BindingTable::new(),
            live: Vec::new(),
            gpu_layer: None,
            phase: RepaintPhase::Idle,
            frame_index: 0,
        }
    }

    /// The current phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> RepaintPhase {
        self.phase
    }

    /// The number of completed frames.
    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The binding for a surface, if one exists.
    #[must_use]
    pub fn binding(&self, surface: SurfaceId) -> Option<&crate::binding::SurfaceBinding> {
        self.bindings.get(surface)
    }

    /// Surfaces composited in the most recent frame, bottom to top.
    #[must_use]
    pub fn live_surfaces(&self) -> &[SurfaceId] {
        &self.live
    }

    /// Commits a buffer to a surface, creating the binding on first attach.
    pub fn attach<A: BufferAllocator + ?Sized>(
        &mut self,
        surface: SurfaceId,
        kind: ContentKind,
        import: BufferImport,
        allocator: &mut A,
        tracer: &mut Tracer<'_>,
    ) {
        self.bindings.bind(surface, kind).attach(import, allocator, tracer);
    }

    /// Runs one frame. Returns whether any layer was composited.
    ///
    /// `views` is the scene in draw order, top to bottom. `damage` is this
    /// frame's damage in global space.
    ///
    /// # Panics
    ///
    /// Panics if called while a frame is already in flight.
    pub fn repaint<D, A>(
        &mut self,
        device: &mut D,
        allocator: &mut A,
        projection: &OutputProjection,
        mode: &OutputMode,
        damage: IRect,
        views: &[ContentView],
        tracer: &mut Tracer<'_>,
    ) -> bool
    where
        D: OverlayDevice + ?Sized,
        A: BufferAllocator + ?Sized,
    {
        assert!(
            self.phase == RepaintPhase::Idle,
            "repaint while a frame is in flight"
        );
        let frame = self.frame_index;
        tracer.repaint(&RepaintEvent {
            frame_index: frame,
            device: self.device_id,
            damage,
        });

        self.phase = RepaintPhase::Building;
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: frame,
            phase: PhaseKind::Build,
        });
        for binding in self.bindings.iter_mut() {
            binding.reset_failed();
        }
        let previous = mem::take(&mut self.live);
        let mut zorder = SURFACE_ZORDER_BASE;
        let mut bottom_assigned = false;
        for view in views.iter().rev() {
            let binding = self.bindings.bind(view.surface, view.kind);
            if binding
                .ensure_layer(device, allocator, self.device_id, mode, frame, tracer)
                .is_err()
            {
                // Skipped for this frame only.
                continue;
            }
            binding.placement = place(projection, &view.geometry, damage);
            binding.zorder = zorder;
            zorder += 1;
            binding.blend = if bottom_assigned {
                BlendMode::SourceOver
            } else {
                BlendMode::Opaque
            };
            bottom_assigned = true;
            self.live.push(view.surface);
        }
        tracer.phase_end(&PhaseEndEvent {
            frame_index: frame,
            phase: PhaseKind::Build,
        });

        self.phase = RepaintPhase::Diffing;
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: frame,
            phase: PhaseKind::Diff,
        });
        for surface in &previous {
            if !self.live.contains(surface) {
                if let Some(binding) = self.bindings.get_mut(*surface) {
                    binding.close(device, self.device_id, frame, tracer);
                }
            }
        }
        tracer.phase_end(&PhaseEndEvent {
            frame_index: frame,
            phase: PhaseKind::Diff,
        });

        self.phase = RepaintPhase::Committing;
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: frame,
            phase: PhaseKind::Push,
        });
        for i in 0..self.live.len() {
            let surface = self.live[i];
            let Some(binding) = self.bindings.get_mut(surface) else {
                continue;
            };
            let Some(layer) = binding.hw_layer() else {
                continue;
            };
            if binding.kind == ContentKind::Graphic {
                if let Some(buffer) = binding.buffer().cloned() {
                    if map_if_needed(allocator, &buffer, tracer).is_some() {
                        let r = device.set_layer_buffer(self.device_id, layer, &buffer.handle, None);
                        tracer.device_call(&DeviceCallEvent::new(
                            DeviceCall::SetBuffer,
                            Some(layer),
                            &r,
                        ));
                    }
                }
            }
            let placement = binding.placement;
            let zorder = binding.zorder;
            let blend = binding.blend;
            let composition = match binding.kind {
                ContentKind::Graphic => CompositionKind::Device,
                ContentKind::Video => CompositionKind::Video,
            };

            push(tracer, DeviceCall::SetAlpha, layer,
                device.set_layer_alpha(self.device_id, layer, LayerAlpha::OPAQUE));
            push(tracer, DeviceCall::SetSize, layer,
                device.set_layer_size(self.device_id, layer, placement.dst));
            push(tracer, DeviceCall::SetCrop, layer,
                device.set_layer_crop(self.device_id, layer, placement.src));
            push(tracer, DeviceCall::SetZorder, layer,
                device.set_layer_zorder(self.device_id, layer, zorder));
            push(tracer, DeviceCall::SetBlend, layer,
                device.set_layer_blend(self.device_id, layer, blend));
            push(tracer, DeviceCall::SetComposition, layer,
                device.set_layer_composition(self.device_id, layer, composition));
            push(tracer, DeviceCall::SetRotation, layer,
                device.set_layer_rotation(self.device_id, layer, placement.rotation));
        }
        tracer.phase_end(&PhaseEndEvent {
            frame_index: frame,
            phase: PhaseKind::Push,
        });

        self.phase = RepaintPhase::Idle;
        self.frame_index += 1;
        !self.live.is_empty()
    }

    /// Tears down a destroyed surface: at most one layer close, the mapping
    /// released, the binding removed. No later push can reference the layer.
    pub fn surface_destroyed<D, A>(
        &mut self,
        surface: SurfaceId,
        device: &mut D,
        allocator: &mut A,
        tracer: &mut Tracer<'_>,
    ) where
        D: OverlayDevice + ?Sized,
        A: BufferAllocator + ?Sized,
    {
        if let Some(mut binding) = self.bindings.remove(surface) {
            binding.release(device, allocator, self.device_id, self.frame_index, tracer);
        }
        self.live.retain(|s| *s != surface);
    }

    /// Hands off the GPU-composited framebuffer as its own layer.
    ///
    /// The previous GPU layer, if any, is closed first. The new layer is
    /// sized to the buffer and stacked at [`GPU_LAYER_ZORDER`] with opaque
    /// blending, below every surface layer.
    pub fn set_gpu_buffer<D: OverlayDevice + ?Sized>(
        &mut self,
        device: &mut D,
        buffer: &BufferHandle,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), DeviceError> {
        let frame = self.frame_index;
        if let Some(prev) = self.gpu_layer.take() {
            let r = device.close_layer(self.device_id, prev);
            tracer.device_call(&DeviceCallEvent::new(DeviceCall::CloseLayer, Some(prev), &r));
            tracer.layer_event(&LayerEvent {
                frame_index: frame,
                kind: LayerEventKind::Closed,
                layer: Some(prev),
            });
        }

        let desc = LayerDescriptor {
            width: buffer.width,
            height: buffer.height,
            pixel: Some(LayerPixelSpec {
                bpp: buffer.bits_per_pixel(),
                format: buffer.format,
            }),
        };
        let result = device.create_layer(self.device_id, &desc);
        tracer.device_call(&DeviceCallEvent::new(DeviceCall::CreateLayer, None, &result));
        let layer = result?;
        tracer.layer_event(&LayerEvent {
            frame_index: frame,
            kind: LayerEventKind::Created,
            layer: Some(layer),
        });

        let full = IRect::from_size(buffer.width, buffer.height);
        push(tracer, DeviceCall::SetBuffer, layer,
            device.set_layer_buffer(self.device_id, layer, buffer, None));
        push(tracer, DeviceCall::SetAlpha, layer,
            device.set_layer_alpha(self.device_id, layer, LayerAlpha::OPAQUE));
        push(tracer, DeviceCall::SetSize, layer,
            device.set_layer_size(self.device_id, layer, full));
        push(tracer, DeviceCall::SetCrop, layer,
            device.set_layer_crop(self.device_id, layer, full));
        push(tracer, DeviceCall::SetZorder, layer,
            device.set_layer_zorder(self.device_id, layer, GPU_LAYER_ZORDER));
        push(tracer, DeviceCall::SetBlend, layer,
            device.set_layer_blend(self.device_id, layer, BlendMode::Opaque));
        push(tracer, DeviceCall::SetComposition, layer,
            device.set_layer_composition(self.device_id, layer, CompositionKind::Device));
        push(tracer, DeviceCall::SetRotation, layer,
            device.set_layer_rotation(self.device_id, layer, Rotation::None));

        self.gpu_layer = Some(layer);
        Ok(())
    }

    /// Tears down every binding and the GPU layer.
    pub fn release<D, A>(&mut self, device: &mut D, allocator: &mut A, tracer: &mut Tracer<'_>)
    where
        D: OverlayDevice + ?Sized,
        A: BufferAllocator + ?Sized,
    {
        let frame = self.frame_index;
        for binding in self.bindings.iter_mut() {
            binding.release(device, allocator, self.device_id, frame, tracer);
        }
        self.bindings.clear();
        self.live.clear();
        if let Some(layer) = self.gpu_layer.take() {
            let r = device.close_layer(self.device_id, layer);
            tracer.device_call(&DeviceCallEvent::new(DeviceCall::CloseLayer, Some(layer), &r));
        }
    }
}

/// Traces one property push; the result itself is dropped, a failed push
/// never aborts the frame.
fn push<T>(
    tracer: &mut Tracer<'_>,
    call: DeviceCall,
    layer: HwLayerId,
    result: Result<T, DeviceError>,
) {
    tracer.device_call(&DeviceCallEvent::new(call, Some(layer), &result));
}
