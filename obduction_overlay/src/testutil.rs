// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording fakes shared by the crate's tests.

use alloc::vec;
use alloc::vec::Vec;

use obduction_core::buffer::{BufferHandle, BufferImport, MapAddr, PixelFormat};
use obduction_core::device::{
    AllocSpec, BlendMode, BufferAllocator, CompositionKind, DeviceError, Fence, HwLayerId,
    LayerAlpha, LayerDescriptor, OverlayDevice,
};
use obduction_core::geometry::IRect;
use obduction_core::output::{DeviceId, OutputMode};
use obduction_core::rotation::Rotation;

pub(crate) fn test_mode() -> OutputMode {
    OutputMode {
        id: 0,
        width: 1920,
        height: 1080,
        refresh_mhz: 60_000,
    }
}

pub(crate) fn test_handle(id: u64) -> BufferHandle {
    BufferHandle {
        id,
        width: 1920,
        height: 1080,
        stride: 7680,
        format: PixelFormat::Bgra8888,
    }
}

pub(crate) fn test_import(id: u64) -> BufferImport {
    BufferImport::External {
        handle: test_handle(id),
    }
}

/// One recorded driver call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    CreateLayer { desc: LayerDescriptor },
    CloseLayer(HwLayerId),
    SetBuffer(HwLayerId, u64),
    SetAlpha(HwLayerId),
    SetSize(HwLayerId, IRect),
    SetCrop(HwLayerId, IRect),
    SetZorder(HwLayerId, u32),
    SetBlend(HwLayerId, BlendMode),
    SetComposition(HwLayerId, CompositionKind),
    SetRotation(HwLayerId, Rotation),
    Prepare,
    SetClientBuffer(u64),
    Commit,
}

/// An [`OverlayDevice`] that records every call and enforces a layer budget.
#[derive(Debug)]
pub(crate) struct FakeDevice {
    /// How many layers may be open at once.
    pub(crate) capacity: usize,
    /// Currently open layers.
    pub(crate) open: Vec<HwLayerId>,
    /// Every call, in order.
    pub(crate) calls: Vec<Call>,
    /// What `prepare_display_layers` reports.
    pub(crate) needs_client: bool,
    pub(crate) prepare_fails: bool,
    pub(crate) commit_fails: bool,
    /// The release fence `commit` returns.
    pub(crate) fence: Option<Fence>,
    pub(crate) modes: Vec<OutputMode>,
    pub(crate) active_mode: u32,
    next_layer: u32,
}

impl FakeDevice {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            open: Vec::new(),
            calls: Vec::new(),
            needs_client: true,
            prepare_fails: false,
            commit_fails: false,
            fence: None,
            modes: vec![test_mode()],
            active_mode: 0,
            next_layer: 1,
        }
    }

    pub(crate) fn calls_for(&self, layer: HwLayerId) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::CloseLayer(l)
                        | Call::SetBuffer(l, _)
                        | Call::SetAlpha(l)
                        | Call::SetSize(l, _)
                        | Call::SetCrop(l, _)
                        | Call::SetZorder(l, _)
                        | Call::SetBlend(l, _)
                        | Call::SetComposition(l, _)
                        | Call::SetRotation(l, _)
                    if *l == layer
                )
            })
            .copied()
            .collect()
    }

    fn check(&self, layer: HwLayerId) -> Result<(), DeviceError> {
        if self.open.contains(&layer) {
            Ok(())
        } else {
            Err(DeviceError::BadLayer)
        }
    }
}

impl OverlayDevice for FakeDevice {
    fn create_layer(
        &mut self,
        _device: DeviceId,
        desc: &LayerDescriptor,
    ) -> Result<HwLayerId, DeviceError> {
        self.calls.push(Call::CreateLayer { desc: *desc });
        if self.open.len() >= self.capacity {
            return Err(DeviceError::Exhausted);
        }
        let id = HwLayerId(self.next_layer);
        self.next_layer += 1;
        self.open.push(id);
        Ok(id)
    }

    fn close_layer(&mut self, _device: DeviceId, layer: HwLayerId) -> Result<(), DeviceError> {
        self.check(layer)?;
        self.open.retain(|l| *l != layer);
        self.calls.push(Call::CloseLayer(layer));
        Ok(())
    }

    fn set_layer_buffer(
        &mut self,
        _device: DeviceId,
        layer: HwLayerId,
        buffer: &BufferHandle,
        _acquire: Option<Fence>,
    ) -> Result<(), DeviceError> {
        self.check(layer)?;
        self.calls.push(Call::SetBuffer(layer, buffer.id));
        Ok(())
    }

    fn set_layer_alpha(
        &mut self,
        _device: DeviceId,
        layer: HwLayerId,
        _alpha: LayerAlpha,
    ) -> Result<(), DeviceError> {
        self.check(layer)?;
        self.calls.push(Call::SetAlpha(layer));
        Ok(())
    }

    fn set_layer_size(
        &mut self,
        _device: DeviceId,
        layer: HwLayerId,
        dst: IRect,
    ) -> Result<(), DeviceError> {
        self.check(layer)?;
        self.calls.push(Call::SetSize(layer, dst));
        Ok(())
    }

    fn set_layer_crop(
        &mut self,
        _device: DeviceId,
        layer: HwLayerId,
        src: IRect,
    ) -> Result<(), DeviceError> {
        self.check(layer)?;
        self.calls.push(Call::SetCrop(layer, src));
        Ok(())
    }

    fn set_layer_zorder(
        &mut self,
        _device: DeviceId,
        layer: HwLayerId,
        zorder: u32,
    ) -> Result<(), DeviceError> {
        self.check(layer)?;
        self.calls.push(Call::SetZorder(layer, zorder));
        Ok(())
    }

    fn set_layer_blend(
        &mut self,
        _device: DeviceId,
        layer: HwLayerId,
        blend: BlendMode,
    ) -> Result<(), DeviceError> {
        self.check(layer)?;
        self.calls.push(Call::SetBlend(layer, blend));
        Ok(())
    }

    fn set_layer_composition(
        &mut self,
        _device: DeviceId,
        layer: HwLayerId,
        kind: CompositionKind,
    ) -> Result<(), DeviceError> {
        self.check(layer)?;
        self.calls.push(Call::SetComposition(layer, kind));
        Ok(())
    }

    fn set_layer_rotation(
        &mut self,
        _device: DeviceId,
        layer: HwLayerId,
        rotation: Rotation,
    ) -> Result<(), DeviceError> {
        self.check(layer)?;
        self.calls.push(Call::SetRotation(layer, rotation));
        Ok(())
    }

    fn prepare_display_layers(&mut self, _device: DeviceId) -> Result<bool, DeviceError> {
        self.calls.push(Call::Prepare);
        if self.prepare_fails {
            return Err(DeviceError::Failed(-10));
        }
        Ok(self.needs_client)
    }

    fn set_client_buffer(
        &mut self,
        _device: DeviceId,
        buffer: &BufferHandle,
        _acquire: Option<Fence>,
    ) -> Result<(), DeviceError> {
        self.calls.push(Call::SetClientBuffer(buffer.id));
        Ok(())
    }

    fn commit(&mut self, _device: DeviceId) -> Result<Option<Fence>, DeviceError> {
        self.calls.push(Call::Commit);
        if self.commit_fails {
            return Err(DeviceError::Failed(-20));
        }
        Ok(self.fence)
    }

    fn supported_modes(&mut self, _device: DeviceId) -> Result<Vec<OutputMode>, DeviceError> {
        Ok(self.modes.clone())
    }

    fn active_mode_id(&mut self, _device: DeviceId) -> Result<u32, DeviceError> {
        Ok(self.active_mode)
    }
}

/// A [`BufferAllocator`] that counts maps and unmaps.
#[derive(Debug, Default)]
pub(crate) struct FakeAllocator {
    pub(crate) map_calls: usize,
    pub(crate) unmap_calls: usize,
    pub(crate) allocations: Vec<BufferHandle>,
    pub(crate) freed: Vec<u64>,
    pub(crate) fail_map: bool,
    next_id: u64,
}

impl FakeAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 100,
            ..Self::default()
        }
    }
}

impl BufferAllocator for FakeAllocator {
    fn allocate(&mut self, spec: &AllocSpec) -> Result<BufferHandle, DeviceError> {
        let handle = BufferHandle {
            id: self.next_id,
            width: spec.width,
            height: spec.height,
            stride: spec.width * spec.format.bits_per_pixel() / 8,
            format: spec.format,
        };
        self.next_id += 1;
        self.allocations.push(handle);
        Ok(handle)
    }

    fn map(&mut self, buffer: &BufferHandle) -> Option<MapAddr> {
        self.map_calls += 1;
        if self.fail_map {
            return None;
        }
        let id = usize::try_from(buffer.id).unwrap();
        Some(MapAddr(0x1000 + id * 0x100))
    }

    fn unmap(&mut self, _buffer: &BufferHandle, _addr: MapAddr) {
        self.unmap_calls += 1;
    }

    fn free(&mut self, buffer: BufferHandle) {
        self.freed.push(buffer.id);
    }
}
