// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contracts the display driver integration implements.
//!
//! [`OverlayDevice`] is the per-device layer control surface (create/close,
//! property setters, prepare/commit). [`BufferAllocator`] is the hardware
//! buffer allocator with CPU mapping. Both are consumed by the engine, never
//! implemented by it; the overlay crate's tests provide recording fakes.
//!
//! Driver calls report status through [`DeviceError`]. Per-frame policy is the
//! caller's: a failed property push is traced and the frame continues, while
//! create/prepare/commit failures skip or surface the frame.

use alloc::vec::Vec;
use core::fmt;

use crate::buffer::{BufferHandle, MapAddr, PixelFormat};
use crate::geometry::IRect;
use crate::output::{DeviceId, OutputMode};
use crate::rotation::Rotation;

/// Identifies one hardware overlay layer on a device.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HwLayerId(pub u32);

impl fmt::Debug for HwLayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HwLayerId({})", self.0)
    }
}

/// A sync fence handed back by the driver (release fence on commit).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fence(pub i32);

/// Per-layer global alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerAlpha {
    /// Whether global alpha is applied.
    pub enabled: bool,
    /// Alpha value, 0 transparent to 255 opaque.
    pub alpha: u8,
}

impl LayerAlpha {
    /// Fully opaque, global alpha disabled.
    pub const OPAQUE: Self = Self {
        enabled: false,
        alpha: 255,
    };
}

/// How a layer blends with the layers below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source replaces destination.
    Opaque,
    /// Source over destination (premultiplied).
    SourceOver,
}

/// What kind of composition the layer carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositionKind {
    /// Ordinary device-composited content.
    Device,
    /// Video passthrough; the sideband path owns the pixels.
    Video,
}

/// Pixel layout of a layer's content, absent for video passthrough.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerPixelSpec {
    /// Effective bits per pixel.
    pub bpp: i32,
    /// Pixel format.
    pub format: PixelFormat,
}

/// What [`OverlayDevice::create_layer`] needs to size a new layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Layer width in pixels (the active mode's width).
    pub width: i32,
    /// Layer height in pixels (the active mode's height).
    pub height: i32,
    /// Content pixel layout; `None` for video passthrough layers.
    pub pixel: Option<LayerPixelSpec>,
}

/// Error reported by a driver call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceError {
    /// No free overlay layer is available right now.
    Exhausted,
    /// The layer id is unknown to the device.
    BadLayer,
    /// A parameter was rejected.
    BadParam,
    /// The device enumerated no display modes.
    NoModes,
    /// Any other driver status code.
    Failed(i32),
}

impl DeviceError {
    /// The raw status code, for trace events.
    #[must_use]
    pub const fn status(self) -> i32 {
        match self {
            Self::Exhausted => -1,
            Self::BadLayer => -2,
            Self::BadParam => -3,
            Self::NoModes => -4,
            Self::Failed(code) => code,
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("no free overlay layer"),
            Self::BadLayer => f.write_str("unknown layer id"),
            Self::BadParam => f.write_str("parameter rejected"),
            Self::NoModes => f.write_str("device enumerated no modes"),
            Self::Failed(code) => write!(f, "driver call failed ({code})"),
        }
    }
}

impl core::error::Error for DeviceError {}

/// The per-device overlay layer control surface.
pub trait OverlayDevice {
    /// Creates a new overlay layer sized by the descriptor.
    fn create_layer(
        &mut self,
        device: DeviceId,
        desc: &LayerDescriptor,
    ) -> Result<HwLayerId, DeviceError>;

    /// Closes a layer. The id must not be used afterwards.
    fn close_layer(&mut self, device: DeviceId, layer: HwLayerId) -> Result<(), DeviceError>;

    /// Assigns the buffer the layer scans out, with an optional acquire fence.
    fn set_layer_buffer(
        &mut self,
        device: DeviceId,
        layer: HwLayerId,
        buffer: &BufferHandle,
        acquire: Option<Fence>,
    ) -> Result<(), DeviceError>;

    /// Sets the layer's global alpha.
    fn set_layer_alpha(
        &mut self,
        device: DeviceId,
        layer: HwLayerId,
        alpha: LayerAlpha,
    ) -> Result<(), DeviceError>;

    /// Sets the destination rectangle in output space.
    fn set_layer_size(
        &mut self,
        device: DeviceId,
        layer: HwLayerId,
        dst: IRect,
    ) -> Result<(), DeviceError>;

    /// Sets the source crop rectangle in buffer space.
    fn set_layer_crop(
        &mut self,
        device: DeviceId,
        layer: HwLayerId,
        src: IRect,
    ) -> Result<(), DeviceError>;

    /// Sets the stacking order. Higher values stack above lower ones.
    fn set_layer_zorder(
        &mut self,
        device: DeviceId,
        layer: HwLayerId,
        zorder: u32,
    ) -> Result<(), DeviceError>;

    /// Sets the blend mode.
    fn set_layer_blend(
        &mut self,
        device: DeviceId,
        layer: HwLayerId,
        blend: BlendMode,
    ) -> Result<(), DeviceError>;

    /// Sets the composition kind.
    fn set_layer_composition(
        &mut self,
        device: DeviceId,
        layer: HwLayerId,
        kind: CompositionKind,
    ) -> Result<(), DeviceError>;

    /// Sets the rotation mode.
    fn set_layer_rotation(
        &mut self,
        device: DeviceId,
        layer: HwLayerId,
        rotation: Rotation,
    ) -> Result<(), DeviceError>;

    /// Validates the pending layer set. Returns `true` when the device needs
    /// a client-composited fallback buffer for this frame.
    fn prepare_display_layers(&mut self, device: DeviceId) -> Result<bool, DeviceError>;

    /// Assigns the client-composited fallback buffer for this frame.
    fn set_client_buffer(
        &mut self,
        device: DeviceId,
        buffer: &BufferHandle,
        acquire: Option<Fence>,
    ) -> Result<(), DeviceError>;

    /// Atomically applies the pending layer set. Returns the release fence,
    /// if the driver produced one.
    fn commit(&mut self, device: DeviceId) -> Result<Option<Fence>, DeviceError>;

    /// Enumerates the modes the device supports.
    fn supported_modes(&mut self, device: DeviceId) -> Result<Vec<OutputMode>, DeviceError>;

    /// The id of the currently active mode.
    fn active_mode_id(&mut self, device: DeviceId) -> Result<u32, DeviceError>;
}

/// Buffer usage flags for [`AllocSpec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct AllocUsage {
    /// Scanout-capable (DMA) memory.
    pub dma: bool,
    /// CPU read access.
    pub cpu_read: bool,
    /// CPU write access.
    pub cpu_write: bool,
}

/// What [`BufferAllocator::allocate`] needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocSpec {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Pixel format.
    pub format: PixelFormat,
    /// Usage flags.
    pub usage: AllocUsage,
}

/// Hardware buffer allocation and CPU mapping.
pub trait BufferAllocator {
    /// Allocates a buffer. The returned handle's stride reflects any row
    /// padding the allocator applied.
    fn allocate(&mut self, spec: &AllocSpec) -> Result<BufferHandle, DeviceError>;

    /// Maps a buffer for CPU access. `None` means the buffer cannot be
    /// mapped right now; callers treat that as a skip, not an error.
    fn map(&mut self, buffer: &BufferHandle) -> Option<MapAddr>;

    /// Releases a CPU mapping.
    fn unmap(&mut self, buffer: &BufferHandle, addr: MapAddr);

    /// Frees a buffer.
    fn free(&mut self, buffer: BufferHandle);
}

/// Resolves the device's current mode.
///
/// Selects the enumerated mode matching the active id, falling back to the
/// first enumerated mode when the active id is unknown. Errors with
/// [`DeviceError::NoModes`] when the device enumerates nothing.
pub fn current_mode<D: OverlayDevice + ?Sized>(
    device: &mut D,
    id: DeviceId,
) -> Result<OutputMode, DeviceError> {
    let modes = device.supported_modes(id)?;
    let active = device.active_mode_id(id)?;
    if let Some(mode) = modes.iter().find(|m| m.id == active) {
        return Ok(*mode);
    }
    modes.first().copied().ok_or(DeviceError::NoModes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Implements only mode enumeration; everything else is unreachable.
    struct ModesOnly {
        modes: Vec<OutputMode>,
        active: u32,
    }

    impl OverlayDevice for ModesOnly {
        fn create_layer(
            &mut self,
            _: DeviceId,
            _: &LayerDescriptor,
        ) -> Result<HwLayerId, DeviceError> {
            unreachable!()
        }
        fn close_layer(&mut self, _: DeviceId, _: HwLayerId) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn set_layer_buffer(
            &mut self,
            _: DeviceId,
            _: HwLayerId,
            _: &BufferHandle,
            _: Option<Fence>,
        ) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn set_layer_alpha(
            &mut self,
            _: DeviceId,
            _: HwLayerId,
            _: LayerAlpha,
        ) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn set_layer_size(
            &mut self,
            _: DeviceId,
            _: HwLayerId,
            _: IRect,
        ) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn set_layer_crop(
            &mut self,
            _: DeviceId,
            _: HwLayerId,
            _: IRect,
        ) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn set_layer_zorder(
            &mut self,
            _: DeviceId,
            _: HwLayerId,
            _: u32,
        ) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn set_layer_blend(
            &mut self,
            _: DeviceId,
            _: HwLayerId,
            _: BlendMode,
        ) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn set_layer_composition(
            &mut self,
            _: DeviceId,
            _: HwLayerId,
            _: CompositionKind,
        ) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn set_layer_rotation(
            &mut self,
            _: DeviceId,
            _: HwLayerId,
            _: Rotation,
        ) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn prepare_display_layers(&mut self, _: DeviceId) -> Result<bool, DeviceError> {
            unreachable!()
        }
        fn set_client_buffer(
            &mut self,
            _: DeviceId,
            _: &BufferHandle,
            _: Option<Fence>,
        ) -> Result<(), DeviceError> {
            unreachable!()
        }
        fn commit(&mut self, _: DeviceId) -> Result<Option<Fence>, DeviceError> {
            unreachable!()
        }
        fn supported_modes(&mut self, _: DeviceId) -> Result<Vec<OutputMode>, DeviceError> {
            Ok(self.modes.clone())
        }
        fn active_mode_id(&mut self, _: DeviceId) -> Result<u32, DeviceError> {
            Ok(self.active)
        }
    }

    fn mode(id: u32, width: i32) -> OutputMode {
        OutputMode {
            id,
            width,
            height: 1080,
            refresh_mhz: 60_000,
        }
    }

    #[test]
    fn current_mode_selects_active() {
        let mut dev = ModesOnly {
            modes: vec![mode(0, 1280), mode(1, 1920)],
            active: 1,
        };
        assert_eq!(current_mode(&mut dev, DeviceId(0)), Ok(mode(1, 1920)));
    }

    #[test]
    fn current_mode_falls_back_to_first() {
        let mut dev = ModesOnly {
            modes: vec![mode(0, 1280), mode(1, 1920)],
            active: 9,
        };
        assert_eq!(current_mode(&mut dev, DeviceId(0)), Ok(mode(0, 1280)));
    }

    #[test]
    fn current_mode_errors_without_modes() {
        let mut dev = ModesOnly {
            modes: vec![],
            active: 0,
        };
        assert_eq!(
            current_mode(&mut dev, DeviceId(0)),
            Err(DeviceError::NoModes)
        );
    }

    #[test]
    fn device_error_status_codes() {
        assert_eq!(DeviceError::Failed(-22).status(), -22);
        assert_ne!(DeviceError::Exhausted.status(), 0);
    }
}
