// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffer handles, committed buffers, and the import mechanisms.
//!
//! Content arrives through one of two import paths (an externally allocated
//! driver buffer, or shared memory). Both normalize into a [`CommittedBuffer`]
//! at attach time; downstream code never consults the import mechanism again.
//! The committed buffer carries its CPU mapping slot, so mapping state travels
//! with the buffer rather than with whichever binding happens to use it.

use core::cell::Cell;
use core::fmt;

/// Pixel format of a buffer or layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit RGBA, 32 bits per pixel.
    Rgba8888,
    /// 8-bit BGRA, 32 bits per pixel.
    Bgra8888,
    /// 8-bit RGBX (alpha ignored), 32 bits per pixel.
    Rgbx8888,
    /// 5-6-5 RGB, 16 bits per pixel.
    Rgb565,
}

impl PixelFormat {
    /// Nominal bits per pixel for this format.
    #[inline]
    #[must_use]
    pub const fn bits_per_pixel(self) -> i32 {
        match self {
            Self::Rgba8888 | Self::Bgra8888 | Self::Rgbx8888 => 32,
            Self::Rgb565 => 16,
        }
    }
}

/// An opaque CPU mapping of a hardware buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapAddr(pub usize);

impl fmt::Debug for MapAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapAddr({:#x})", self.0)
    }
}

/// The normalized description of a hardware buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    /// Driver-assigned buffer id.
    pub id: u64,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Row stride in bytes.
    pub stride: i32,
    /// Pixel format.
    pub format: PixelFormat,
}

impl BufferHandle {
    /// Effective bits per pixel derived from the stride.
    ///
    /// `stride * 8 / width` reflects any row padding the allocator applied;
    /// a zero-width handle reports zero.
    #[inline]
    #[must_use]
    pub const fn bits_per_pixel(&self) -> i32 {
        if self.width <= 0 {
            0
        } else {
            self.stride * 8 / self.width
        }
    }
}

/// A buffer committed to a surface, with its CPU mapping slot.
///
/// Shared as `Rc<CommittedBuffer>`: the binding holds a strong reference for
/// as long as the hardware may scan the buffer out, which keeps the handle
/// alive without any manual reference counting.
#[derive(Debug)]
pub struct CommittedBuffer {
    /// The normalized handle.
    pub handle: BufferHandle,
    mapping: Cell<Option<MapAddr>>,
}

impl CommittedBuffer {
    /// Wraps a handle with an empty mapping slot.
    #[must_use]
    pub const fn new(handle: BufferHandle) -> Self {
        Self {
            handle,
            mapping: Cell::new(None),
        }
    }

    /// The current CPU mapping, if any.
    #[inline]
    #[must_use]
    pub fn mapping(&self) -> Option<MapAddr> {
        self.mapping.get()
    }

    /// Stores a CPU mapping.
    #[inline]
    pub fn set_mapping(&self, addr: MapAddr) {
        self.mapping.set(Some(addr));
    }

    /// Clears and returns the CPU mapping.
    #[inline]
    pub fn take_mapping(&self) -> Option<MapAddr> {
        self.mapping.take()
    }
}

/// How a buffer arrives at attach time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferImport {
    /// An externally allocated driver buffer, handed over as-is.
    External {
        /// The driver's handle.
        handle: BufferHandle,
    },
    /// A shared-memory pool slice described by its layout.
    SharedMemory {
        /// Pool-assigned id.
        id: u64,
        /// Width in pixels.
        width: i32,
        /// Height in pixels.
        height: i32,
        /// Row stride in bytes.
        stride: i32,
        /// Pixel format.
        format: PixelFormat,
    },
}

impl BufferImport {
    /// Normalizes the import into a committed buffer.
    ///
    /// Width and height are fixed here; nothing downstream distinguishes the
    /// two mechanisms afterward.
    #[must_use]
    pub const fn into_committed(self) -> CommittedBuffer {
        let handle = match self {
            Self::External { handle } => handle,
            Self::SharedMemory {
                id,
                width,
                height,
                stride,
                format,
            } => BufferHandle {
                id,
                width,
                height,
                stride,
                format,
            },
        };
        CommittedBuffer::new(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> BufferHandle {
        BufferHandle {
            id: 7,
            width: 1920,
            height: 1080,
            stride: 7680,
            format: PixelFormat::Bgra8888,
        }
    }

    #[test]
    fn bits_per_pixel_from_stride() {
        assert_eq!(handle().bits_per_pixel(), 32);
        let padded = BufferHandle {
            stride: 8192,
            ..handle()
        };
        assert_eq!(padded.bits_per_pixel(), 34, "padding shows in the ratio");
    }

    #[test]
    fn bits_per_pixel_zero_width() {
        let h = BufferHandle {
            width: 0,
            ..handle()
        };
        assert_eq!(h.bits_per_pixel(), 0);
    }

    #[test]
    fn external_import_keeps_handle() {
        let committed = BufferImport::External { handle: handle() }.into_committed();
        assert_eq!(committed.handle, handle());
        assert_eq!(committed.mapping(), None);
    }

    #[test]
    fn shared_memory_import_normalizes() {
        let committed = BufferImport::SharedMemory {
            id: 3,
            width: 640,
            height: 480,
            stride: 2560,
            format: PixelFormat::Rgba8888,
        }
        .into_committed();
        assert_eq!(committed.handle.id, 3);
        assert_eq!(committed.handle.width, 640);
        assert_eq!(committed.handle.bits_per_pixel(), 32);
    }

    #[test]
    fn mapping_slot_set_and_take() {
        let committed = CommittedBuffer::new(handle());
        assert_eq!(committed.mapping(), None);
        committed.set_mapping(MapAddr(0x1000));
        assert_eq!(committed.mapping(), Some(MapAddr(0x1000)));
        assert_eq!(committed.take_mapping(), Some(MapAddr(0x1000)));
        assert_eq!(committed.take_mapping(), None, "take clears the slot");
    }
}
