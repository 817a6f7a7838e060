// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU mapping lifecycle for committed buffers.
//!
//! The mapping slot lives on the [`CommittedBuffer`] itself, so these
//! functions are idempotent no matter how many bindings or frames touch the
//! buffer: a buffer is mapped at most once and unmapped at most once.

use obduction_core::buffer::{CommittedBuffer, MapAddr};
use obduction_core::device::BufferAllocator;
use obduction_core::trace::{DeviceCall, DeviceCallEvent, Tracer};

/// Maps the buffer for CPU access unless it already is.
///
/// Returns the mapping, or `None` when the allocator declined; the caller
/// skips the instance for this frame and retries on the next one.
pub fn map_if_needed<A: BufferAllocator + ?Sized>(
    allocator: &mut A,
    buffer: &CommittedBuffer,
    tracer: &mut Tracer<'_>,
) -> Option<MapAddr> {
    if let Some(addr) = buffer.mapping() {
        return Some(addr);
    }
    let mapped = allocator.map(&buffer.handle);
    tracer.device_call(&DeviceCallEvent {
        call: DeviceCall::Map,
        layer: None,
        status: if mapped.is_some() { 0 } else { -1 },
    });
    if let Some(addr) = mapped {
        buffer.set_mapping(addr);
    }
    mapped
}

/// Releases the buffer's CPU mapping. No-op when unmapped.
pub fn unmap_now<A: BufferAllocator + ?Sized>(
    allocator: &mut A,
    buffer: &CommittedBuffer,
    tracer: &mut Tracer<'_>,
) {
    if let Some(addr) = buffer.take_mapping() {
        allocator.unmap(&buffer.handle, addr);
        tracer.device_call(&DeviceCallEvent {
            call: DeviceCall::Unmap,
            layer: None,
            status: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeAllocator, test_handle};

    #[test]
    fn map_is_idempotent() {
        let mut allocator = FakeAllocator::new();
        let buffer = CommittedBuffer::new(test_handle(1));
        let mut tracer = Tracer::none();

        let first = map_if_needed(&mut allocator, &buffer, &mut tracer);
        let second = map_if_needed(&mut allocator, &buffer, &mut tracer);
        assert!(first.is_some(), "allocator should map");
        assert_eq!(first, second);
        assert_eq!(allocator.map_calls, 1, "one allocator call for two maps");
    }

    #[test]
    fn declined_map_leaves_slot_empty() {
        let mut allocator = FakeAllocator::new();
        allocator.fail_map = true;
        let buffer = CommittedBuffer::new(test_handle(1));
        let mut tracer = Tracer::none();

        assert_eq!(map_if_needed(&mut allocator, &buffer, &mut tracer), None);
        assert_eq!(buffer.mapping(), None);

        // A later retry succeeds once the allocator recovers.
        allocator.fail_map = false;
        assert!(map_if_needed(&mut allocator, &buffer, &mut tracer).is_some());
        assert_eq!(allocator.map_calls, 2);
    }

    #[test]
    fn unmap_releases_exactly_once() {
        let mut allocator = FakeAllocator::new();
        let buffer = CommittedBuffer::new(test_handle(1));
        let mut tracer = Tracer::none();

        map_if_needed(&mut allocator, &buffer, &mut tracer);
        unmap_now(&mut allocator, &buffer, &mut tracer);
        unmap_now(&mut allocator, &buffer, &mut tracer);
        assert_eq!(allocator.unmap_calls, 1, "second unmap is a no-op");
        assert_eq!(buffer.mapping(), None);
    }

    #[test]
    fn unmap_without_map_is_noop() {
        let mut allocator = FakeAllocator::new();
        let buffer = CommittedBuffer::new(test_handle(1));
        let mut tracer = Tracer::none();

        unmap_now(&mut allocator, &buffer, &mut tracer);
        assert_eq!(allocator.unmap_calls, 0);
    }
}
