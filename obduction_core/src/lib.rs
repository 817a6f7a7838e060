// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and geometry for hardware-overlay composition.
//!
//! `obduction_core` provides the foundational data structures for binding
//! content surfaces to fixed-function hardware overlay layers. It is `no_std`
//! compatible (with `alloc`) and owns everything that is independent of a
//! concrete display driver:
//!
//! **[`geometry`]** — Integer rectangles and the bounding-rectangle reduction
//! used when arbitrary regions are handed to hardware that only accepts
//! axis-aligned rects.
//!
//! **[`rotation`]** — Four-way rotation classification derived from the sign
//! pattern of an affine transform's 2×2 block.
//!
//! **[`output`]** — Display identity, mode enumeration, and the output
//! projection matrix (scale/rotation/zoom) with damage mapping.
//!
//! **[`view`]** — Per-instance view geometry and the placement computation
//! that turns output damage into destination/source layer rectangles.
//!
//! **[`buffer`]** — The normalized buffer handle, the reference-counted
//! committed buffer with its mapping slot, and the two import mechanisms.
//!
//! **[`device`]** — The [`OverlayDevice`](device::OverlayDevice) and
//! [`BufferAllocator`](device::BufferAllocator) traits that driver
//! integrations implement.
//!
//! **[`time`]** — Monotonic host time for timer backends and diagnostics.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod buffer;
pub mod device;
pub mod geometry;
pub mod output;
pub mod rotation;
pub mod time;
pub mod trace;
pub mod view;
