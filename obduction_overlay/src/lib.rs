// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hardware-overlay composition engine.
//!
//! Each output refresh, the engine binds content instances to fixed-function
//! overlay layers, derives every layer's geometry from affine transforms,
//! tracks CPU mappings of hardware buffers, and commits the layer set through
//! a double-buffered frame pipeline.
//!
//! **[`binding`]** — Per-surface hardware-layer bindings with lazy layer
//! creation, reuse, and failure retry.
//!
//! **[`mapping`]** — Idempotent map / unmap-exactly-once around the buffer
//! allocator.
//!
//! **[`scene`]** — The host's per-frame input: content views in draw order.
//!
//! **[`compose`]** — The per-frame compositor: rebuild the live layer set,
//! diff-close dropped layers, push layer properties in fixed order.
//!
//! **[`pipeline`]** — The two-slot framebuffer ring and the repaint
//! transaction that brackets prepare / client buffer / commit.
//!
//! **[`renderer`]** — The capability surface hosts call, and
//! [`OverlayRenderer`](renderer::OverlayRenderer) wiring a device and
//! allocator to the engine.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables repaint-loop trace events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod binding;
pub mod compose;
pub mod mapping;
pub mod pipeline;
pub mod renderer;
pub mod scene;

#[cfg(test)]
mod testutil;
