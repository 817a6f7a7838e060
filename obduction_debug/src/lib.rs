// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, scoped printing, and Chrome trace export for obduction
//! diagnostics.
//!
//! This crate provides [`TraceSink`](obduction_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`scoped::ScopedPrintSink`] — human-readable output with one line per
//!   event, indented by repaint phase nesting.
//! - [`recorder::RecorderSink`] — in-memory typed event recording with
//!   sequence numbers.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from
//!   recorded events.

pub mod chrome;
pub mod recorder;
pub mod scoped;
