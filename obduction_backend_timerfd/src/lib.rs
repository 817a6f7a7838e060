// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linux frame-completion timing for obduction.
//!
//! Fixed-function display drivers often commit without telling anyone when
//! the frame actually hit glass. This backend emulates frame completion with
//! a one-shot `timerfd` armed to the active mode's refresh interval after
//! each commit, plus monotonic [`HostTime`](obduction_core::time::HostTime)
//! reads for trace sinks and schedulers.
//!
//! The timer's file descriptor is meant to be registered with the host's
//! event loop; when it fires, finish the frame and re-arm on the next
//! commit.

mod time;
mod timer;

pub use time::{now, timebase};
pub use timer::{FinishFrameTimer, frame_interval_ms};
