// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The one-shot frame-completion timer.

use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use obduction_core::output::OutputMode;
use rustix::time::{
    Itimerspec, TimerfdClockId, TimerfdFlags, TimerfdTimerFlags, Timespec, timerfd_create,
    timerfd_settime,
};

/// Interval used when a mode reports no refresh rate (treated as 60 Hz).
const FALLBACK_INTERVAL_MS: u64 = 16;

/// The frame interval for a mode, in milliseconds.
///
/// Derived from the mode's millihertz refresh rate, clamped to at least one
/// millisecond so fast modes still get a timer.
#[must_use]
pub fn frame_interval_ms(mode: &OutputMode) -> u64 {
    if mode.refresh_mhz == 0 {
        return FALLBACK_INTERVAL_MS;
    }
    (1_000_000 / u64::from(mode.refresh_mhz)).max(1)
}

/// A one-shot `timerfd` emulating frame completion.
///
/// Armed after each commit with the active mode's frame interval; when the
/// host's event loop sees the fd readable, the frame is done and the next
/// commit re-arms the timer.
#[derive(Debug)]
pub struct FinishFrameTimer {
    fd: OwnedFd,
}

impl FinishFrameTimer {
    /// Creates the timer, non-blocking and close-on-exec, on the monotonic
    /// clock.
    pub fn new() -> rustix::io::Result<Self> {
        let fd = timerfd_create(
            TimerfdClockId::Monotonic,
            TimerfdFlags::NONBLOCK | TimerfdFlags::CLOEXEC,
        )?;
        Ok(Self { fd })
    }

    /// Arms the timer once for the mode's frame interval.
    pub fn arm(&self, mode: &OutputMode) -> rustix::io::Result<()> {
        self.arm_ms(frame_interval_ms(mode))
    }

    /// Arms the timer once for an explicit interval in milliseconds.
    pub fn arm_ms(&self, interval_ms: u64) -> rustix::io::Result<()> {
        self.settime(interval_ms)
    }

    /// Cancels a pending expiration.
    pub fn disarm(&self) -> rustix::io::Result<()> {
        self.settime(0)
    }

    fn settime(&self, interval_ms: u64) -> rustix::io::Result<()> {
        let value = Timespec {
            tv_sec: i64::try_from(interval_ms / 1000).unwrap_or(i64::MAX),
            tv_nsec: i64::try_from((interval_ms % 1000) * 1_000_000).unwrap_or(0),
        };
        let spec = Itimerspec {
            // Zero interval keeps the timer one-shot.
            it_interval: Timespec {
                tv_sec: 0,
                tv_nsec: 0,
            },
            it_value: value,
        };
        timerfd_settime(&self.fd, TimerfdTimerFlags::empty(), &spec)?;
        Ok(())
    }

    /// The fd to register with the event loop.
    #[must_use]
    pub fn fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }

    /// Drains the timer, returning how many expirations occurred since the
    /// last read. Zero when the timer has not fired.
    pub fn read_expirations(&self) -> rustix::io::Result<u64> {
        let mut buf = [0_u8; 8];
        match rustix::io::read(&self.fd, &mut buf) {
            Ok(8) => Ok(u64::from_ne_bytes(buf)),
            Ok(_) => Ok(0),
            Err(rustix::io::Errno::AGAIN) => Ok(0),
            Err(e) => Err(e),
        }
    }
}
