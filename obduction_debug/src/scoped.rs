// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output with phase-scoped indentation.
//!
//! [`ScopedPrintSink`] implements [`TraceSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr).
//! Phase begin/end events open and close an indentation scope, so a frame
//! reads as a nested block. The depth counter lives behind a `Mutex` and can
//! be shared between sinks writing to the same destination.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use obduction_core::trace::{
    CommitEvent, DeviceCallEvent, LayerEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    RepaintEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write)
/// destination, indented by phase nesting.
pub struct ScopedPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    depth: Arc<Mutex<usize>>,
}

impl<W: Write> std::fmt::Debug for ScopedPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedPrintSink")
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl ScopedPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            depth: Arc::new(Mutex::new(0)),
        }
    }
}

impl<W: Write> ScopedPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            depth: Arc::new(Mutex::new(0)),
        }
    }

    /// The shared depth counter, for interleaving another sink's output at
    /// the same nesting level.
    #[must_use]
    pub fn depth_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.depth)
    }

    /// Creates a sink sharing an existing depth counter.
    #[must_use]
    pub fn sharing_depth(writer: W, depth: Arc<Mutex<usize>>) -> Self {
        Self { writer, depth }
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        let depth = *self.depth.lock().unwrap_or_else(PoisonError::into_inner);
        // One write per line, so line-oriented destinations see whole lines.
        let mut line = format!("{:pad$}{args}", "", pad = depth * 2);
        line.push('\n');
        let _ = self.writer.write_all(line.as_bytes());
    }

    fn enter(&mut self) {
        let mut depth = self.depth.lock().unwrap_or_else(PoisonError::into_inner);
        *depth += 1;
    }

    fn exit(&mut self) {
        let mut depth = self.depth.lock().unwrap_or_else(PoisonError::into_inner);
        *depth = depth.saturating_sub(1);
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Build => "build",
        PhaseKind::Diff => "diff",
        PhaseKind::Push => "push",
        PhaseKind::Flush => "flush",
    }
}

impl<W: Write> TraceSink for ScopedPrintSink<W> {
    fn on_repaint(&mut self, e: &RepaintEvent) {
        self.line(format_args!(
            "repaint frame={} device={} damage={:?}",
            e.frame_index, e.device.0, e.damage,
        ));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.line(format_args!("{} frame={} {{", phase_name(e.phase), e.frame_index));
        self.enter();
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
        self.exit();
        self.line(format_args!("}}"));
    }

    fn on_layer_event(&mut self, e: &LayerEvent) {
        match e.layer {
            Some(layer) => self.line(format_args!(
                "layer {:?} id={}",
                e.kind, layer.0,
            )),
            None => self.line(format_args!("layer {:?}", e.kind)),
        }
    }

    fn on_device_call(&mut self, e: &DeviceCallEvent) {
        match e.layer {
            Some(layer) => self.line(format_args!(
                "call {:?} layer={} status={}",
                e.call, layer.0, e.status,
            )),
            None => self.line(format_args!("call {:?} status={}", e.call, e.status)),
        }
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.line(format_args!(
            "commit frame={} fence={} status={}",
            e.frame_index, e.fence, e.status,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obduction_core::device::HwLayerId;
    use obduction_core::geometry::IRect;
    use obduction_core::output::DeviceId;
    use obduction_core::trace::{DeviceCall, LayerEventKind};
    use std::sync::mpsc::{Sender, channel};

    // A Write that forwards lines over a channel so the test can keep the
    // sink and inspect output at the same time.
    struct ChannelWriter(Sender<String>);

    impl Write for ChannelWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let _ = self.0.send(String::from_utf8_lossy(buf).into_owned());
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn sink_and_lines() -> (ScopedPrintSink<ChannelWriter>, std::sync::mpsc::Receiver<String>) {
        let (tx, rx) = channel();
        (ScopedPrintSink::with_writer(ChannelWriter(tx)), rx)
    }

    #[test]
    fn each_event_is_a_single_write() {
        let (mut sink, rx) = sink_and_lines();
        sink.on_commit(&CommitEvent {
            frame_index: 0,
            fence: false,
            status: 0,
        });
        let lines: Vec<String> = rx.try_iter().collect();
        assert_eq!(lines.len(), 1, "line-oriented writers get whole lines");
        assert_eq!(lines[0], "commit frame=0 fence=false status=0\n");
    }

    #[test]
    fn phases_nest_their_contents() {
        let (mut sink, rx) = sink_and_lines();
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Push,
        });
        sink.on_device_call(&DeviceCallEvent {
            call: DeviceCall::SetSize,
            layer: Some(HwLayerId(3)),
            status: 0,
        });
        sink.on_phase_end(&PhaseEndEvent {
            frame_index: 0,
            phase: PhaseKind::Push,
        });

        let lines: Vec<String> = rx.try_iter().collect();
        assert_eq!(lines[0], "push frame=0 {\n");
        assert_eq!(lines[1], "  call SetSize layer=3 status=0\n");
        assert_eq!(lines[2], "}\n");
    }

    #[test]
    fn depth_restores_after_phase_end() {
        let (mut sink, rx) = sink_and_lines();
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Build,
        });
        sink.on_phase_end(&PhaseEndEvent {
            frame_index: 0,
            phase: PhaseKind::Build,
        });
        sink.on_commit(&CommitEvent {
            frame_index: 0,
            fence: false,
            status: 0,
        });

        let lines: Vec<String> = rx.try_iter().collect();
        assert_eq!(lines[2], "commit frame=0 fence=false status=0\n");
    }

    #[test]
    fn unbalanced_end_does_not_underflow() {
        let (mut sink, rx) = sink_and_lines();
        sink.on_phase_end(&PhaseEndEvent {
            frame_index: 0,
            phase: PhaseKind::Diff,
        });
        sink.on_repaint(&RepaintEvent {
            frame_index: 0,
            device: DeviceId(0),
            damage: IRect::from_size(64, 64),
        });

        let lines: Vec<String> = rx.try_iter().collect();
        assert!(lines[1].starts_with("repaint frame=0"));
    }

    #[test]
    fn shared_depth_interleaves_two_sinks() {
        let (tx, rx) = channel();
        let mut first = ScopedPrintSink::with_writer(ChannelWriter(tx.clone()));
        let mut second = ScopedPrintSink::sharing_depth(ChannelWriter(tx), first.depth_counter());

        first.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Flush,
        });
        second.on_layer_event(&LayerEvent {
            frame_index: 0,
            kind: LayerEventKind::Closed,
            layer: Some(HwLayerId(2)),
        });

        let lines: Vec<String> = rx.try_iter().collect();
        assert_eq!(lines[1], "  layer Closed id=2\n");
    }
}
