// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed in-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and stores every event in
//! arrival order, stamped with a sequence number. The engine's events are
//! clock-free, so the sequence number is the only ordering a recording
//! carries; exporters synthesize timestamps from it.

use obduction_core::trace::{
    CommitEvent, DeviceCallEvent, LayerEvent, PhaseBeginEvent, PhaseEndEvent, RepaintEvent,
    TraceSink,
};

/// Any event the repaint loop emits.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// Start of a repaint.
    Repaint(RepaintEvent),
    /// Start of a repaint phase.
    PhaseBegin(PhaseBeginEvent),
    /// End of a repaint phase.
    PhaseEnd(PhaseEndEvent),
    /// A layer lifecycle transition.
    Layer(LayerEvent),
    /// A driver call and its status.
    DeviceCall(DeviceCallEvent),
    /// The commit concluding a frame.
    Commit(CommitEvent),
}

/// One recorded event with its arrival order.
#[derive(Clone, Copy, Debug)]
pub struct Record {
    /// Zero-based arrival order within the recording.
    pub seq: u64,
    /// The event itself.
    pub event: RecordedEvent,
}

/// A [`TraceSink`] that stores typed events in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    records: Vec<Record>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded events.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// The number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Discards all recorded events and resets the sequence counter.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn push(&mut self, event: RecordedEvent) {
        let seq = self.records.len() as u64;
        self.records.push(Record { seq, event });
    }
}

impl TraceSink for RecorderSink {
    fn on_repaint(&mut self, e: &RepaintEvent) {
        self.push(RecordedEvent::Repaint(*e));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.push(RecordedEvent::PhaseBegin(*e));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.push(RecordedEvent::PhaseEnd(*e));
    }

    fn on_layer_event(&mut self, e: &LayerEvent) {
        self.push(RecordedEvent::Layer(*e));
    }

    fn on_device_call(&mut self, e: &DeviceCallEvent) {
        self.push(RecordedEvent::DeviceCall(*e));
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.push(RecordedEvent::Commit(*e));
    }
}
