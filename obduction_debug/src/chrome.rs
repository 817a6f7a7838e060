// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads events recorded by a
//! [`RecorderSink`](super::recorder::RecorderSink) and writes
//! [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! The engine's events carry no timestamps, so each event's timestamp is its
//! sequence number in synthetic microseconds. Durations in the output are
//! event counts, not wall time; what the view shows faithfully is ordering
//! and nesting.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{Record, RecordedEvent};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Phase begin/end pairs become duration slices; everything else becomes an
/// instant.
pub fn export(records: &[Record], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for record in records {
        let ts = record.seq;
        match record.event {
            RecordedEvent::Repaint(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Repaint",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": e.device.0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "damage": format!("{:?}", e.damage),
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::Layer(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("Layer{:?}", e.kind),
                    "cat": "Layer",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "layer": e.layer.map(|l| l.0),
                    }
                }));
            }
            RecordedEvent::DeviceCall(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.call),
                    "cat": "Device",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "layer": e.layer.map(|l| l.0),
                        "status": e.status,
                    }
                }));
            }
            RecordedEvent::Commit(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Commit",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "fence": e.fence,
                        "status": e.status,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
