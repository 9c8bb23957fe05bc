// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only event log.

use gaffer_core::{EventId, EventMeta, EventRecord, StreamId};

/// The single ordered sequence of committed events.
///
/// Append is the only mutation; records are never rewritten, dropped,
/// reordered, or compacted. Ids are dense here, but callers may only rely
/// on them being strictly increasing.
pub(crate) struct EventLog {
    records: Vec<EventRecord>,
    next_id: u64,
}

impl EventLog {
    pub(crate) fn new() -> Self {
        Self { records: Vec::new(), next_id: 1 }
    }

    /// Append one record, assigning the next global id.
    pub(crate) fn append(
        &mut self,
        stream_id: StreamId,
        data: serde_json::Value,
        metadata: EventMeta,
        now_ms: u64,
    ) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.records.push(EventRecord { id, stream_id, data, metadata, created_at_ms: now_ms });
        id
    }

    /// Every committed record, in id order.
    pub(crate) fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Slice of one stream: records with ids greater than `since`.
    pub(crate) fn for_stream(
        &self,
        stream: &StreamId,
        since: EventId,
        limit: Option<usize>,
    ) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|e| &e.stream_id == stream && e.id > since)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Type-filtered scan across every stream, in id order.
    pub(crate) fn of_type(&self, kind: &str, limit: Option<usize>) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|e| e.kind() == kind)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}
