// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store: snapshot reads, atomic transactions, the event log, and
//! commit-bound notification publishing.

use crate::event_log::EventLog;
use crate::notify::{Channel, Notification};
use crate::tables::Tables;
use gaffer_core::{CoreError, EventBody, EventId, EventMeta, EventRecord, StreamId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

const NOTIFY_CAPACITY: usize = 1024;

struct Inner {
    tables: Tables,
    log: EventLog,
}

/// Handle to the store. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<Inner>>,
    notify_tx: broadcast::Sender<Notification>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let (notify_tx, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tables: Tables::default(),
                log: EventLog::new(),
            })),
            notify_tx,
        }
    }

    /// Consistent snapshot read.
    pub fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        f(&self.inner.lock().tables)
    }

    /// Run `f` atomically against a scratch copy of the tables.
    ///
    /// On `Ok` the scratch replaces the live tables, buffered events get ids
    /// from the global sequence and are appended, and buffered notifications
    /// are published (after the lock is released). On `Err` every pending
    /// change is discarded. Holding the lock for the whole closure makes
    /// transactions — including task status transitions — linearizable.
    pub fn transact<T>(
        &self,
        now_ms: u64,
        f: impl FnOnce(&mut Txn<'_>) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut notifications = Vec::new();
        let result = {
            let mut inner = self.inner.lock();
            let Inner { tables, log } = &mut *inner;
            let mut scratch = tables.clone();
            let mut txn = Txn {
                tables: &mut scratch,
                committed: log.records(),
                now_ms,
                pending_events: Vec::new(),
                pending_notifies: Vec::new(),
            };
            let out = f(&mut txn)?;
            let Txn { pending_events, pending_notifies, .. } = txn;
            for pending in pending_events {
                log.append(pending.stream_id, pending.data, pending.metadata, now_ms);
            }
            *tables = scratch;
            notifications = pending_notifies;
            out
        };
        for notification in notifications {
            tracing::trace!(channel = %notification.channel, payload = %notification.payload, "notify");
            // A send error only means nobody is subscribed.
            let _ = self.notify_tx.send(notification);
        }
        Ok(result)
    }

    /// Subscribe to commit-bound notifications.
    ///
    /// The channel is lossy under lag; consumers must re-scan state to
    /// recover (the dispatcher's fallback poll does).
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    // ── Event log reads ──────────────────────────────────────────────────

    /// Slice of one stream: records with id greater than `since`, in id order.
    pub fn events_for_stream(
        &self,
        stream: &StreamId,
        since: EventId,
        limit: Option<usize>,
    ) -> Vec<EventRecord> {
        self.inner.lock().log.for_stream(stream, since, limit)
    }

    /// Type-filtered scan across every stream, in id order.
    pub fn events_of_type(&self, kind: &str, limit: Option<usize>) -> Vec<EventRecord> {
        self.inner.lock().log.of_type(kind, limit)
    }

    /// The whole log, in id order.
    pub fn all_events(&self) -> Vec<EventRecord> {
        self.inner.lock().log.records().to_vec()
    }
}

struct PendingEvent {
    stream_id: StreamId,
    data: serde_json::Value,
    metadata: EventMeta,
}

/// An open transaction: scratch tables plus buffered events and
/// notifications. Nothing becomes visible until the closure returns `Ok`.
pub struct Txn<'a> {
    pub tables: &'a mut Tables,
    committed: &'a [EventRecord],
    now_ms: u64,
    pending_events: Vec<PendingEvent>,
    pending_notifies: Vec<Notification>,
}

impl Txn<'_> {
    /// The commit timestamp every record and event in this transaction gets.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Buffer an event for append. Ids are assigned at commit.
    pub fn append(
        &mut self,
        stream_id: StreamId,
        body: &EventBody,
        metadata: EventMeta,
    ) -> Result<(), CoreError> {
        let data = serde_json::to_value(body)
            .map_err(|e| CoreError::Validation(format!("unserializable event: {e}")))?;
        self.pending_events.push(PendingEvent { stream_id, data, metadata });
        Ok(())
    }

    /// Buffer a notification for publish-on-commit.
    pub fn notify(&mut self, channel: Channel, payload: impl Into<String>) {
        self.pending_notifies.push(Notification::new(channel, payload));
    }

    /// Committed events, in id order. Events buffered by this transaction
    /// are not included.
    pub fn committed_events(&self) -> &[EventRecord] {
        self.committed
    }

    /// Committed events of one stream, in id order.
    pub fn committed_stream(&self, stream: &StreamId) -> impl Iterator<Item = &EventRecord> {
        let stream = stream.clone();
        self.committed.iter().filter(move |e| e.stream_id == stream)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
