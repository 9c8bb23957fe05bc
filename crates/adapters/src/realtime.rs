// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard fanout seam.

use async_trait::async_trait;
use gaffer_core::EventRecord;

/// Pushes committed events to realtime consumers (dashboard websockets).
/// Delivery is best-effort; the event log remains the source of truth.
#[async_trait]
pub trait RealtimePublisher: Send + Sync + 'static {
    async fn publish(&self, stream: &str, event: &EventRecord);
}

/// Publisher that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl RealtimePublisher for NoopPublisher {
    async fn publish(&self, _stream: &str, _event: &EventRecord) {}
}
