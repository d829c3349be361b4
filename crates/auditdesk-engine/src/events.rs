//! Engine change notifications.
//!
//! Observers (a UI, the CLI, tests) subscribe to the [`EventBus`] to learn
//! about item changes, recomputed progress and the outcome of background
//! writes. Emission never blocks; slow subscribers lose the oldest events.

use auditdesk_core::enums::ItemField;
use auditdesk_core::progress::ProgressStats;
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Items of an audit were (re)populated from the record store.
    AuditLoaded { audit_id: String, items: usize },

    /// Local fields of an item changed; a write is scheduled.
    ItemUpdated {
        audit_id: String,
        item_id: String,
        fields: Vec<ItemField>,
    },

    EvidenceAdded {
        audit_id: String,
        item_id: String,
        evidence_id: String,
    },

    EvidenceRemoved {
        audit_id: String,
        item_id: String,
        evidence_id: String,
    },

    /// Fresh statistics after any change to an audit's items.
    ProgressChanged {
        audit_id: String,
        stats: ProgressStats,
    },

    /// A coalesced write for an item reached the record store.
    WriteCommitted { item_id: String },

    /// A coalesced write failed. The payload is kept for `retry_failed`.
    WriteFailed { item_id: String, error: String },

    AuditSubmitted { audit_id: String },
}

/// Broadcast channel for [`EngineEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
    capacity: usize,
}

impl EventBus {
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Receive all events emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emit to all subscribers.
    ///
    /// # Errors
    ///
    /// Returns the event back when nobody is subscribed.
    pub fn emit(
        &self,
        event: EngineEvent,
    ) -> Result<usize, broadcast::error::SendError<EngineEvent>> {
        self.tx.send(event)
    }

    /// Emit, ignoring the no-subscriber case.
    pub fn emit_lossy(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_fails_but_lossy_does_not() {
        let bus = EventBus::new(8);
        let event = EngineEvent::AuditSubmitted {
            audit_id: "aud-1".into(),
        };
        assert!(bus.emit(event.clone()).is_err());
        bus.emit_lossy(event);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.emit_lossy(EngineEvent::WriteCommitted {
            item_id: "itm-1".into(),
        });
        bus.emit_lossy(EngineEvent::WriteFailed {
            item_id: "itm-2".into(),
            error: "offline".into(),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::WriteCommitted {
                item_id: "itm-1".into()
            }
        );
        assert!(matches!(
            rx.recv().await.unwrap(),
            EngineEvent::WriteFailed { .. }
        ));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(EngineEvent::ItemUpdated {
            audit_id: "aud-1".into(),
            item_id: "itm-1".into(),
            fields: vec![ItemField::Remark],
        })
        .unwrap();
        assert_eq!(json["type"], "item_updated");
        assert_eq!(json["fields"][0], "remark");
    }
}
