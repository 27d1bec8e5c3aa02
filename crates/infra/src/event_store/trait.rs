use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use echoledger_core::{AssetId, ExpectedVersion};
use echoledger_events::{Event, EventEnvelope};

/// An event ready to be appended to an asset stream (no sequence number yet).
///
/// Built with [`UncommittedEvent::from_typed`], which serializes the typed
/// ledger event and keeps the metadata needed to decode it again on replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEvent {
    pub event_id: Uuid,
    pub stream_id: AssetId,
    pub stream_type: String,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

/// A journaled event with its position in the asset stream.
///
/// Sequence numbers start at 1 and increase by one per stream, with no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub stream_id: AssetId,
    pub stream_type: String,

    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl StoredEvent {
    pub fn stream_version(&self) -> u64 {
        self.sequence_number
    }

    /// Envelope for publication on the bus.
    pub fn to_envelope(&self) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            self.event_id,
            self.stream_id,
            self.stream_type.clone(),
            self.sequence_number,
            self.payload.clone(),
        )
    }
}

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("stream type mismatch: {0}")]
    StreamTypeMismatch(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("event store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only journal of ledger events, one stream per voice asset.
///
/// `append`:
/// - rejects batches that mix streams
/// - checks `expected_version` against the current stream version
/// - assigns `sequence_number`s from `current_version + 1`
/// - stores the whole batch or nothing
pub trait EventStore: Send + Sync {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Events of one asset stream in sequence order; empty if none exist.
    fn load_stream(&self, stream_id: AssetId) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Every journaled event, each stream in sequence order.
    fn load_all(&self) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Sequence number of the last event in the stream (0 if empty).
    fn stream_version(&self, stream_id: AssetId) -> Result<u64, EventStoreError> {
        Ok(self
            .load_stream(stream_id)?
            .last()
            .map(StoredEvent::stream_version)
            .unwrap_or(0))
    }
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).append(events, expected_version)
    }

    fn load_stream(&self, stream_id: AssetId) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_stream(stream_id)
    }

    fn load_all(&self) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_all()
    }

    fn stream_version(&self, stream_id: AssetId) -> Result<u64, EventStoreError> {
        (**self).stream_version(stream_id)
    }
}

impl UncommittedEvent {
    pub fn from_typed<E>(
        stream_id: AssetId,
        stream_type: impl Into<String>,
        event_id: Uuid,
        event: &E,
    ) -> Result<Self, EventStoreError>
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| EventStoreError::InvalidAppend(format!("payload serialization failed: {e}")))?;

        Ok(Self {
            event_id,
            stream_id,
            stream_type: stream_type.into(),
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }
}
