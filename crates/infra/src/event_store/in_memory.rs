use std::collections::HashMap;
use std::sync::RwLock;

use echoledger_core::{AssetId, ExpectedVersion};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// In-memory append-only journal for tests and single-process hosts.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<AssetId, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[StoredEvent]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let Some(first) = events.first() else {
            return Ok(vec![]);
        };
        let stream_id = first.stream_id;
        let stream_type = first.stream_type.clone();

        for (idx, e) in events.iter().enumerate() {
            if e.stream_id != stream_id {
                return Err(EventStoreError::InvalidAppend(format!(
                    "batch spans multiple asset streams (index {idx})"
                )));
            }
            if e.stream_type != stream_type {
                return Err(EventStoreError::StreamTypeMismatch(format!(
                    "batch mixes stream types (index {idx})"
                )));
            }
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        let stream = streams.entry(stream_id).or_default();
        let current = Self::current_version(stream);

        expected_version
            .check(current)
            .map_err(|e| EventStoreError::Concurrency(e.to_string()))?;

        if let Some(existing) = stream.first() {
            if existing.stream_type != stream_type {
                return Err(EventStoreError::StreamTypeMismatch(format!(
                    "stream type is '{}', attempted append with '{}'",
                    existing.stream_type, stream_type
                )));
            }
        }

        let committed: Vec<StoredEvent> = events
            .into_iter()
            .zip(current + 1..)
            .map(|(e, sequence_number)| StoredEvent {
                event_id: e.event_id,
                stream_id: e.stream_id,
                stream_type: e.stream_type,
                sequence_number,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                payload: e.payload,
            })
            .collect();

        stream.extend(committed.iter().cloned());
        Ok(committed)
    }

    fn load_stream(&self, stream_id: AssetId) -> Result<Vec<StoredEvent>, EventStoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(streams.get(&stream_id).cloned().unwrap_or_default())
    }

    fn stream_version(&self, stream_id: AssetId) -> Result<u64, EventStoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(streams
            .get(&stream_id)
            .map(|s| Self::current_version(s))
            .unwrap_or(0))
    }

    fn load_all(&self) -> Result<Vec<StoredEvent>, EventStoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        let mut ids: Vec<&AssetId> = streams.keys().collect();
        ids.sort();
        Ok(ids
            .into_iter()
            .flat_map(|id| streams[id].iter().cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn event(stream_id: AssetId, stream_type: &str) -> UncommittedEvent {
        UncommittedEvent {
            event_id: Uuid::now_v7(),
            stream_id,
            stream_type: stream_type.to_string(),
            event_type: "licensing.voice.used".to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: json!({}),
        }
    }

    #[test]
    fn sequence_numbers_continue_per_stream() {
        let store = InMemoryEventStore::new();
        let (a, b) = (AssetId::new(), AssetId::new());

        store.append(vec![event(a, "voice"), event(a, "voice")], ExpectedVersion::Exact(0)).unwrap();
        let next = store.append(vec![event(a, "voice")], ExpectedVersion::Exact(2)).unwrap();
        let other = store.append(vec![event(b, "voice")], ExpectedVersion::Any).unwrap();

        assert_eq!(next[0].sequence_number, 3);
        assert_eq!(other[0].sequence_number, 1);
        assert_eq!(store.stream_version(a).unwrap(), 3);
        assert_eq!(store.load_all().unwrap().len(), 4);
    }

    #[test]
    fn stale_version_is_a_conflict_and_appends_nothing() {
        let store = InMemoryEventStore::new();
        let a = AssetId::new();
        store.append(vec![event(a, "voice")], ExpectedVersion::Exact(0)).unwrap();

        let err = store.append(vec![event(a, "voice")], ExpectedVersion::Exact(0)).unwrap_err();

        assert!(matches!(err, EventStoreError::Concurrency(_)));
        assert_eq!(store.load_stream(a).unwrap().len(), 1);
    }

    #[test]
    fn mixed_batches_are_rejected() {
        let store = InMemoryEventStore::new();
        let a = AssetId::new();

        assert!(matches!(
            store.append(vec![event(a, "voice"), event(AssetId::new(), "voice")], ExpectedVersion::Any),
            Err(EventStoreError::InvalidAppend(_))
        ));
        store.append(vec![event(a, "voice")], ExpectedVersion::Any).unwrap();
        assert!(matches!(
            store.append(vec![event(a, "other")], ExpectedVersion::Any),
            Err(EventStoreError::StreamTypeMismatch(_))
        ));
    }
}
