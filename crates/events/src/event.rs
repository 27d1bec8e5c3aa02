use chrono::{DateTime, Utc};

/// A ledger fact. Once committed it is never edited, only appended after.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name stored with the journaled payload, e.g. `licensing.voice.used`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version.
    fn version(&self) -> u32;

    fn occurred_at(&self) -> DateTime<Utc>;
}
