//! Ledger events, envelopes and the publish/subscribe mechanics.
//!
//! Domain crates define typed events (implementing [`Event`]); infrastructure
//! wraps them in [`EventEnvelope`]s and fans them out over an [`EventBus`].

pub mod bus;
pub mod command;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod scope;

pub use bus::{EventBus, Subscription};
pub use command::Command;
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use scope::AssetScoped;
