use std::io;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use echoledger_core::{ActorId, AssetId};
use echoledger_events::{EventEnvelope, InMemoryEventBus};
use echoledger_infra::LedgerHost;
use echoledger_infra::event_store::InMemoryEventStore;
use echoledger_infra::projections::{CreatorEarnings, LicenseCatalogProjection, LicenseSummary};
use echoledger_infra::read_model::InMemoryKeyedStore;
use echoledger_infra::workers::{ProjectionWorker, WorkerHandle};

use crate::config::ApiConfig;

pub type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
pub type Host = LedgerHost<Arc<InMemoryEventStore>, Bus>;
pub type Catalog = LicenseCatalogProjection<
    Arc<InMemoryKeyedStore<AssetId, LicenseSummary>>,
    Arc<InMemoryKeyedStore<ActorId, CreatorEarnings>>,
>;

/// Shared state behind every ledger route.
pub struct AppServices {
    pub host: Host,
    pub catalog: Arc<Catalog>,
    pub dev_funding: bool,
    _catalog_worker: WorkerHandle,
}

/// In-process wiring: journal + bus + host, with the catalog fed by a worker.
pub fn build_services(config: &ApiConfig) -> io::Result<AppServices> {
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());

    let catalog: Arc<Catalog> = Arc::new(LicenseCatalogProjection::new(
        Arc::new(InMemoryKeyedStore::new()),
        Arc::new(InMemoryKeyedStore::new()),
    ));

    let sink = catalog.clone();
    let catalog_worker = ProjectionWorker::spawn(
        "license-catalog",
        bus.clone(),
        None,
        move |env: EventEnvelope<JsonValue>| sink.apply_envelope(&env),
    )?;

    Ok(AppServices {
        host: LedgerHost::new(store, bus),
        catalog,
        dev_funding: config.dev_funding,
        _catalog_worker: catalog_worker,
    })
}
