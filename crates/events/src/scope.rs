use echoledger_core::AssetId;

use crate::EventEnvelope;

/// Messages that belong to a single asset stream.
///
/// Workers use this to pin themselves to one asset and ignore the rest.
pub trait AssetScoped {
    fn asset_id(&self) -> AssetId;
}

impl<E> AssetScoped for EventEnvelope<E> {
    fn asset_id(&self) -> AssetId {
        self.stream_id()
    }
}
