use echoledger_core::AssetId;

/// A command targets exactly one voice asset.
///
/// Commands represent **intent** ("buy five uses of asset A"); accepted
/// commands become events, rejected ones become typed failures. Each command
/// touches a single asset stream, which is the unit the host serializes on.
/// Commands against different assets are independent.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_asset_id(&self) -> AssetId;
}
