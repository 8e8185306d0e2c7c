use crate::AggregatorActor;
use async_trait::async_trait;
use derive_more::Constructor;
use tracing::info;
use utxodex_core::{ChainSyncDriver, SyncError, source::ChainSyncSource};
use utxodex_storage::IndexStore;

/// Runs the chain-sync driver as a service task.
#[derive(Debug, Constructor)]
pub struct SyncActor<S, C> {
    driver: ChainSyncDriver<S, C>,
}

#[async_trait]
impl<S, C> AggregatorActor for SyncActor<S, C>
where
    S: IndexStore + Send + Sync + 'static,
    C: ChainSyncSource + 'static,
{
    type Error = SyncError;

    async fn start(mut self) -> Result<(), Self::Error> {
        info!(target: "utxodex::sync_actor", "Starting chain sync");
        self.driver.run().await
    }
}
