//! Contains the main aggregator service runner.

use anyhow::Result;
use std::sync::Arc;
use tokio::{task::JoinSet, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use utxodex_core::{ChainSyncDriver, config::Config, source::OgmiosClient};
use utxodex_storage::IndexDb;

use crate::actors::{AggregatorActor, MetricWorker, SyncActor};

/// Interval between two reports of the index gauges.
const METRIC_REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Runs the aggregator: owns the index database and the tasks that keep it in sync.
#[derive(Debug)]
pub struct Service {
    config: Arc<Config>,

    cancel_token: CancellationToken,
    join_set: JoinSet<Result<(), anyhow::Error>>,
}

impl Service {
    /// Creates a new aggregator service instance.
    pub fn new(cfg: Config) -> Self {
        Self {
            config: Arc::new(cfg),
            cancel_token: CancellationToken::new(),
            join_set: JoinSet::new(),
        }
    }

    /// Opens the index and spawns the service tasks.
    pub async fn initialise(&mut self) -> Result<()> {
        let db_path = self.config.db_path();
        let db = Arc::new(IndexDb::open(&db_path)?.with_metrics());
        info!(
            target: "utxodex::service",
            path = %db_path.display(),
            network = %self.config.network,
            "Opened index database"
        );

        self.init_sync(db.clone());
        self.init_metric_reporter(db);
        Ok(())
    }

    fn init_sync(&mut self, db: Arc<IndexDb>) {
        let source = Arc::new(OgmiosClient::new(self.config.ogmios_url.clone()));
        let driver = ChainSyncDriver::new(
            self.config.sync.clone(),
            db,
            source,
            self.cancel_token.clone(),
        );

        self.join_set.spawn(async move {
            if let Err(err) = SyncActor::new(driver).start().await {
                Err(anyhow::anyhow!(err))
            } else {
                Ok(())
            }
        });
    }

    fn init_metric_reporter(&mut self, db: Arc<IndexDb>) {
        let cancel_token = self.cancel_token.clone();
        self.join_set.spawn(async move {
            if let Err(err) =
                MetricWorker::new(METRIC_REPORT_INTERVAL, vec![db], cancel_token).start().await
            {
                Err(anyhow::anyhow!(err))
            } else {
                Ok(())
            }
        });
    }

    /// Runs the service until every task completes or one of them fails.
    pub async fn run(&mut self) -> Result<()> {
        self.initialise().await?;

        while let Some(res) = self.join_set.join_next().await {
            match res {
                Ok(Ok(_)) => {
                    info!(target: "utxodex::service", "Task completed successfully.");
                }
                Ok(Err(err)) => {
                    error!(target: "utxodex::service", %err, "A task encountered an error.");
                    self.cancel_token.cancel();
                    return Err(anyhow::anyhow!("A service task failed: {}", err));
                }
                Err(err) => {
                    error!(target: "utxodex::service", %err, "A task panicked or was aborted.");
                    self.cancel_token.cancel();
                    return Err(anyhow::anyhow!("A service task failed: {}", err));
                }
            }
        }
        Ok(())
    }

    /// Cancels every task and waits for them to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel_token.cancel();

        while let Some(res) = self.join_set.join_next().await {
            match res {
                Ok(Ok(_)) => {
                    info!(target: "utxodex::service", "Task completed successfully during shutdown.");
                }
                Ok(Err(err)) => {
                    error!(target: "utxodex::service", %err, "A task encountered an error during shutdown.");
                }
                Err(err) => {
                    error!(target: "utxodex::service", %err, "A task panicked during shutdown.");
                }
            }
        }

        info!(target: "utxodex::service", "All service tasks stopped");
        Ok(())
    }
}
