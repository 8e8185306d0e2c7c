use crate::AggregatorActor;
use async_trait::async_trait;
use std::{io, sync::Arc, time::Duration};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;
use utxodex_metrics::MetricsReporter;

/// Periodically asks every reporter to publish its gauges.
#[derive(Debug, derive_more::Constructor)]
pub struct MetricWorker<R> {
    interval: Duration,
    reporters: Vec<Arc<R>>,
    cancel_token: CancellationToken,
}

#[async_trait]
impl<R> AggregatorActor for MetricWorker<R>
where
    R: MetricsReporter + Send + Sync + 'static,
{
    type Error = io::Error;

    async fn start(mut self) -> Result<(), Self::Error> {
        info!(
            target: "utxodex::metric_worker",
            interval = ?self.interval,
            reporters = self.reporters.len(),
            "Starting metric worker"
        );

        while !self.cancel_token.is_cancelled() {
            for reporter in &self.reporters {
                reporter.report_metrics();
            }
            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = self.cancel_token.cancelled() => break,
            }
        }

        info!(target: "utxodex::metric_worker", "Metric worker stopped");
        Ok(())
    }
}
