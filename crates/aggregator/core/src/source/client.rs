use super::{ChainSyncEvent, ChainSyncSource, Intersection, SourceError, metrics::Metrics};
use async_trait::async_trait;
use jsonrpsee::{
    core::{client::ClientT, params::ObjectParams},
    ws_client::{WsClient, WsClientBuilder},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use utxodex_metrics::observe_metrics_for_result_async;
use utxodex_types::ChainPoint;

/// Blocks near the tip can take a while to arrive, so requests wait well beyond a slot.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Large blocks exceed the default message limit.
const MAX_RESPONSE_SIZE: u32 = 64 * 1024 * 1024;

/// Chain-sync client speaking the Ogmios JSON-RPC protocol over a websocket.
#[derive(Debug)]
pub struct OgmiosClient {
    url: String,
    /// The attached web socket client
    ws_client: Mutex<Option<Arc<WsClient>>>,
}

impl OgmiosClient {
    /// Creates a new [`OgmiosClient`] for the Ogmios endpoint at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Metrics::init(&url);
        Self { url, ws_client: Mutex::new(None) }
    }

    /// Returns the websocket client, connecting if there is none.
    pub async fn get_ws_client(&self) -> Result<Arc<WsClient>, SourceError> {
        let mut ws_client_guard = self.ws_client.lock().await;
        if let Some(client) = ws_client_guard.as_ref() {
            if client.is_connected() {
                return Ok(client.clone());
            }
            warn!(target: "utxodex::ogmios", url = self.url, "Web socket client disconnected, reconnecting");
        }

        info!(target: "utxodex::ogmios", url = self.url, "Creating a new web socket client");
        let client = WsClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .max_response_size(MAX_RESPONSE_SIZE)
            .build(&self.url)
            .await
            .inspect_err(|err| {
                error!(target: "utxodex::ogmios", %err, url = self.url, "Failed to connect to Ogmios");
            })?;
        metrics::counter!(Metrics::OGMIOS_CONNECTIONS_TOTAL, "node" => self.url.clone())
            .increment(1);

        let client = Arc::new(client);
        *ws_client_guard = Some(client.clone());
        Ok(client)
    }
}

#[async_trait]
impl ChainSyncSource for OgmiosClient {
    async fn find_intersection(
        &self,
        points: Vec<ChainPoint>,
    ) -> Result<Intersection, SourceError> {
        let client = self.get_ws_client().await?;
        let mut params = ObjectParams::new();
        params.insert("points", points)?;

        let intersection = observe_metrics_for_result_async!(
            Metrics::OGMIOS_RPC_REQUESTS_SUCCESS_TOTAL,
            Metrics::OGMIOS_RPC_REQUESTS_ERROR_TOTAL,
            Metrics::OGMIOS_RPC_REQUEST_DURATION_SECONDS,
            Metrics::RPC_METHOD_FIND_INTERSECTION,
            async {
              client.request::<Intersection, _>(Metrics::RPC_METHOD_FIND_INTERSECTION, params).await
            },
            "node" => self.url.clone()
        )
        .inspect_err(|err| {
            error!(target: "utxodex::ogmios", %err, "Failed to find intersection");
        })?;

        Ok(intersection)
    }

    async fn next_event(&self) -> Result<ChainSyncEvent, SourceError> {
        let client = self.get_ws_client().await?;
        let event = observe_metrics_for_result_async!(
            Metrics::OGMIOS_RPC_REQUESTS_SUCCESS_TOTAL,
            Metrics::OGMIOS_RPC_REQUESTS_ERROR_TOTAL,
            Metrics::OGMIOS_RPC_REQUEST_DURATION_SECONDS,
            Metrics::RPC_METHOD_NEXT_BLOCK,
            async {
              client.request::<ChainSyncEvent, _>(Metrics::RPC_METHOD_NEXT_BLOCK, ObjectParams::new()).await
            },
            "node" => self.url.clone()
        )?;
        Ok(event)
    }

    async fn reset(&self) {
        let mut ws_client_guard = self.ws_client.lock().await;
        if ws_client_guard.is_some() {
            info!(target: "utxodex::ogmios", url = self.url, "Dropping web socket client");
            *ws_client_guard = None;
        };
    }
}
