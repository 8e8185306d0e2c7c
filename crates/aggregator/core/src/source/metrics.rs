//! Metrics for the Ogmios chain-sync client.

/// Container for metrics.
#[derive(Debug, Clone)]
pub(super) struct Metrics;

impl Metrics {
    /// Identifier for the counter of successful RPC requests. Labels: `method`, `node`.
    pub(crate) const OGMIOS_RPC_REQUESTS_SUCCESS_TOTAL: &'static str =
        "utxodex_ogmios_rpc_requests_success_total";
    /// Identifier for the counter of failed RPC requests. Labels: `method`, `node`.
    pub(crate) const OGMIOS_RPC_REQUESTS_ERROR_TOTAL: &'static str =
        "utxodex_ogmios_rpc_requests_error_total";
    /// Identifier for the histogram of RPC request durations. Labels: `method`, `node`.
    pub(crate) const OGMIOS_RPC_REQUEST_DURATION_SECONDS: &'static str =
        "utxodex_ogmios_rpc_request_duration_seconds";
    /// Identifier for the counter of websocket connections opened. Labels: `node`.
    pub(crate) const OGMIOS_CONNECTIONS_TOTAL: &'static str = "utxodex_ogmios_connections_total";

    pub(crate) const RPC_METHOD_FIND_INTERSECTION: &'static str = "findIntersection";
    pub(crate) const RPC_METHOD_NEXT_BLOCK: &'static str = "nextBlock";

    /// Describes the client metrics and zeroes every labelled series for `node`.
    pub(crate) fn init(node: &str) {
        Self::describe();
        Self::zero(node);
    }

    fn describe() {
        metrics::describe_counter!(
            Self::OGMIOS_RPC_REQUESTS_SUCCESS_TOTAL,
            metrics::Unit::Count,
            "Total number of successful chain-sync requests"
        );
        metrics::describe_counter!(
            Self::OGMIOS_RPC_REQUESTS_ERROR_TOTAL,
            metrics::Unit::Count,
            "Total number of failed chain-sync requests"
        );
        metrics::describe_histogram!(
            Self::OGMIOS_RPC_REQUEST_DURATION_SECONDS,
            metrics::Unit::Seconds,
            "Duration of chain-sync requests"
        );
        metrics::describe_counter!(
            Self::OGMIOS_CONNECTIONS_TOTAL,
            metrics::Unit::Count,
            "Total number of websocket connections opened to Ogmios"
        );
    }

    fn zero_rpc_method(method: &'static str, node: &str) {
        metrics::counter!(
            Self::OGMIOS_RPC_REQUESTS_SUCCESS_TOTAL,
            "method" => method,
            "node" => node.to_string()
        )
        .increment(0);

        metrics::counter!(
            Self::OGMIOS_RPC_REQUESTS_ERROR_TOTAL,
            "method" => method,
            "node" => node.to_string()
        )
        .increment(0);

        metrics::histogram!(
            Self::OGMIOS_RPC_REQUEST_DURATION_SECONDS,
            "method" => method,
            "node" => node.to_string()
        )
        .record(0.0);
    }

    fn zero(node: &str) {
        Self::zero_rpc_method(Self::RPC_METHOD_FIND_INTERSECTION, node);
        Self::zero_rpc_method(Self::RPC_METHOD_NEXT_BLOCK, node);
        metrics::counter!(Self::OGMIOS_CONNECTIONS_TOTAL, "node" => node.to_string()).increment(0);
    }
}
