/// Container for [`IndexDb`](crate::IndexDb) metrics.
#[derive(Debug, Clone)]
pub(crate) struct Metrics;

impl Metrics {
    pub(crate) const STORAGE_REQUESTS_SUCCESS_TOTAL: &'static str =
        "utxodex_storage_success_total";
    pub(crate) const STORAGE_REQUESTS_ERROR_TOTAL: &'static str = "utxodex_storage_error_total";
    pub(crate) const STORAGE_REQUEST_DURATION_SECONDS: &'static str =
        "utxodex_storage_duration_seconds";

    pub(crate) const TABLE_ROWS: &'static str = "utxodex_storage_table_rows";
    pub(crate) const DATABASE_SIZE_BYTES: &'static str = "utxodex_storage_size_bytes";

    pub(crate) const STORAGE_METHOD_LATEST_BLOCK: &'static str = "latest_block";
    pub(crate) const STORAGE_METHOD_NTH_LATEST_BLOCK: &'static str = "nth_latest_block";
    pub(crate) const STORAGE_METHOD_LATEST_BLOCK_BELOW_HEIGHT: &'static str =
        "latest_block_below_height";
    pub(crate) const STORAGE_METHOD_UNSPENT_OUTPUTS_AT_HEIGHTS: &'static str =
        "unspent_outputs_at_heights";
    pub(crate) const STORAGE_METHOD_GET_OUTPUT: &'static str = "get_output";
    pub(crate) const STORAGE_METHOD_TRANSACTION_BY_HASH: &'static str = "transaction_by_hash";
    pub(crate) const STORAGE_METHOD_UTXOS_BY_ADDRESSES: &'static str = "utxos_by_addresses";
    pub(crate) const STORAGE_METHOD_UTXOS_BY_REFERENCES: &'static str = "utxos_by_references";
    pub(crate) const STORAGE_METHOD_UTXOS_BY_PAYMENT_CREDENTIALS: &'static str =
        "utxos_by_payment_credentials";
    pub(crate) const STORAGE_METHOD_ADDRESSES_BY_STAKE_CREDENTIAL: &'static str =
        "addresses_by_stake_credential";
    pub(crate) const STORAGE_METHOD_FILTER_USED_ADDRESSES: &'static str = "filter_used_addresses";
    pub(crate) const STORAGE_METHOD_COMMIT_BATCH: &'static str = "commit_batch";
    pub(crate) const STORAGE_METHOD_MARK_SPENT: &'static str = "mark_spent";
    pub(crate) const STORAGE_METHOD_ROLLBACK_TO_SLOT: &'static str = "rollback_to_slot";

    const METHODS: [&'static str; 14] = [
        Self::STORAGE_METHOD_LATEST_BLOCK,
        Self::STORAGE_METHOD_NTH_LATEST_BLOCK,
        Self::STORAGE_METHOD_LATEST_BLOCK_BELOW_HEIGHT,
        Self::STORAGE_METHOD_UNSPENT_OUTPUTS_AT_HEIGHTS,
        Self::STORAGE_METHOD_GET_OUTPUT,
        Self::STORAGE_METHOD_TRANSACTION_BY_HASH,
        Self::STORAGE_METHOD_UTXOS_BY_ADDRESSES,
        Self::STORAGE_METHOD_UTXOS_BY_REFERENCES,
        Self::STORAGE_METHOD_UTXOS_BY_PAYMENT_CREDENTIALS,
        Self::STORAGE_METHOD_ADDRESSES_BY_STAKE_CREDENTIAL,
        Self::STORAGE_METHOD_FILTER_USED_ADDRESSES,
        Self::STORAGE_METHOD_COMMIT_BATCH,
        Self::STORAGE_METHOD_MARK_SPENT,
        Self::STORAGE_METHOD_ROLLBACK_TO_SLOT,
    ];

    pub(crate) fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::STORAGE_REQUESTS_SUCCESS_TOTAL,
            metrics::Unit::Count,
            "Total number of successful index storage requests"
        );
        metrics::describe_counter!(
            Self::STORAGE_REQUESTS_ERROR_TOTAL,
            metrics::Unit::Count,
            "Total number of failed index storage requests"
        );
        metrics::describe_histogram!(
            Self::STORAGE_REQUEST_DURATION_SECONDS,
            metrics::Unit::Seconds,
            "Duration of index storage requests"
        );
        metrics::describe_gauge!(
            Self::TABLE_ROWS,
            metrics::Unit::Count,
            "Number of rows per index table"
        );
        metrics::describe_gauge!(
            Self::DATABASE_SIZE_BYTES,
            metrics::Unit::Bytes,
            "Size of the index database file"
        );
    }

    fn zero() {
        for method in Self::METHODS {
            metrics::counter!(Self::STORAGE_REQUESTS_SUCCESS_TOTAL, "method" => method)
                .increment(0);
            metrics::counter!(Self::STORAGE_REQUESTS_ERROR_TOTAL, "method" => method).increment(0);
            metrics::histogram!(Self::STORAGE_REQUEST_DURATION_SECONDS, "method" => method)
                .record(0.0);
        }
    }
}
