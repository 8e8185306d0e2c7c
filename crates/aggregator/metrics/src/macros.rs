/// Records the outcome and duration of an already evaluated call.
///
/// Increments `$success_metric` or `$error_metric` depending on `$result` and records the
/// elapsed time since `$start` in `$duration_metric`. Every series is labelled with
/// `method` plus any extra `key => value` pairs.
#[doc(hidden)]
#[macro_export]
macro_rules! record_call_outcome {
    (
        $success_metric:expr,
        $error_metric:expr,
        $duration_metric:expr,
        $method_name:expr,
        $start:expr,
        $result:expr $(, $tag_key:expr => $tag_val:expr )*
    ) => {{
        let elapsed = $start.elapsed().as_secs_f64();
        let outcome_metric = if $result.is_ok() { $success_metric } else { $error_metric };

        metrics::counter!(
            outcome_metric,
            "method" => $method_name
            $(, $tag_key => $tag_val )*
        )
        .increment(1);

        metrics::histogram!(
            $duration_metric,
            "method" => $method_name
            $(, $tag_key => $tag_val )*
        )
        .record(elapsed);
    }};
}

/// Observes a synchronous call returning a `Result` and records its metrics.
#[macro_export]
macro_rules! observe_metrics_for_result {
    (
        $success_metric:expr,
        $error_metric:expr,
        $duration_metric:expr,
        $method_name:expr,
        $block:expr $(, $tag_key:expr => $tag_val:expr )*
    ) => {{
        let start = std::time::Instant::now();
        let result = $block;
        $crate::record_call_outcome!(
            $success_metric,
            $error_metric,
            $duration_metric,
            $method_name,
            start,
            result
            $(, $tag_key => $tag_val )*
        );
        result
    }};
}

/// Observes an async call returning a `Result` and records its metrics.
#[macro_export]
macro_rules! observe_metrics_for_result_async {
    (
        $success_metric:expr,
        $error_metric:expr,
        $duration_metric:expr,
        $method_name:expr,
        $block:expr $(, $tag_key:expr => $tag_val:expr )*
    ) => {{
        let start = std::time::Instant::now();
        let result = $block.await;
        $crate::record_call_outcome!(
            $success_metric,
            $error_metric,
            $duration_metric,
            $method_name,
            start,
            result
            $(, $tag_key => $tag_val )*
        );
        result
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_sync_observation_passes_result_through() {
        let ok: Result<u32, String> =
            observe_metrics_for_result!("ok_total", "err_total", "duration", "sync", Ok(7));
        assert_eq!(ok, Ok(7));

        let err: Result<u32, String> = observe_metrics_for_result!(
            "ok_total",
            "err_total",
            "duration",
            "sync",
            Err("boom".to_string()),
            "db" => "index"
        );
        assert_eq!(err, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_async_observation_passes_result_through() {
        let result: Result<&str, ()> = observe_metrics_for_result_async!(
            "ok_total",
            "err_total",
            "duration",
            "async",
            async { Ok("done") }
        );
        assert_eq!(result, Ok("done"));
    }
}
