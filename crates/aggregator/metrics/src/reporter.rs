/// Implemented by components that publish point-in-time gauges, such as table sizes.
///
/// A background worker calls [`MetricsReporter::report_metrics`] on a fixed interval.
pub trait MetricsReporter {
    /// Samples the current state and records it with the installed recorder.
    fn report_metrics(&self);
}
