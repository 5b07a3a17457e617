use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("termai.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("termai.client.request_errors");
pub(crate) static CLIENT_STATUS_ERRORS: Counter = Counter::new("termai.client.status_errors");
pub(crate) static CLIENT_CANCELLED: Counter = Counter::new("termai.client.cancelled");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("termai.client.request_duration_seconds");

pub(crate) static STREAM_FRAMES: Counter = Counter::new("termai.stream.frames");
pub(crate) static STREAM_SKIPPED_FRAMES: Counter = Counter::new("termai.stream.skipped_frames");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("termai.stream.errors");

pub(crate) static FANOUT_WORKERS: Counter = Counter::new("termai.fanout.workers");
pub(crate) static FANOUT_FAILURES: Counter = Counter::new("termai.fanout.failures");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_STATUS_ERRORS);
    collector.register_counter(&CLIENT_CANCELLED);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_FRAMES);
    collector.register_counter(&STREAM_SKIPPED_FRAMES);
    collector.register_counter(&STREAM_ERRORS);

    collector.register_counter(&FANOUT_WORKERS);
    collector.register_counter(&FANOUT_FAILURES);
}
