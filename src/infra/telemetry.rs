use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so that command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "navcache_page_hit_total",
            Unit::Count,
            "Total number of page data cache hits."
        );
        describe_counter!(
            "navcache_page_miss_total",
            Unit::Count,
            "Total number of page data cache misses."
        );
        describe_counter!(
            "navcache_page_evict_total",
            Unit::Count,
            "Total number of page data evictions due to capacity."
        );
        describe_counter!(
            "navcache_feed_evict_total",
            Unit::Count,
            "Total number of feed evictions due to capacity."
        );
        describe_counter!(
            "navcache_feed_post_removed_total",
            Unit::Count,
            "Total number of feeds a deleted post was removed from."
        );
        describe_counter!(
            "navcache_chat_mirror_failed_total",
            Unit::Count,
            "Total number of failed chat cache writes to session storage."
        );
        describe_gauge!(
            "navcache_event_queue_depth",
            Unit::Count,
            "Current number of pending cache events in the queue."
        );
        describe_counter!(
            "navcache_event_dropped_total",
            Unit::Count,
            "Total number of cache events dropped due to queue overflow."
        );
        describe_histogram!(
            "navcache_consume_ms",
            Unit::Milliseconds,
            "Cache event consumption latency in milliseconds."
        );
        describe_counter!(
            "navcache_scroll_restore_total",
            Unit::Count,
            "Scroll restore attempts by outcome."
        );
        describe_counter!(
            "navcache_handoff_expired_total",
            Unit::Count,
            "Playback handoff records discarded after their validity window."
        );
        describe_counter!(
            "navcache_reconcile_total",
            Unit::Count,
            "History reconciliation runs by outcome."
        );
    });
}
