use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::pagination::METRIC_REMOTE_RATE_LIMITED;
use crate::cache::{
    METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_STALE_SERVED, METRIC_CACHE_UNAVAILABLE,
    METRIC_MEMORY_EVICT,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Events go to stderr; stdout carries command output.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(std::io::stderr)
            .compact()
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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Cache reads answered with a fresh entry."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Cache reads that found no entry or only a stale one."
        );
        describe_counter!(
            METRIC_CACHE_STALE_SERVED,
            Unit::Count,
            "Stale entries served after a failed or rate-limited refresh."
        );
        describe_counter!(
            METRIC_CACHE_UNAVAILABLE,
            Unit::Count,
            "Cache backend failures absorbed as misses or dropped writes."
        );
        describe_counter!(
            METRIC_MEMORY_EVICT,
            Unit::Count,
            "In-memory cache evictions due to capacity."
        );
        describe_counter!(
            METRIC_REMOTE_RATE_LIMITED,
            Unit::Count,
            "Remote requests answered with 429."
        );
    });
}
