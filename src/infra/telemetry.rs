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
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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
            "texttool_jobs_enqueued_total",
            Unit::Count,
            "Total number of multi-image tasks accepted into the queue."
        );
        describe_counter!(
            "texttool_jobs_rejected_total",
            Unit::Count,
            "Total number of tasks rejected because the queue was full."
        );
        describe_counter!(
            "texttool_jobs_completed_total",
            Unit::Count,
            "Total number of queued tasks delivered successfully."
        );
        describe_counter!(
            "texttool_jobs_failed_total",
            Unit::Count,
            "Total number of queued tasks that failed and were reported to the requester."
        );
        describe_counter!(
            "texttool_worker_panics_total",
            Unit::Count,
            "Total number of worker loop iterations that panicked."
        );
        describe_gauge!(
            "texttool_queue_len",
            Unit::Count,
            "Current number of tasks waiting in the queue."
        );
        describe_histogram!(
            "texttool_render_ms",
            Unit::Milliseconds,
            "Time spent rasterizing and encoding one task, in milliseconds."
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_telemetry_error() {
        let logging = LoggingSettings {
            level: tracing::level_filters::LevelFilter::WARN,
            format: LogFormat::Compact,
        };
        let _ = init(&logging);
        assert!(matches!(init(&logging), Err(InfraError::Telemetry(_))));
    }
}
