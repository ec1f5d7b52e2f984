use relaybyte_worker::logging::AttemptLogLayer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialize structured logging with tracing-subscriber.
///
/// Console output uses the `RUST_LOG` env var if set, otherwise the provided
/// level. Events inside an attempt are also written at debug level to that
/// attempt's `logs.log`.
pub fn init(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(env_filter),
        )
        .with(AttemptLogLayer.with_filter(LevelFilter::DEBUG))
        .init();
}
