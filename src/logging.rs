use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter, e.g. `FLAC_BRIDGE_LOG=flac_bridge=debug`.
pub const LOG_ENV: &str = "FLAC_BRIDGE_LOG";

/// Initialize structured JSON logging.
///
/// Defaults to `error` level unless overridden by `FLAC_BRIDGE_LOG`. Handler failures inside
/// decoder callbacks are logged at `warn`, so raise the level to see them.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV)
        .with_default_directive(tracing::level_filters::LevelFilter::ERROR.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        tracing::warn!(env = LOG_ENV, "logging initialized twice");
    }
}
