use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// sqlx statement logs (development only) surface with RUST_LOG=sqlx=debug.
const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
