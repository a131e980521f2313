use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "info,divelog=debug";

/// Build the level filter: RUST_LOG if set and valid, else [`DEFAULT_FILTER`]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging.
/// - JSON lines when `json` is set (log shipping), human-readable otherwise
/// - RUST_LOG respected; default to "info,divelog=debug"
pub fn init(service_name: &str, json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter());
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }

    tracing::info!(service = %service_name, json, "Observability initialized");
}
