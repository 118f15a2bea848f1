use tracing_forest::ForestLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

/// `RUST_LOG` when set, otherwise `default_level` for everything.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

pub fn init(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(ForestLayer::default())
        .init();
}
