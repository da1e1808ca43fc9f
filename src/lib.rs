pub mod config;
pub mod db;
pub mod models;
pub mod normalization;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the default filter. Safe to call more than once;
/// later calls are ignored.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    if installed.is_ok() {
        tracing::info!("{} v{} tracing initialised", config::APP_NAME, config::APP_VERSION);
    }
}
