pub mod api; // HTTP surface
pub mod booking; // Booking service: policy over the resolver
pub mod catalog; // Appointment types, directory, audit reads
pub mod config;
pub mod core_state; // Shared state: settings + realtime broker
pub mod db;
pub mod models;
pub mod rbac; // Role → permission sets
pub mod realtime; // Practice-scoped event fan-out
pub mod scheduling; // Conflict resolver
pub mod waitlist; // Waitlist requests booked through the resolver

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("State error: {0}")]
    Core(#[from] core_state::CoreError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Starts the API server and serves until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = config::Settings::from_env()?;
    if settings.demo_mode {
        tracing::warn!("Demo mode enabled: unauthenticated requests run as administrator");
    }
    let bind_addr = settings.bind_addr;

    let core = Arc::new(core_state::CoreState::new(settings));
    core.initialize()?;

    let mut server = api::start_api_server(core, bind_addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.stopped().await;
    Ok(())
}
