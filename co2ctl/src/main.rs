use clap::Parser;
use co2ctl::{Application, Config, telemetry};
use tokio::signal;

/// Resolve on SIGTERM or Ctrl+C. A handler that cannot be installed never fires, so the other
/// one still stops the server.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };
    tracing::info!(signal = received, "Shutting down; in-flight emission reports finish first");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // TLS provider first: the Prometheus and NocoDB clients are built during startup
    co2ctl::ensure_crypto_provider();

    let args = co2ctl::config::Args::parse();

    // YAML file, then CO2CTL_* and the bare AUTH_TOKEN / PROMETHEUS_URL overrides
    let config = Config::load(&args)?;

    // --validate stops after config checks, before any socket or exporter is opened
    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::debug!("{:?}", args);

    // Counters live in this process only; a restart resets them and the backend's
    // increase() absorbs the reset
    Application::new(config)?.serve(shutdown_signal()).await
}
