use std::sync::Arc;

use content_studio::config::AppConfig;
use content_studio::server;
use content_studio::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    eprintln!("✍️  Content Studio v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Device: {}", config.device_id);
    eprintln!(
        "   Leads: {}",
        config.lead.endpoint.as_deref().unwrap_or("(log only)")
    );

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);

    // ── Trial + Workflows ───────────────────────────────────────────────
    let app = server::build(&config, db).await;
    let status = app.trial.status().await;
    eprintln!(
        "   Trial: {} ({} free use(s) left)",
        status.phase, status.state.free_uses_remaining
    );

    // ── HTTP ─────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    eprintln!("   Trial API: http://0.0.0.0:{}/api/trial/status", config.port);
    eprintln!(
        "   Generate: http://0.0.0.0:{}/api/workflows/generate\n",
        config.port
    );

    axum::serve(listener, app.router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    // Let queued trial writes land before exit.
    app.trial.flush().await;
    Ok(())
}
