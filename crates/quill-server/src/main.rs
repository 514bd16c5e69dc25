mod config;

use tracing::{info, warn};

use quill_api::auth::AppStateInner;
use quill_api::routes;
use quill_api::token::TokenService;
use quill_db::{Database, MutationQueue};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "quill_server=debug,quill_api=debug,quill_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and the single writer
    let (db, writer) = Database::open(&config.db_path)?;
    let queue = MutationQueue::start(writer, config.queue_capacity)?;

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
    let state = AppStateInner::new(db, queue.clone(), tokens, config.write_timeout);

    let app = routes::router(state);

    info!("Quill server listening on {}", config.addr);
    info!(
        "Token TTL: {} hours, write queue capacity: {}",
        config.token_ttl.num_hours(),
        queue.capacity()
    );

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // In-flight requests are done; apply whatever is still queued.
    queue.shutdown().await?;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
