//! Comment push notification service binary entrypoint.

use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use comment_push_common::config::AppConfig;
use comment_push_common::firestore::FirestoreClient;
use comment_push_notifier::dispatcher::NotificationDispatcher;

use comment_push_api::routes::create_router;
use comment_push_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("comment_push_api=info,comment_push_notifier=info,tower_http=info")
        }))
        .json()
        .init();

    tracing::info!("Starting comment push service...");

    // Load and validate configuration; missing provider credentials abort startup
    let config = AppConfig::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("comment-push/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let store = FirestoreClient::from_config(http.clone(), &config);
    let dispatcher = NotificationDispatcher::from_config(store, http, &config);
    let state = AppState::new(dispatcher);

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Comment push service stopped.");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM (sent by the platform before instance shutdown).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Received shutdown signal, stopping gracefully...");
}
