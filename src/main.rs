mod classifier;
mod config;
mod dto;
mod handlers;
mod mailer;
mod models;
mod service;

use tracing_subscriber::EnvFilter;

use std::sync::Arc;

use service::NotificationService;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load config
    let cfg = config::load_config().expect("failed to locate or load config file");
    tracing::info!(
        "Successfully loaded notifier config, provider: {:?}",
        cfg.provider
    );

    // Setup service
    let mailer = mailer::from_config(&cfg).unwrap_or_else(|e| {
        tracing::error!("Failed to initialise mail sender: {e}");
        panic!("failed to initialise mail sender: {e}");
    });
    let service = NotificationService::new(
        mailer,
        cfg.sender.identity(),
        cfg.plain_text_body.clone(),
    );

    // Setup router
    let router = handlers::router(Arc::new(service));

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .expect("Failed to bind to address");
    let addr = listener.local_addr().expect("Failed to read local address");

    tracing::info!("Failure notifier starting, listening on {}", addr);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
