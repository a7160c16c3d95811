//! Mailgun Receiver web server.
//!
//! This binary:
//! - Receives Mailgun inbound-mail webhooks
//! - Verifies their signatures
//! - Forwards the MIME to the mail processor
//! - Publishes rejection notices and operator alerts to RabbitMQ

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mailgun_receiver::{
    router, AppState, Config, HttpMailProcessor, IngestSettings, Ingestor, Publisher,
    QueueAlertSink, QueueNotificationSender,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        mount_path = %config.mount_path,
        mailgun_enabled = config.mailgun_enabled,
        mailgun_api_key_configured = config.mailgun_api_key.is_some(),
        signature_max_age = ?config.mailgun_signature_max_age,
        log_mail_processing_failures = config.log_mail_processing_failures,
        mail_processor_url = %config.mail_processor_url,
        publish_timeout_ms = config.publish_timeout_ms,
        "config_loaded"
    );

    // Notices and alerts share one lazily connected publisher
    let publisher = Publisher::new(config.cloudamqp_url.clone(), config.publish_timeout());
    info!("rabbitmq_publisher_created");

    let processor = HttpMailProcessor::from_config(&config)?;
    let ingestor = Ingestor::new(
        Arc::new(processor),
        Arc::new(QueueNotificationSender::new(publisher.clone())),
        Arc::new(QueueAlertSink::new(publisher.clone())),
        IngestSettings::from_config(&config),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, ingestor));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    publisher.close().await;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
