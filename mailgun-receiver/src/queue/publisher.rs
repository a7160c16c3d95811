//! Async RabbitMQ publisher for enqueueing messages.
//!
//! This module provides a lazily connected publisher that can be shared
//! across request handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::types::{OperatorAlert, RejectionNotice, ALERT_QUEUE, REJECTION_QUEUE};

/// Async RabbitMQ publisher with connection management.
///
/// The publisher maintains a persistent connection and channel to RabbitMQ,
/// automatically reconnecting on failure.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    timeout: Duration,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl Publisher {
    /// Create a new publisher with the given RabbitMQ URL.
    ///
    /// Each publish, including any reconnect and the broker confirm, gives up
    /// after `timeout`.
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                timeout,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Double-check after acquiring write lock
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_publisher_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        info!("rabbitmq_publisher_connected");

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        for queue in [REJECTION_QUEUE, ALERT_QUEUE] {
            ch.queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to declare {} queue", queue))?;
        }

        info!(
            rejection_queue = REJECTION_QUEUE,
            alert_queue = ALERT_QUEUE,
            "rabbitmq_queues_declared"
        );

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Publish a persistent JSON message to `queue`, bounded by the publish timeout.
    ///
    /// Dropping the in-flight attempt on expiry also releases the connection
    /// write locks, so a stalled broker cannot wedge later publishes.
    async fn publish<T: Serialize>(&self, queue: &str, message_id: &str, message: &T) -> Result<()> {
        match tokio::time::timeout(
            self.inner.timeout,
            self.publish_confirmed(queue, message_id, message),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    queue = queue,
                    message_id = %message_id,
                    timeout_ms = self.inner.timeout.as_millis() as u64,
                    "rabbitmq_publish_timed_out"
                );
                Err(anyhow!(
                    "Publish to {} queue timed out after {:?}",
                    queue,
                    self.inner.timeout
                ))
            }
        }
    }

    /// Publish a persistent JSON message to `queue` and wait for the confirm.
    async fn publish_confirmed<T: Serialize>(
        &self,
        queue: &str,
        message_id: &str,
        message: &T,
    ) -> Result<()> {
        let channel = self.ensure_connected().await?;

        let body = serde_json::to_vec(message).context("Failed to serialize message")?;

        channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into())
                    .with_message_id(message_id.to_string().into()),
            )
            .await
            .with_context(|| format!("Failed to publish to {} queue", queue))?
            .await
            .context("Failed to confirm publish")?;

        info!(
            queue = queue,
            message_id = %message_id,
            body_length = body.len(),
            "rabbitmq_message_published"
        );

        Ok(())
    }

    /// Publish a rejection notice to the rejection_notices queue.
    pub async fn publish_rejection(&self, notice: &RejectionNotice) -> Result<()> {
        let message_id = format!("{}-{}", notice.template, notice.to);
        self.publish(REJECTION_QUEUE, &message_id, notice).await
    }

    /// Publish an operator alert to the operator_alerts queue.
    pub async fn publish_alert(&self, alert: &OperatorAlert) -> Result<()> {
        self.publish(ALERT_QUEUE, "operator-alert", alert).await
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_publisher_closed");
    }
}
