//! Delivery task draining the notification channel

use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::common::errors::{MonitorError, Result};
use crate::common::types::Notification;
use crate::config::types::NotificationConfig;

/// Logs every notification and forwards it to a webhook when configured
#[derive(Debug, Clone)]
pub struct DeliveryWorker {
    client: Client,
    webhook_url: Option<String>,
}

impl DeliveryWorker {
    pub fn new(config: &NotificationConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }

    /// Deliver one notification; failures are logged, never retried
    pub async fn deliver(&self, notification: &Notification) {
        info!(recipient = %notification.recipient, "{}", notification.text);

        let Some(url) = &self.webhook_url else {
            return;
        };

        match self.client.post(url).json(notification).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Delivered notification to {}", notification.recipient);
            }
            Ok(response) => {
                warn!(
                    "Webhook rejected notification for {}: {}",
                    notification.recipient,
                    response.status()
                );
            }
            Err(e) => {
                warn!("Webhook delivery to {} failed: {}", notification.recipient, e);
            }
        }
    }

    /// Drain the channel until every sender is dropped
    pub fn spawn(self, mut receiver: mpsc::Receiver<Notification>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                self.deliver(&notification).await;
            }
            debug!("Notification channel closed, delivery task exiting");
        })
    }
}
