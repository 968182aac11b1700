//! Notification sinks
//!
//! The monitor hands messages to a [`ChannelNotifier`]; a separate delivery
//! task drains the channel so slow delivery never stalls a monitoring cycle.

pub mod delivery;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::common::errors::{MonitorError, Result};
use crate::common::traits::NotificationSink;
use crate::common::types::Notification;

pub use delivery::DeliveryWorker;

/// Sink that queues notifications on a bounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::Sender<Notification>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl NotificationSink for ChannelNotifier {
    async fn send(&self, recipient: &str, message: &str) -> Result<()> {
        let notification = Notification {
            recipient: recipient.to_string(),
            text: message.to_string(),
        };

        self.sender.try_send(notification).map_err(|e| match e {
            TrySendError::Full(_) => {
                MonitorError::Notification("notification queue is full".to_string())
            }
            TrySendError::Closed(_) => {
                MonitorError::Notification("notification queue is closed".to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::channels::create_notification_channel_with_size;

    #[tokio::test]
    async fn test_send_queues_notification() {
        let (tx, mut rx) = create_notification_channel_with_size(4);
        let notifier = ChannelNotifier::new(tx);

        notifier.send("owner", "hello").await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.recipient, "owner");
        assert_eq!(received.text, "hello");
    }

    #[tokio::test]
    async fn test_full_queue_is_reported() {
        let (tx, _rx) = create_notification_channel_with_size(1);
        let notifier = ChannelNotifier::new(tx);

        notifier.send("owner", "first").await.unwrap();
        let result = notifier.send("owner", "second").await;
        assert!(matches!(result, Err(MonitorError::Notification(_))));
    }

    #[tokio::test]
    async fn test_closed_queue_is_reported() {
        let (tx, rx) = create_notification_channel_with_size(1);
        drop(rx);
        let notifier = ChannelNotifier::new(tx);
        assert!(notifier.send("owner", "lost").await.is_err());
    }
}
