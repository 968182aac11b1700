//! Channel type definitions for inter-task communication

use tokio::sync::mpsc;

use super::types::Notification;

/// Default channel buffer size
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;

/// Create a new notification channel with a custom buffer size
pub fn create_notification_channel_with_size(
    size: usize,
) -> (mpsc::Sender<Notification>, mpsc::Receiver<Notification>) {
    mpsc::channel(size.max(1))
}
