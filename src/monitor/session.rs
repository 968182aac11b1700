//! Per-user conversation state for multi-step commands
//!
//! Each user has at most one pending input. Expecting a new input replaces
//! the previous one; confirmations carry an expiry after which they are
//! discarded on access.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// How long a destructive confirmation stays valid
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

/// What the next free-text message from a user should be interpreted as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingInput {
    SetAlert,
    DeleteAlert,
    SetCapital,
    SetGlobalMovement,
    SetMovementOverride,
    ConfirmClearAll,
}

impl PendingInput {
    fn expires(&self) -> bool {
        matches!(self, PendingInput::ConfirmClearAll)
    }
}

#[derive(Debug, Clone)]
struct PendingEntry {
    input: PendingInput,
    expires_at: Option<Instant>,
}

impl PendingEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

/// Pending inputs keyed by user id
#[derive(Debug)]
pub struct SessionRegistry {
    pending: RwLock<HashMap<String, PendingEntry>>,
    confirmation_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_confirmation_timeout(CONFIRMATION_TIMEOUT)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirmation_timeout(confirmation_timeout: Duration) -> Self {
        Self {
            pending: RwLock::new(HashMap::new()),
            confirmation_timeout,
        }
    }

    /// Record what the user's next message is for, replacing any prior state
    pub async fn expect(&self, user: &str, input: PendingInput) {
        let expires_at = input
            .expires()
            .then(|| Instant::now() + self.confirmation_timeout);
        debug!(user, ?input, "Awaiting input");
        self.pending
            .write()
            .await
            .insert(user.to_string(), PendingEntry { input, expires_at });
    }

    /// Consume the pending input, if any and not expired
    pub async fn take(&self, user: &str) -> Option<PendingInput> {
        let entry = self.pending.write().await.remove(user)?;
        if entry.is_expired(Instant::now()) {
            debug!(user, input = ?entry.input, "Pending input expired");
            None
        } else {
            Some(entry.input)
        }
    }

    /// Look at the pending input without consuming it
    pub async fn peek(&self, user: &str) -> Option<PendingInput> {
        let now = Instant::now();
        self.pending
            .read()
            .await
            .get(user)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.input.clone())
    }

    pub async fn clear(&self, user: &str) {
        self.pending.write().await.remove(user);
    }
}
