use time::OffsetDateTime;

use crate::types::push::Subscription;

/// Store unreachable or a write failed. Surfaced to the caller as-is; no
/// component retries storage operations internally.
#[derive(Debug)]
pub struct StorageError {
    message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "storage error: {}", self.message)
    }
}

/// Persistence seam for subscriptions and broadcast records. Implementations
/// must serialize conflicting writes on the same endpoint; removing an absent
/// endpoint is a no-op, not an error.
pub trait Store: Clone + Send + Sync + 'static {
    fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), StorageError>;
    fn remove_subscription(&self, endpoint: &str) -> Result<(), StorageError>;
    /// Finite snapshot; no ordering guarantee.
    fn list_subscriptions(&self) -> Result<Vec<Subscription>, StorageError>;
    fn last_broadcast(&self, milestone_key: &str) -> Result<Option<OffsetDateTime>, StorageError>;
    fn record_broadcast(
        &self,
        milestone_key: &str,
        sent_at: OffsetDateTime,
    ) -> Result<(), StorageError>;
}
