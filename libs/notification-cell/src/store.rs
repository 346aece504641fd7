// =====================================================================================
// SUBSCRIPTION STORE - PERSISTENCE COLLABORATOR
// =====================================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{NotificationError, PushSubscription, SubscriptionHealth};

/// Persistence collaborator for push subscriptions. Counter updates are
/// single atomic operations: two simultaneous delivery callbacks for one
/// subscription must both land.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn load(&self, subscription_id: Uuid) -> Result<PushSubscription, NotificationError>;

    /// Upsert the subscription record.
    async fn save(&self, subscription: &PushSubscription) -> Result<(), NotificationError>;

    /// Atomically tally one delivery outcome and return the updated record.
    /// `applied` is false when the subscription is disabled and the outcome
    /// was dropped.
    async fn record_outcome(
        &self,
        subscription_id: Uuid,
        success: bool,
        now: DateTime<Utc>,
    ) -> Result<(PushSubscription, bool), NotificationError>;

    /// Atomically stamp the subscription as used, without touching any other
    /// field a concurrent outcome may be updating.
    async fn mark_used(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PushSubscription, NotificationError>;

    /// Atomically disable the subscription; a second call keeps the first
    /// timestamp.
    async fn disable(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PushSubscription, NotificationError>;
}

/// In-memory store used by tests and by hosts without a durable backend.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<HashMap<Uuid, PushSubscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn load(&self, subscription_id: Uuid) -> Result<PushSubscription, NotificationError> {
        let subscriptions = self.subscriptions.read().await;
        subscriptions
            .get(&subscription_id)
            .cloned()
            .ok_or(NotificationError::SubscriptionNotFound(subscription_id))
    }

    async fn save(&self, subscription: &PushSubscription) -> Result<(), NotificationError> {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn record_outcome(
        &self,
        subscription_id: Uuid,
        success: bool,
        now: DateTime<Utc>,
    ) -> Result<(PushSubscription, bool), NotificationError> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .get_mut(&subscription_id)
            .ok_or(NotificationError::SubscriptionNotFound(subscription_id))?;

        let applied = subscription.apply_outcome(success, now);
        Ok((subscription.clone(), applied))
    }

    async fn mark_used(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PushSubscription, NotificationError> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .get_mut(&subscription_id)
            .ok_or(NotificationError::SubscriptionNotFound(subscription_id))?;

        subscription.mark_used(now);
        Ok(subscription.clone())
    }

    async fn disable(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PushSubscription, NotificationError> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .get_mut(&subscription_id)
            .ok_or(NotificationError::SubscriptionNotFound(subscription_id))?;

        subscription.disable(now);
        Ok(subscription.clone())
    }
}
