// =====================================================================================
// DELIVERY TRACKER SERVICE
// =====================================================================================

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::{NotificationError, PushSubscription, SubscriptionHealth};
use crate::store::SubscriptionStore;
use shared_utils::clock::Clock;

/// Tracks delivery outcomes reported by the external push dispatcher and
/// answers whether a subscription is still worth sending to.
pub struct DeliveryTrackerService {
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
}

impl DeliveryTrackerService {
    pub fn new(store: Arc<dyn SubscriptionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Tally one delivery attempt. A success also refreshes `last_used_at`.
    /// Outcomes against a disabled subscription are dropped as a no-op, not
    /// an error: the dispatcher may race with a disable.
    #[instrument(skip(self))]
    pub async fn record_outcome(
        &self,
        subscription_id: Uuid,
        success: bool,
    ) -> Result<PushSubscription, NotificationError> {
        let now = self.clock.now();
        let (subscription, applied) = self.store.record_outcome(subscription_id, success, now).await?;

        if !applied {
            warn!(
                subscription_id = %subscription_id,
                "outcome for disabled subscription dropped"
            );
        } else {
            debug!(
                subscription_id = %subscription_id,
                success,
                successful_count = subscription.successful_count,
                failed_count = subscription.failed_count,
                "delivery outcome recorded"
            );
        }

        Ok(subscription)
    }

    /// Delivery success percentage rounded to two decimals, 0.0 for a
    /// subscription that was never attempted.
    pub async fn success_rate(&self, subscription_id: Uuid) -> Result<f64, NotificationError> {
        let subscription = self.store.load(subscription_id).await?;
        Ok(subscription.success_rate())
    }

    /// Active iff not disabled and used within the trailing 30 days.
    pub async fn is_active(&self, subscription_id: Uuid) -> Result<bool, NotificationError> {
        let subscription = self.store.load(subscription_id).await?;
        Ok(subscription.is_active(self.clock.now()))
    }

    /// Stamp the subscription as used right now. Idempotent for a given
    /// instant; ignored on a disabled subscription. Atomic in the store, so
    /// it never clobbers a concurrently tallied outcome.
    #[instrument(skip(self))]
    pub async fn mark_used(
        &self,
        subscription_id: Uuid,
    ) -> Result<PushSubscription, NotificationError> {
        self.store.mark_used(subscription_id, self.clock.now()).await
    }

    /// Terminally disable the subscription. Idempotent: a second call keeps
    /// the original disable timestamp.
    #[instrument(skip(self))]
    pub async fn disable(
        &self,
        subscription_id: Uuid,
    ) -> Result<PushSubscription, NotificationError> {
        let subscription = self.store.disable(subscription_id, self.clock.now()).await?;

        debug!(subscription_id = %subscription_id, "subscription disabled");
        Ok(subscription)
    }
}
