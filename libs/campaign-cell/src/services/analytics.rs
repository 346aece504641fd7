// =====================================================================================
// CAMPAIGN ANALYTICS SERVICE
// =====================================================================================

use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::{
    Audience, Campaign, CampaignAnalytics, CampaignCounters, CampaignError, CampaignMessage,
    EngagementAction,
};
use crate::store::CampaignStore;
use shared_utils::clock::Clock;

/// Records delivery and engagement events reported by the external sender
/// and derives campaign rates on demand.
pub struct CampaignAnalyticsService {
    store: Arc<dyn CampaignStore>,
    clock: Arc<dyn Clock>,
}

impl CampaignAnalyticsService {
    pub fn new(store: Arc<dyn CampaignStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register a campaign and seed its counters with the target count.
    #[instrument(skip(self, name))]
    pub async fn create_campaign(
        &self,
        name: impl Into<String> + Send,
        audience: Audience,
        total_targets: u64,
    ) -> Result<Campaign, CampaignError> {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: name.into(),
            audience,
            created_at: self.clock.now(),
        };

        self.store.save_campaign(&campaign).await?;
        self.store
            .save_counters(&CampaignCounters::new(campaign.id, total_targets))
            .await?;

        debug!(campaign_id = %campaign.id, total_targets, "campaign created");
        Ok(campaign)
    }

    /// Create a pending message for the campaign, ready for dispatch.
    pub async fn add_message(&self, campaign_id: Uuid) -> Result<CampaignMessage, CampaignError> {
        let campaign = self.store.load_campaign(campaign_id).await?;
        let message = CampaignMessage::new(campaign.id, self.clock.now());
        self.store.save_message(&message).await?;
        Ok(message)
    }

    /// Record the outcome of a send attempt. Only the message's first
    /// pending-to-sent (or -failed) transition counts; replayed callbacks
    /// are no-ops.
    #[instrument(skip(self))]
    pub async fn record_send(
        &self,
        campaign_id: Uuid,
        message_id: Uuid,
        success: bool,
    ) -> Result<CampaignMessage, CampaignError> {
        let now = self.clock.now();
        let (message, applied) = self
            .store
            .record_send(campaign_id, message_id, success, now)
            .await?;

        if !applied {
            debug!(
                message_id = %message_id,
                status = ?message.status,
                "send outcome ignored, message already past pending"
            );
        }
        Ok(message)
    }

    /// Advance a message to Delivered or Bounced after the send. Neither
    /// touches the campaign counters; delivery quality is tracked on the
    /// message itself. Atomic in the store, so a racing engagement
    /// transition is never clobbered.
    pub async fn mark_delivery_result(
        &self,
        message_id: Uuid,
        delivered: bool,
    ) -> Result<CampaignMessage, CampaignError> {
        let (message, _applied) = self
            .store
            .mark_delivery_result(message_id, delivered, self.clock.now())
            .await?;
        Ok(message)
    }

    /// Record an engagement action. The campaign counter is bumped only when
    /// the message actually transitioned, so a double open or click never
    /// counts twice.
    #[instrument(skip(self))]
    pub async fn record_engagement(
        &self,
        campaign_id: Uuid,
        message_id: Uuid,
        action: EngagementAction,
    ) -> Result<CampaignMessage, CampaignError> {
        let now = self.clock.now();
        let (message, applied) = self
            .store
            .record_engagement(campaign_id, message_id, action, now)
            .await?;

        if applied {
            debug!(
                campaign_id = %campaign_id,
                message_id = %message_id,
                action = ?action,
                "engagement recorded"
            );
        }
        Ok(message)
    }

    /// Counters plus freshly recomputed rates, read at one point in time.
    /// A reader racing concurrent increments sees a stale but internally
    /// consistent snapshot.
    pub async fn snapshot(&self, campaign_id: Uuid) -> Result<CampaignAnalytics, CampaignError> {
        let counters = self.store.load_counters(campaign_id).await?;
        let rates = counters.recompute();
        let engagement_score = counters.engagement_score();

        Ok(CampaignAnalytics {
            counters,
            rates,
            engagement_score,
        })
    }

    pub async fn engagement_score(&self, campaign_id: Uuid) -> Result<f64, CampaignError> {
        let counters = self.store.load_counters(campaign_id).await?;
        Ok(counters.engagement_score())
    }
}
