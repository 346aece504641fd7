// =====================================================================================
// CAMPAIGN STORE - PERSISTENCE COLLABORATOR
// =====================================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Campaign, CampaignCounters, CampaignError, CampaignMessage, EngagementAction, MessageStatus,
};

/// Persistence collaborator for campaigns, their counters, and their
/// messages. Delivery and engagement events mutate a message and its
/// campaign's counters in one atomic step, so concurrent callbacks never
/// lose a count and a counter is only bumped when the message actually
/// transitioned.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn load_campaign(&self, campaign_id: Uuid) -> Result<Campaign, CampaignError>;

    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), CampaignError>;

    async fn load_counters(&self, campaign_id: Uuid) -> Result<CampaignCounters, CampaignError>;

    async fn save_counters(&self, counters: &CampaignCounters) -> Result<(), CampaignError>;

    async fn load_message(&self, message_id: Uuid) -> Result<CampaignMessage, CampaignError>;

    async fn save_message(&self, message: &CampaignMessage) -> Result<(), CampaignError>;

    /// Atomically record a send attempt: advance the message to Sent or
    /// Failed and bump the matching campaign counter. Applies only from
    /// Pending, so a replayed callback after the first outcome landed is a
    /// no-op. Returns the message and whether anything was applied.
    async fn record_send(
        &self,
        campaign_id: Uuid,
        message_id: Uuid,
        success: bool,
        now: DateTime<Utc>,
    ) -> Result<(CampaignMessage, bool), CampaignError>;

    /// Atomically advance a message to Delivered or Bounced. Touches no
    /// campaign counters, but still runs under the message write lock so a
    /// racing engagement transition is never clobbered.
    async fn mark_delivery_result(
        &self,
        message_id: Uuid,
        delivered: bool,
        now: DateTime<Utc>,
    ) -> Result<(CampaignMessage, bool), CampaignError>;

    /// Atomically record an engagement action with the same
    /// first-transition-only counting rule.
    async fn record_engagement(
        &self,
        campaign_id: Uuid,
        message_id: Uuid,
        action: EngagementAction,
        now: DateTime<Utc>,
    ) -> Result<(CampaignMessage, bool), CampaignError>;
}

/// In-memory store used by tests and by hosts without a durable backend.
#[derive(Debug, Default)]
pub struct InMemoryCampaignStore {
    campaigns: RwLock<HashMap<Uuid, Campaign>>,
    counters: RwLock<HashMap<Uuid, CampaignCounters>>,
    messages: RwLock<HashMap<Uuid, CampaignMessage>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn load_campaign(&self, campaign_id: Uuid) -> Result<Campaign, CampaignError> {
        let campaigns = self.campaigns.read().await;
        campaigns
            .get(&campaign_id)
            .cloned()
            .ok_or(CampaignError::CampaignNotFound(campaign_id))
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), CampaignError> {
        let mut campaigns = self.campaigns.write().await;
        campaigns.insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn load_counters(&self, campaign_id: Uuid) -> Result<CampaignCounters, CampaignError> {
        let counters = self.counters.read().await;
        counters
            .get(&campaign_id)
            .cloned()
            .ok_or(CampaignError::CampaignNotFound(campaign_id))
    }

    async fn save_counters(&self, counters: &CampaignCounters) -> Result<(), CampaignError> {
        let mut all = self.counters.write().await;
        all.insert(counters.campaign_id, counters.clone());
        Ok(())
    }

    async fn load_message(&self, message_id: Uuid) -> Result<CampaignMessage, CampaignError> {
        let messages = self.messages.read().await;
        messages
            .get(&message_id)
            .cloned()
            .ok_or(CampaignError::MessageNotFound(message_id))
    }

    async fn save_message(&self, message: &CampaignMessage) -> Result<(), CampaignError> {
        let mut messages = self.messages.write().await;
        messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn record_send(
        &self,
        campaign_id: Uuid,
        message_id: Uuid,
        success: bool,
        now: DateTime<Utc>,
    ) -> Result<(CampaignMessage, bool), CampaignError> {
        let mut counters = self.counters.write().await;
        let campaign_counters = counters
            .get_mut(&campaign_id)
            .ok_or(CampaignError::CampaignNotFound(campaign_id))?;

        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&message_id)
            .ok_or(CampaignError::MessageNotFound(message_id))?;

        let next = if success {
            MessageStatus::Sent
        } else {
            MessageStatus::Failed
        };
        // Only the first outcome for a message counts. Without the Pending
        // gate a replayed failure callback could move a Sent message to
        // Failed and double-count the send.
        let applied =
            message.status == MessageStatus::Pending && message.advance(next, now);
        if applied {
            campaign_counters.apply_send(success);
        }

        Ok((message.clone(), applied))
    }

    async fn mark_delivery_result(
        &self,
        message_id: Uuid,
        delivered: bool,
        now: DateTime<Utc>,
    ) -> Result<(CampaignMessage, bool), CampaignError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&message_id)
            .ok_or(CampaignError::MessageNotFound(message_id))?;

        let next = if delivered {
            MessageStatus::Delivered
        } else {
            MessageStatus::Bounced
        };
        let applied = message.advance(next, now);

        Ok((message.clone(), applied))
    }

    async fn record_engagement(
        &self,
        campaign_id: Uuid,
        message_id: Uuid,
        action: EngagementAction,
        now: DateTime<Utc>,
    ) -> Result<(CampaignMessage, bool), CampaignError> {
        let mut counters = self.counters.write().await;
        let campaign_counters = counters
            .get_mut(&campaign_id)
            .ok_or(CampaignError::CampaignNotFound(campaign_id))?;

        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&message_id)
            .ok_or(CampaignError::MessageNotFound(message_id))?;

        let applied = message.advance(action.target_status(), now);
        if applied {
            campaign_counters.apply_engagement(action);
        }

        Ok((message.clone(), applied))
    }
}
