// =====================================================================================
// CAMPAIGN CELL MODELS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_utils::rate::percentage;
use uuid::Uuid;

/// Who a campaign targets. Followable associations are an explicit tagged
/// union rather than a runtime-resolved polymorphic link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Audience {
    Team(Uuid),
    Venue(Uuid),
    AllUsers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub audience: Audience,
    pub created_at: DateTime<Utc>,
}

/// Raw engagement tallies for one campaign. These counters are the source of
/// truth; every rate is derived from them on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignCounters {
    pub campaign_id: Uuid,
    pub total_targets: u64,
    pub messages_sent: u64,
    pub messages_failed: u64,
    pub opens: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub unsubscribes: u64,
}

impl CampaignCounters {
    pub fn new(campaign_id: Uuid, total_targets: u64) -> Self {
        Self {
            campaign_id,
            total_targets,
            messages_sent: 0,
            messages_failed: 0,
            opens: 0,
            clicks: 0,
            conversions: 0,
            unsubscribes: 0,
        }
    }

    /// Derive the five campaign rates. Pure and idempotent: unchanged
    /// counters always produce identical rates, zero denominators produce
    /// 0.0 instead of a division fault.
    pub fn recompute(&self) -> CampaignRates {
        CampaignRates {
            delivery_rate: percentage(self.messages_sent, self.total_targets),
            open_rate: percentage(self.opens, self.messages_sent),
            click_rate: percentage(self.clicks, self.messages_sent),
            conversion_rate: percentage(self.conversions, self.messages_sent),
            unsubscribe_rate: percentage(self.unsubscribes, self.messages_sent),
        }
    }

    /// Overall engagement as a fraction of sent messages.
    pub fn engagement_score(&self) -> f64 {
        percentage(self.opens + self.clicks + self.conversions, self.messages_sent)
    }

    pub fn apply_send(&mut self, success: bool) {
        if success {
            self.messages_sent += 1;
        } else {
            self.messages_failed += 1;
        }
    }

    pub fn apply_engagement(&mut self, action: EngagementAction) {
        match action {
            EngagementAction::Open => self.opens += 1,
            EngagementAction::Click => self.clicks += 1,
            EngagementAction::Conversion => self.conversions += 1,
            EngagementAction::Unsubscribe => self.unsubscribes += 1,
        }
    }
}

/// Derived percentages, all in [0, 100] and rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CampaignRates {
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub conversion_rate: f64,
    pub unsubscribe_rate: f64,
}

/// Counters and their freshly derived rates, read at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignAnalytics {
    pub counters: CampaignCounters,
    pub rates: CampaignRates,
    pub engagement_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementAction {
    Open,
    Click,
    Conversion,
    Unsubscribe,
}

impl EngagementAction {
    pub fn target_status(self) -> MessageStatus {
        match self {
            EngagementAction::Open => MessageStatus::Opened,
            EngagementAction::Click => MessageStatus::Clicked,
            EngagementAction::Conversion => MessageStatus::Converted,
            EngagementAction::Unsubscribe => MessageStatus::Unsubscribed,
        }
    }
}

/// Message lifecycle:
/// `pending -> sent -> {delivered, failed, bounced} -> opened -> clicked ->
/// {converted, unsubscribed}`. Transitions are forward-only and terminal
/// states are never re-entered or left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
    Bounced,
    Opened,
    Clicked,
    Converted,
    Unsubscribed,
}

impl MessageStatus {
    fn stage(self) -> u8 {
        match self {
            MessageStatus::Pending => 0,
            MessageStatus::Sent => 1,
            MessageStatus::Delivered | MessageStatus::Failed | MessageStatus::Bounced => 2,
            MessageStatus::Opened => 3,
            MessageStatus::Clicked => 4,
            MessageStatus::Converted | MessageStatus::Unsubscribed => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MessageStatus::Failed
                | MessageStatus::Bounced
                | MessageStatus::Converted
                | MessageStatus::Unsubscribed
        )
    }

    /// Forward-only: the next status must be a strictly later stage, and
    /// terminal states admit no exit.
    pub fn can_advance_to(self, next: MessageStatus) -> bool {
        !self.is_terminal() && next.stage() > self.stage()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignMessage {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub status: MessageStatus,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl CampaignMessage {
    pub fn new(campaign_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            status: MessageStatus::Pending,
            opened_at: None,
            clicked_at: None,
            updated_at: created_at,
        }
    }

    /// Advance the lifecycle. Returns false (leaving the record untouched)
    /// for backward, repeated, or terminal-exit transitions, so a repeated
    /// open or click is a no-op rather than a second count.
    pub fn advance(&mut self, next: MessageStatus, now: DateTime<Utc>) -> bool {
        if !self.status.can_advance_to(next) {
            return false;
        }

        match next {
            MessageStatus::Opened if self.opened_at.is_none() => self.opened_at = Some(now),
            MessageStatus::Clicked => {
                // A click implies the message was opened.
                if self.opened_at.is_none() {
                    self.opened_at = Some(now);
                }
                if self.clicked_at.is_none() {
                    self.clicked_at = Some(now);
                }
            }
            _ => {}
        }

        self.status = next;
        self.updated_at = now;
        true
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    #[error("Campaign not found: {0}")]
    CampaignNotFound(Uuid),
    #[error("Message not found: {0}")]
    MessageNotFound(Uuid),
    #[error("Store error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn rates_from_reference_counters() {
        let mut counters = CampaignCounters::new(Uuid::new_v4(), 200);
        counters.messages_sent = 180;
        counters.opens = 90;
        counters.clicks = 30;

        let rates = counters.recompute();
        assert_eq!(rates.delivery_rate, 90.0);
        assert_eq!(rates.open_rate, 50.0);
        assert_eq!(rates.click_rate, 16.67);
        assert_eq!(rates.conversion_rate, 0.0);
        assert_eq!(rates.unsubscribe_rate, 0.0);
    }

    #[test]
    fn unsent_campaign_has_all_zero_rates() {
        let mut counters = CampaignCounters::new(Uuid::new_v4(), 0);
        counters.opens = 5;
        counters.clicks = 3;

        let rates = counters.recompute();
        assert_eq!(rates.delivery_rate, 0.0);
        assert_eq!(rates.open_rate, 0.0);
        assert_eq!(rates.click_rate, 0.0);
        assert_eq!(rates.conversion_rate, 0.0);
        assert_eq!(rates.unsubscribe_rate, 0.0);
        assert_eq!(counters.engagement_score(), 0.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut counters = CampaignCounters::new(Uuid::new_v4(), 1000);
        counters.messages_sent = 700;
        counters.opens = 231;
        counters.clicks = 77;
        counters.conversions = 13;
        counters.unsubscribes = 4;

        assert_eq!(counters.recompute(), counters.recompute());
    }

    #[test]
    fn message_lifecycle_is_forward_only() {
        let mut message = CampaignMessage::new(Uuid::new_v4(), epoch());

        assert!(message.advance(MessageStatus::Sent, epoch()));
        assert!(message.advance(MessageStatus::Delivered, epoch()));
        assert!(message.advance(MessageStatus::Opened, epoch()));
        assert!(!message.advance(MessageStatus::Sent, epoch()), "no going backward");
        assert!(!message.advance(MessageStatus::Opened, epoch()), "no re-entry");
        assert!(message.advance(MessageStatus::Clicked, epoch()));
        assert!(message.advance(MessageStatus::Converted, epoch()));
        assert!(!message.advance(MessageStatus::Unsubscribed, epoch()), "terminal states admit no exit");
    }

    #[test]
    fn failed_message_stays_failed() {
        let mut message = CampaignMessage::new(Uuid::new_v4(), epoch());
        assert!(message.advance(MessageStatus::Failed, epoch()));
        assert!(!message.advance(MessageStatus::Opened, epoch()));
        assert_eq!(message.status, MessageStatus::Failed);
    }

    #[test]
    fn repeated_open_keeps_first_timestamp() {
        let mut message = CampaignMessage::new(Uuid::new_v4(), epoch());
        message.advance(MessageStatus::Sent, epoch());
        message.advance(MessageStatus::Delivered, epoch());

        let first_open = epoch();
        assert!(message.advance(MessageStatus::Opened, first_open));
        let later = epoch() + chrono::Duration::hours(1);
        assert!(!message.advance(MessageStatus::Opened, later));
        assert_eq!(message.opened_at, Some(first_open));
    }
}
