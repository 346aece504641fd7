// =====================================================================================
// NOTIFICATION CELL MODELS
// =====================================================================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared_utils::rate::round2;
use uuid::Uuid;

/// A subscription with no recorded use inside this window is inactive.
pub const ACTIVE_WINDOW_DAYS: i64 = 30;

/// Shared health surface over both subscription variants. The variants
/// deliberately stay distinct: a disabled `PushSubscription` is terminally
/// dead, while a `ChannelSubscription` comes back to life on fresh use.
pub trait SubscriptionHealth {
    fn mark_used(&mut self, now: DateTime<Utc>);
    fn disable(&mut self, now: DateTime<Utc>);
    fn is_active(&self, now: DateTime<Utc>) -> bool;
}

fn used_within_window(last_used_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_used_at {
        Some(at) => now - at <= Duration::days(ACTIVE_WINDOW_DAYS),
        None => false,
    }
}

/// Counter-tracking variant: one record per registered push endpoint, with
/// delivery outcome tallies. Disabling is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub id: Uuid,
    pub endpoint: String,
    pub successful_count: u64,
    pub failed_count: u64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub disabled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PushSubscription {
    pub fn new(endpoint: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint: endpoint.into(),
            successful_count: 0,
            failed_count: 0,
            last_used_at: None,
            disabled_at: None,
            created_at,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_at.is_some()
    }

    /// Delivery success percentage, 0.0 when nothing was ever attempted.
    pub fn success_rate(&self) -> f64 {
        let attempts = self.successful_count + self.failed_count;
        if attempts == 0 {
            return 0.0;
        }
        round2((self.successful_count as f64 / attempts as f64) * 100.0)
    }

    /// Tally one delivery outcome. A disabled subscription ignores outcomes
    /// (terminal state, recorded attempts against it are dropped).
    pub fn apply_outcome(&mut self, success: bool, now: DateTime<Utc>) -> bool {
        if self.is_disabled() {
            return false;
        }
        if success {
            self.successful_count += 1;
            self.last_used_at = Some(now);
        } else {
            self.failed_count += 1;
        }
        true
    }
}

impl SubscriptionHealth for PushSubscription {
    fn mark_used(&mut self, now: DateTime<Utc>) {
        if self.is_disabled() {
            return;
        }
        self.last_used_at = Some(now);
    }

    fn disable(&mut self, now: DateTime<Utc>) {
        if self.disabled_at.is_none() {
            self.disabled_at = Some(now);
        }
    }

    fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_disabled() && used_within_window(self.last_used_at, now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
    Webhook,
}

/// Flag-tracking variant: a per-channel preference that only knows whether
/// it is currently enabled. Fresh use re-enables it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSubscription {
    pub id: Uuid,
    pub channel: NotificationChannel,
    pub is_enabled: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ChannelSubscription {
    pub fn new(channel: NotificationChannel, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel,
            is_enabled: true,
            last_used_at: None,
            created_at,
        }
    }
}

impl SubscriptionHealth for ChannelSubscription {
    fn mark_used(&mut self, now: DateTime<Utc>) {
        self.is_enabled = true;
        self.last_used_at = Some(now);
    }

    fn disable(&mut self, _now: DateTime<Utc>) {
        self.is_enabled = false;
    }

    fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_enabled && used_within_window(self.last_used_at, now)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(Uuid),
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
    fn success_rate_is_zero_without_attempts() {
        let subscription = PushSubscription::new("https://push.example/ep", epoch());
        assert_eq!(subscription.success_rate(), 0.0);
    }

    #[test]
    fn success_rate_inverts_around_fifty_when_counts_swap() {
        let mut a = PushSubscription::new("https://push.example/a", epoch());
        a.successful_count = 30;
        a.failed_count = 10;

        let mut b = PushSubscription::new("https://push.example/b", epoch());
        b.successful_count = 10;
        b.failed_count = 30;

        assert_eq!(a.success_rate(), 75.0);
        assert_eq!(b.success_rate(), 25.0);
        assert_eq!(a.success_rate() + b.success_rate(), 100.0);
    }

    #[test]
    fn mark_used_twice_matches_once() {
        let now = epoch();
        let mut subscription = PushSubscription::new("https://push.example/ep", now);

        subscription.mark_used(now);
        let after_once = subscription.clone();
        subscription.mark_used(now);

        assert_eq!(subscription.last_used_at, after_once.last_used_at);
        assert_eq!(subscription.successful_count, after_once.successful_count);
    }

    #[test]
    fn disabled_push_subscription_stays_dead() {
        let now = epoch();
        let mut subscription = PushSubscription::new("https://push.example/ep", now);
        subscription.mark_used(now);
        assert!(subscription.is_active(now));

        subscription.disable(now);
        assert!(!subscription.is_active(now));

        // Terminal: neither fresh use nor outcomes revive it.
        subscription.mark_used(now);
        assert!(!subscription.is_active(now));
        assert!(!subscription.apply_outcome(true, now));
        assert_eq!(subscription.successful_count, 0);
    }

    #[test]
    fn channel_subscription_revives_on_fresh_use() {
        let now = epoch();
        let mut subscription = ChannelSubscription::new(NotificationChannel::Push, now);
        subscription.mark_used(now);
        assert!(subscription.is_active(now));

        subscription.disable(now);
        assert!(!subscription.is_active(now));

        subscription.mark_used(now);
        assert!(subscription.is_active(now), "flag variant re-enables on use");
    }

    #[test]
    fn disable_is_idempotent() {
        let now = epoch();
        let mut subscription = PushSubscription::new("https://push.example/ep", now);
        subscription.disable(now);
        let first = subscription.disabled_at;

        subscription.disable(now + Duration::days(1));
        assert_eq!(subscription.disabled_at, first, "second disable keeps the first timestamp");
    }

    #[test]
    fn activity_window_boundaries() {
        let now = epoch();
        let mut subscription = PushSubscription::new("https://push.example/ep", now);
        assert!(!subscription.is_active(now), "never-used subscription is inactive");

        subscription.last_used_at = Some(now - Duration::days(29));
        assert!(subscription.is_active(now));

        subscription.last_used_at = Some(now - Duration::days(31));
        assert!(!subscription.is_active(now));
    }
}
