// =====================================================================================
// NOTIFICATION DELIVERY TRACKER INTEGRATION TESTS
// =====================================================================================

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Duration;
use uuid::Uuid;

use notification_cell::{
    DeliveryTrackerService, InMemorySubscriptionStore, NotificationError, PushSubscription,
    SubscriptionStore,
};
use shared_utils::test_utils::FixedClock;
use shared_utils::Clock;

struct Harness {
    store: Arc<InMemorySubscriptionStore>,
    clock: Arc<FixedClock>,
    service: DeliveryTrackerService,
}

fn setup() -> Harness {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let clock = Arc::new(FixedClock::default_epoch());
    let service = DeliveryTrackerService::new(store.clone(), clock.clone());
    Harness { store, clock, service }
}

async fn seed_subscription(harness: &Harness) -> PushSubscription {
    let subscription =
        PushSubscription::new("https://push.example/endpoint", harness.clock.now());
    harness
        .store
        .save(&subscription)
        .await
        .expect("Failed to seed subscription");
    subscription
}

#[tokio::test]
async fn fresh_subscription_has_zero_rate_and_is_inactive() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;

    assert_eq!(
        harness.service.success_rate(subscription.id).await.expect("Failed to get rate"),
        0.0
    );
    assert!(!harness
        .service
        .is_active(subscription.id)
        .await
        .expect("Failed to check activity"));
}

#[tokio::test]
async fn one_success_is_a_full_rate_and_activates() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;

    harness
        .service
        .record_outcome(subscription.id, true)
        .await
        .expect("Failed to record outcome");

    assert_eq!(harness.service.success_rate(subscription.id).await.unwrap(), 100.0);
    assert!(harness.service.is_active(subscription.id).await.unwrap());
}

#[tokio::test]
async fn success_rate_rounds_to_two_decimals() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;

    // 1 success, 2 failures: 33.333...% rounds to 33.33.
    harness.service.record_outcome(subscription.id, true).await.unwrap();
    harness.service.record_outcome(subscription.id, false).await.unwrap();
    harness.service.record_outcome(subscription.id, false).await.unwrap();

    assert_eq!(harness.service.success_rate(subscription.id).await.unwrap(), 33.33);
}

#[tokio::test]
async fn failures_do_not_refresh_last_used() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;

    harness.service.record_outcome(subscription.id, false).await.unwrap();

    let stored = harness.store.load(subscription.id).await.unwrap();
    assert_eq!(stored.failed_count, 1);
    assert_eq!(stored.last_used_at, None);
    assert!(!harness.service.is_active(subscription.id).await.unwrap());
}

#[tokio::test]
async fn activity_expires_after_thirty_days() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;

    harness.service.record_outcome(subscription.id, true).await.unwrap();

    harness.clock.advance(Duration::days(29));
    assert!(harness.service.is_active(subscription.id).await.unwrap());

    harness.clock.advance(Duration::days(2));
    assert!(!harness.service.is_active(subscription.id).await.unwrap());
}

#[tokio::test]
async fn disable_is_terminal_for_push_subscriptions() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;

    harness.service.record_outcome(subscription.id, true).await.unwrap();
    assert!(harness.service.is_active(subscription.id).await.unwrap());

    harness.service.disable(subscription.id).await.expect("Failed to disable");
    assert!(!harness.service.is_active(subscription.id).await.unwrap());

    // Further outcomes are dropped, counters and rate stay frozen.
    let after = harness.service.record_outcome(subscription.id, true).await.unwrap();
    assert_eq!(after.successful_count, 1);
    assert_eq!(harness.service.success_rate(subscription.id).await.unwrap(), 100.0);
    assert!(!harness.service.is_active(subscription.id).await.unwrap());
}

#[tokio::test]
async fn disable_twice_keeps_first_timestamp() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;

    let first = harness.service.disable(subscription.id).await.unwrap();
    harness.clock.advance(Duration::hours(1));
    let second = harness.service.disable(subscription.id).await.unwrap();

    assert_eq!(second.disabled_at, first.disabled_at);
}

#[tokio::test]
async fn mark_used_twice_is_idempotent() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;

    let once = harness.service.mark_used(subscription.id).await.expect("Failed to mark");
    let twice = harness.service.mark_used(subscription.id).await.expect("Failed to mark");

    assert_eq!(once.last_used_at, twice.last_used_at);
    assert_eq!(once.successful_count, twice.successful_count);
    assert!(harness.service.is_active(subscription.id).await.unwrap());
}

#[tokio::test]
async fn unknown_subscription_is_not_found() {
    let harness = setup();
    let missing = Uuid::new_v4();

    assert_matches!(
        harness.service.record_outcome(missing, true).await,
        Err(NotificationError::SubscriptionNotFound(id)) if id == missing
    );
    assert_matches!(
        harness.service.success_rate(missing).await,
        Err(NotificationError::SubscriptionNotFound(_))
    );
}

#[tokio::test]
async fn marks_racing_outcomes_lose_no_counts() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;
    let service = Arc::new(harness.service);

    let mut handles = Vec::new();
    for i in 0..100u64 {
        let service = service.clone();
        let id = subscription.id;
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                service.record_outcome(id, true).await.expect("Failed to record");
            } else {
                service.mark_used(id).await.expect("Failed to mark");
            }
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked");
    }

    let stored = harness.store.load(subscription.id).await.unwrap();
    assert_eq!(stored.successful_count, 50, "usage stamps must not clobber tallies");
    assert_eq!(stored.failed_count, 0);
    assert!(stored.last_used_at.is_some());
}

#[tokio::test]
async fn concurrent_outcomes_lose_no_counts() {
    let harness = setup();
    let subscription = seed_subscription(&harness).await;
    let service = Arc::new(harness.service);

    let mut handles = Vec::new();
    for i in 0..100u64 {
        let service = service.clone();
        let id = subscription.id;
        handles.push(tokio::spawn(async move {
            service.record_outcome(id, i % 4 != 0).await.expect("Failed to record")
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked");
    }

    let stored = harness.store.load(subscription.id).await.unwrap();
    assert_eq!(stored.successful_count, 75);
    assert_eq!(stored.failed_count, 25);
    assert_eq!(stored.success_rate(), 75.0);
}
