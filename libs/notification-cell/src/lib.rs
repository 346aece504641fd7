// =====================================================================================
// NOTIFICATION CELL - PUSH DELIVERY TRACKING
// =====================================================================================
//
// This cell tracks per-subscription push delivery outcomes:
// - Success/failure counters with an atomic increment per delivery callback
// - Delivery success rate per subscription
// - 30-day activity window deciding whether a subscription is still live
// - Terminal disabling of endpoints that should never be used again
//
// Sending is owned by an external dispatcher; this cell only records the
// outcome of each attempt.
//
// =====================================================================================

pub mod models;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use models::{
    ChannelSubscription, NotificationChannel, NotificationError, PushSubscription,
    SubscriptionHealth, ACTIVE_WINDOW_DAYS,
};

pub use services::DeliveryTrackerService;
pub use store::{InMemorySubscriptionStore, SubscriptionStore};
