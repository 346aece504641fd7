// =====================================================================================
// CAMPAIGN CELL - MARKETING CAMPAIGN ENGAGEMENT ANALYTICS
// =====================================================================================
//
// This cell tracks raw engagement tallies for marketing sends and derives
// the campaign rates from them:
// - Per-campaign counters with atomic increments per delivery/engagement event
// - Forward-only message lifecycle (no double-counted opens or clicks)
// - Stateless rate recomputation: rates are derived, never stored as truth
//
// Message dispatch is owned by an external sender; this cell only records
// what happened to each message.
//
// =====================================================================================

pub mod models;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use models::{
    Audience, Campaign, CampaignAnalytics, CampaignCounters, CampaignError, CampaignMessage,
    CampaignRates, EngagementAction, MessageStatus,
};

pub use services::CampaignAnalyticsService;
pub use store::{CampaignStore, InMemoryCampaignStore};
