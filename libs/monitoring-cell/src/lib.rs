// =====================================================================================
// MONITORING CELL - EVENT MONITOR HEALTH TRACKING
// =====================================================================================
//
// This cell tracks the health of externally polled event monitors:
// - Append-only check result log per monitor
// - Success/failure counters and downtime accounting
// - Rolling health evaluation over a configurable trailing window
// - Check scheduling helpers (overdue detection, interval tuning)
//
// Polling itself is owned by an external scheduler; this cell only records
// outcomes and answers health questions.
//
// =====================================================================================

pub mod models;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use models::{
    CheckOutcome, CheckResult, CheckStatus, EventMonitor, MonitorHealthLevel,
    MonitorHealthMetrics, MonitorHealthReport, MonitoringError,
};

pub use services::MonitorHealthService;
pub use store::{InMemoryMonitorStore, MonitorStore};
