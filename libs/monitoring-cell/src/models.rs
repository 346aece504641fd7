// =====================================================================================
// MONITORING CELL MODELS
// =====================================================================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared_utils::rate::round2;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    Failed,
}

/// Outcome of a single poll, as reported by the external scheduler.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub success: bool,
    pub response_time_ms: u64,
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

/// Immutable log record appended for every poll. Never mutated or deleted;
/// `checked_at` is monotonic per monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub monitor_id: Uuid,
    pub status: CheckStatus,
    pub response_time_ms: u64,
    /// Downtime attributed to this check: seconds since the previous check,
    /// 0 for successful checks. Per-log values are disjoint, so summing them
    /// over a window gives the total downtime in that window.
    pub downtime_duration_s: u64,
    pub error_message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMonitor {
    pub id: Uuid,
    pub event_id: Uuid,
    pub is_active: bool,
    pub check_interval_seconds: u32,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_checks: u64,
    pub last_check_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_response_time_ms: Option<u64>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EventMonitor {
    pub const DEFAULT_CHECK_INTERVAL_SECONDS: u32 = 300;

    pub fn new(event_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            is_active: true,
            check_interval_seconds: Self::DEFAULT_CHECK_INTERVAL_SECONDS,
            success_count: 0,
            failure_count: 0,
            total_checks: 0,
            last_check_at: None,
            last_success_at: None,
            last_response_time_ms: None,
            last_error: None,
            created_at,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Apply a poll outcome: bump counters, stamp timestamps, and produce the
    /// immutable log record for the append-only check history. Called by the
    /// store under its write lock so concurrent outcomes never lose a count.
    pub fn apply_check(&mut self, outcome: &CheckOutcome) -> CheckResult {
        let downtime_duration_s = if outcome.success {
            0
        } else {
            // Only the gap since the previous check, keeping per-log values
            // disjoint across a run of consecutive failures.
            self.last_check_at
                .map(|prev| (outcome.at - prev).num_seconds().max(0) as u64)
                .unwrap_or(0)
        };

        self.total_checks += 1;
        self.last_check_at = Some(outcome.at);

        if outcome.success {
            self.success_count += 1;
            self.last_success_at = Some(outcome.at);
            self.last_response_time_ms = Some(outcome.response_time_ms);
            self.last_error = None;
        } else {
            self.failure_count += 1;
            self.last_error = outcome.error.clone();
        }

        CheckResult {
            monitor_id: self.id,
            status: if outcome.success {
                CheckStatus::Success
            } else {
                CheckStatus::Failed
            },
            response_time_ms: outcome.response_time_ms,
            downtime_duration_s,
            error_message: outcome.error.clone(),
            checked_at: outcome.at,
        }
    }

    /// Lifetime success percentage. A monitor that has never been checked
    /// reports 100.0: no failures have been observed.
    pub fn success_rate(&self) -> f64 {
        if self.total_checks == 0 {
            return 100.0;
        }
        round2((self.success_count as f64 / self.total_checks as f64) * 100.0)
    }

    pub fn failure_rate(&self) -> f64 {
        round2(100.0 - self.success_rate())
    }

    pub fn next_check_due(&self) -> Option<DateTime<Utc>> {
        if !self.is_active {
            return None;
        }
        self.last_check_at
            .map(|at| at + Duration::seconds(i64::from(self.check_interval_seconds)))
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.next_check_due() {
            Some(due) => now > due,
            None => false,
        }
    }

    /// Whether the external scheduler should poll this monitor now: active
    /// and either never checked or past its interval.
    pub fn should_be_checked(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.last_check_at {
            None => true,
            Some(_) => self.is_overdue(now),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorHealthLevel {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorHealthMetrics {
    pub success_rate: f64,
    pub average_response_time_ms: f64,
    pub uptime_percent: f64,
    pub checks_per_hour: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorHealthReport {
    pub monitor_id: Uuid,
    pub level: MonitorHealthLevel,
    pub issues: Vec<String>,
    pub metrics: MonitorHealthMetrics,
}

#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    #[error("Monitor not found: {0}")]
    MonitorNotFound(Uuid),
    #[error("Store error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn unchecked_monitor_reports_full_success_rate() {
        let monitor = EventMonitor::new(Uuid::new_v4(), at(0, 0));
        assert_eq!(monitor.success_rate(), 100.0);
        assert_eq!(monitor.failure_rate(), 0.0);
    }

    #[test]
    fn apply_check_tracks_counters_and_timestamps() {
        let mut monitor = EventMonitor::new(Uuid::new_v4(), at(0, 0));

        let ok = monitor.apply_check(&CheckOutcome {
            success: true,
            response_time_ms: 120,
            error: None,
            at: at(1, 0),
        });
        assert_eq!(ok.status, CheckStatus::Success);
        assert_eq!(ok.downtime_duration_s, 0);
        assert_eq!(monitor.success_count, 1);
        assert_eq!(monitor.last_success_at, Some(at(1, 0)));
        assert_eq!(monitor.last_response_time_ms, Some(120));

        let failed = monitor.apply_check(&CheckOutcome {
            success: false,
            response_time_ms: 0,
            error: Some("timeout".to_string()),
            at: at(1, 30),
        });
        assert_eq!(failed.status, CheckStatus::Failed);
        assert_eq!(failed.downtime_duration_s, 30 * 60);
        assert_eq!(monitor.failure_count, 1);
        assert_eq!(monitor.last_error.as_deref(), Some("timeout"));
        // A failed check leaves the last success timestamp untouched.
        assert_eq!(monitor.last_success_at, Some(at(1, 0)));

        assert_eq!(monitor.success_rate(), 50.0);
    }

    #[test]
    fn consecutive_failures_attribute_disjoint_downtime() {
        let mut monitor = EventMonitor::new(Uuid::new_v4(), at(0, 0));
        monitor.apply_check(&CheckOutcome {
            success: true,
            response_time_ms: 100,
            error: None,
            at: at(1, 0),
        });

        let first = monitor.apply_check(&CheckOutcome {
            success: false,
            response_time_ms: 0,
            error: None,
            at: at(1, 30),
        });
        let second = monitor.apply_check(&CheckOutcome {
            success: false,
            response_time_ms: 0,
            error: None,
            at: at(2, 0),
        });

        assert_eq!(first.downtime_duration_s, 30 * 60);
        // Only the gap since the previous failure, not since the last success.
        assert_eq!(second.downtime_duration_s, 30 * 60);
    }

    #[test]
    fn scheduling_helpers_follow_the_interval() {
        let mut monitor = EventMonitor::new(Uuid::new_v4(), at(0, 0));
        assert!(monitor.should_be_checked(at(0, 0)), "never-checked monitor is due");

        monitor.apply_check(&CheckOutcome {
            success: true,
            response_time_ms: 90,
            error: None,
            at: at(1, 0),
        });
        assert!(!monitor.is_overdue(at(1, 2)));
        assert!(monitor.is_overdue(at(1, 6)));

        monitor.is_active = false;
        assert!(!monitor.should_be_checked(at(2, 0)));
        assert_eq!(monitor.next_check_due(), None);
    }
}
