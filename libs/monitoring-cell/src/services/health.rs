// =====================================================================================
// MONITOR HEALTH SERVICE
// =====================================================================================

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::{
    CheckOutcome, CheckResult, CheckStatus, EventMonitor, MonitorHealthLevel,
    MonitorHealthMetrics, MonitorHealthReport, MonitoringError,
};
use crate::store::MonitorStore;
use shared_config::AppConfig;
use shared_utils::clock::Clock;
use shared_utils::rate::round2;

/// Trailing window used for response-time averaging.
const RESPONSE_TIME_WINDOW_DAYS: i64 = 7;
/// Trailing window used for check-frequency and recent-failure evaluation.
const RECENT_ACTIVITY_WINDOW_HOURS: i64 = 24;

const SUCCESS_RATE_WARNING: f64 = 90.0;
const SUCCESS_RATE_CRITICAL: f64 = 70.0;
const RESPONSE_TIME_WARNING_MS: f64 = 5000.0;
const RECENT_FAILURES_CRITICAL: usize = 3;

pub struct MonitorHealthService {
    store: Arc<dyn MonitorStore>,
    clock: Arc<dyn Clock>,
    config: AppConfig,
}

impl MonitorHealthService {
    pub fn new(store: Arc<dyn MonitorStore>, clock: Arc<dyn Clock>, config: AppConfig) -> Self {
        Self { store, clock, config }
    }

    /// Record the outcome of one poll. Appends an immutable log record and
    /// updates the monitor's counters in a single atomic store operation.
    /// Inactive monitors still accept outcomes; activity only gates the
    /// scheduler.
    #[instrument(skip(self, error))]
    pub async fn record_check(
        &self,
        monitor_id: Uuid,
        success: bool,
        response_time_ms: u64,
        error: Option<String>,
    ) -> Result<CheckResult, MonitoringError> {
        let outcome = CheckOutcome {
            success,
            response_time_ms,
            error,
            at: self.clock.now(),
        };

        let (monitor, result) = self.store.record_check(monitor_id, outcome).await?;

        if success {
            debug!(
                monitor_id = %monitor_id,
                response_time_ms,
                total_checks = monitor.total_checks,
                "check succeeded"
            );
        } else {
            warn!(
                monitor_id = %monitor_id,
                downtime_s = result.downtime_duration_s,
                error = result.error_message.as_deref().unwrap_or("unknown"),
                "check failed"
            );
        }

        Ok(result)
    }

    /// A monitor is healthy when the fraction of failed checks within the
    /// trailing window stays below the configured threshold. An empty window
    /// counts as healthy: nothing has been observed failing.
    #[instrument(skip(self))]
    pub async fn is_healthy(
        &self,
        monitor_id: Uuid,
        window_hours: Option<u32>,
    ) -> Result<bool, MonitoringError> {
        let monitor = self.store.load(monitor_id).await?;
        let window = window_hours.unwrap_or(self.config.monitor_health_window_hours);
        let cutoff = self.clock.now() - Duration::hours(i64::from(window));

        let logs = self.store.logs_since(monitor.id, cutoff).await?;
        if logs.is_empty() {
            return Ok(true);
        }

        let failed = logs.iter().filter(|l| l.status == CheckStatus::Failed).count();
        let failed_fraction = failed as f64 / logs.len() as f64;

        Ok(failed_fraction < self.config.monitor_failure_threshold)
    }

    /// Duration since the monitor last succeeded: zero when the most recent
    /// check succeeded (or nothing was ever recorded); measured from the
    /// first recorded check when no check ever succeeded.
    #[instrument(skip(self))]
    pub async fn current_downtime(&self, monitor_id: Uuid) -> Result<Duration, MonitoringError> {
        let monitor = self.store.load(monitor_id).await?;
        let logs = self.store.logs(monitor.id).await?;

        let Some(latest) = logs.last() else {
            return Ok(Duration::zero());
        };
        if latest.status == CheckStatus::Success {
            return Ok(Duration::zero());
        }

        let down_since = logs
            .iter()
            .rev()
            .find(|l| l.status == CheckStatus::Success)
            .map(|l| l.checked_at)
            .unwrap_or_else(|| logs[0].checked_at);

        Ok(self.clock.now() - down_since)
    }

    /// Mean response time over the trailing week, ignoring zero readings and
    /// falling back to the monitor's last known response time.
    pub async fn average_response_time(&self, monitor_id: Uuid) -> Result<f64, MonitoringError> {
        let monitor = self.store.load(monitor_id).await?;
        let cutoff = self.clock.now() - Duration::days(RESPONSE_TIME_WINDOW_DAYS);
        let logs = self.store.logs_since(monitor.id, cutoff).await?;

        let samples: Vec<u64> = logs
            .iter()
            .filter(|l| l.response_time_ms > 0)
            .map(|l| l.response_time_ms)
            .collect();

        if samples.is_empty() {
            return Ok(round2(monitor.last_response_time_ms.unwrap_or(0) as f64));
        }

        let mean = samples.iter().sum::<u64>() as f64 / samples.len() as f64;
        Ok(round2(mean))
    }

    /// Uptime percentage over the trailing window: the window minus the
    /// downtime accounted on failed checks, clamped to [0, 100].
    pub async fn uptime(
        &self,
        monitor_id: Uuid,
        window_hours: Option<u32>,
    ) -> Result<f64, MonitoringError> {
        let monitor = self.store.load(monitor_id).await?;
        let window = window_hours.unwrap_or(self.config.monitor_health_window_hours);
        let window_seconds = i64::from(window) * 3600;
        if window_seconds == 0 {
            return Ok(100.0);
        }
        let cutoff = self.clock.now() - Duration::hours(i64::from(window));

        let logs = self.store.logs_since(monitor.id, cutoff).await?;
        let downtime_seconds: i64 = logs
            .iter()
            .filter(|l| l.status == CheckStatus::Failed)
            .map(|l| l.downtime_duration_s as i64)
            .sum();

        let uptime = ((window_seconds - downtime_seconds) as f64 / window_seconds as f64) * 100.0;
        Ok(round2(uptime.clamp(0.0, 100.0)))
    }

    /// Checks per hour over the trailing day.
    pub async fn check_frequency(&self, monitor_id: Uuid) -> Result<f64, MonitoringError> {
        let monitor = self.store.load(monitor_id).await?;
        let cutoff = self.clock.now() - Duration::hours(RECENT_ACTIVITY_WINDOW_HOURS);
        let logs = self.store.logs_since(monitor.id, cutoff).await?;

        Ok(round2(logs.len() as f64 / RECENT_ACTIVITY_WINDOW_HOURS as f64))
    }

    /// Roll the monitor's recent history up into a Healthy/Warning/Critical
    /// report with human-readable issues.
    #[instrument(skip(self))]
    pub async fn health_report(
        &self,
        monitor_id: Uuid,
    ) -> Result<MonitorHealthReport, MonitoringError> {
        let monitor = self.store.load(monitor_id).await?;
        let now = self.clock.now();

        let mut level = MonitorHealthLevel::Healthy;
        let mut issues = Vec::new();

        let success_rate = monitor.success_rate();
        if success_rate < SUCCESS_RATE_WARNING {
            level = MonitorHealthLevel::Warning;
            issues.push(format!("Low success rate: {success_rate}%"));
        }
        if success_rate < SUCCESS_RATE_CRITICAL {
            level = MonitorHealthLevel::Critical;
        }

        let average_response_time_ms = self.average_response_time(monitor_id).await?;
        if average_response_time_ms > RESPONSE_TIME_WARNING_MS {
            if level == MonitorHealthLevel::Healthy {
                level = MonitorHealthLevel::Warning;
            }
            issues.push(format!("Slow response time: {average_response_time_ms}ms"));
        }

        if monitor.is_overdue(now) {
            if level == MonitorHealthLevel::Healthy {
                level = MonitorHealthLevel::Warning;
            }
            issues.push("Check overdue".to_string());
        }

        let hour_ago = now - Duration::hours(1);
        let recent_failures = self
            .store
            .logs_since(monitor.id, hour_ago)
            .await?
            .iter()
            .filter(|l| l.status == CheckStatus::Failed)
            .count();
        if recent_failures > RECENT_FAILURES_CRITICAL {
            level = MonitorHealthLevel::Critical;
            issues.push(format!("{recent_failures} failures in the last hour"));
        }

        let uptime_percent = self.uptime(monitor_id, None).await?;
        let checks_per_hour = self.check_frequency(monitor_id).await?;

        Ok(MonitorHealthReport {
            monitor_id,
            level,
            issues,
            metrics: MonitorHealthMetrics {
                success_rate,
                average_response_time_ms,
                uptime_percent,
                checks_per_hour,
            },
        })
    }

    /// Lifetime success percentage for the monitor.
    pub async fn success_rate(&self, monitor_id: Uuid) -> Result<f64, MonitoringError> {
        let monitor = self.store.load(monitor_id).await?;
        Ok(monitor.success_rate())
    }

    /// Update the polling interval, clamped to the configured minimum.
    #[instrument(skip(self))]
    pub async fn set_check_interval(
        &self,
        monitor_id: Uuid,
        interval_seconds: u32,
    ) -> Result<EventMonitor, MonitoringError> {
        let clamped = interval_seconds.max(self.config.monitor_min_check_interval_seconds);
        let monitor = self.store.set_check_interval(monitor_id, clamped).await?;

        debug!(
            monitor_id = %monitor_id,
            interval_seconds = monitor.check_interval_seconds,
            "check interval updated"
        );
        Ok(monitor)
    }

    /// Active monitors that are due for a poll, for the external scheduler.
    pub async fn monitors_needing_check(&self) -> Result<Vec<EventMonitor>, MonitoringError> {
        let now = self.clock.now();
        let monitors = self.store.list_active().await?;
        Ok(monitors
            .into_iter()
            .filter(|m| m.should_be_checked(now))
            .collect())
    }
}
