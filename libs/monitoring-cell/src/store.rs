// =====================================================================================
// MONITOR STORE - PERSISTENCE COLLABORATOR
// =====================================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{CheckOutcome, CheckResult, EventMonitor, MonitoringError};

/// Persistence collaborator for monitors and their append-only check log.
/// Soft-deleted monitors are invisible to every query path.
#[async_trait]
pub trait MonitorStore: Send + Sync {
    async fn load(&self, monitor_id: Uuid) -> Result<EventMonitor, MonitoringError>;

    /// Upsert the monitor record.
    async fn save(&self, monitor: &EventMonitor) -> Result<(), MonitoringError>;

    /// Atomically apply a poll outcome: update the monitor's counters and
    /// append the resulting log record in one step, so two concurrent
    /// outcomes for the same monitor never lose a count.
    async fn record_check(
        &self,
        monitor_id: Uuid,
        outcome: CheckOutcome,
    ) -> Result<(EventMonitor, CheckResult), MonitoringError>;

    /// Atomically update the polling interval on a live monitor, leaving
    /// every other field (including counters a concurrent check is bumping)
    /// untouched.
    async fn set_check_interval(
        &self,
        monitor_id: Uuid,
        interval_seconds: u32,
    ) -> Result<EventMonitor, MonitoringError>;

    /// Check log for one monitor, ascending by `checked_at`.
    async fn logs(&self, monitor_id: Uuid) -> Result<Vec<CheckResult>, MonitoringError>;

    /// Check log entries at or after `cutoff`, ascending by `checked_at`.
    async fn logs_since(
        &self,
        monitor_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<CheckResult>, MonitoringError>;

    /// All active, non-deleted monitors.
    async fn list_active(&self) -> Result<Vec<EventMonitor>, MonitoringError>;
}

/// In-memory store used by tests and by hosts without a durable backend.
#[derive(Debug, Default)]
pub struct InMemoryMonitorStore {
    monitors: RwLock<HashMap<Uuid, EventMonitor>>,
    logs: RwLock<HashMap<Uuid, Vec<CheckResult>>>,
}

impl InMemoryMonitorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MonitorStore for InMemoryMonitorStore {
    async fn load(&self, monitor_id: Uuid) -> Result<EventMonitor, MonitoringError> {
        let monitors = self.monitors.read().await;
        monitors
            .get(&monitor_id)
            .filter(|m| !m.is_deleted())
            .cloned()
            .ok_or(MonitoringError::MonitorNotFound(monitor_id))
    }

    async fn save(&self, monitor: &EventMonitor) -> Result<(), MonitoringError> {
        let mut monitors = self.monitors.write().await;
        monitors.insert(monitor.id, monitor.clone());
        Ok(())
    }

    async fn record_check(
        &self,
        monitor_id: Uuid,
        outcome: CheckOutcome,
    ) -> Result<(EventMonitor, CheckResult), MonitoringError> {
        let mut monitors = self.monitors.write().await;
        let monitor = monitors
            .get_mut(&monitor_id)
            .filter(|m| !m.is_deleted())
            .ok_or(MonitoringError::MonitorNotFound(monitor_id))?;

        let result = monitor.apply_check(&outcome);
        let snapshot = monitor.clone();

        let mut logs = self.logs.write().await;
        logs.entry(monitor_id).or_default().push(result.clone());

        Ok((snapshot, result))
    }

    async fn set_check_interval(
        &self,
        monitor_id: Uuid,
        interval_seconds: u32,
    ) -> Result<EventMonitor, MonitoringError> {
        let mut monitors = self.monitors.write().await;
        let monitor = monitors
            .get_mut(&monitor_id)
            .filter(|m| !m.is_deleted())
            .ok_or(MonitoringError::MonitorNotFound(monitor_id))?;

        monitor.check_interval_seconds = interval_seconds;
        Ok(monitor.clone())
    }

    async fn logs(&self, monitor_id: Uuid) -> Result<Vec<CheckResult>, MonitoringError> {
        let logs = self.logs.read().await;
        Ok(logs.get(&monitor_id).cloned().unwrap_or_default())
    }

    async fn logs_since(
        &self,
        monitor_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<CheckResult>, MonitoringError> {
        let logs = self.logs.read().await;
        Ok(logs
            .get(&monitor_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.checked_at >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_active(&self) -> Result<Vec<EventMonitor>, MonitoringError> {
        let monitors = self.monitors.read().await;
        Ok(monitors
            .values()
            .filter(|m| m.is_active && !m.is_deleted())
            .cloned()
            .collect())
    }
}
