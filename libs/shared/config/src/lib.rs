use std::env;
use tracing::warn;

/// Runtime tunables for the tracking cells, loaded once at startup by the
/// host application and passed down to each service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Fraction of failed checks (0.0..=1.0) within the health window at or
    /// above which a monitor is reported unhealthy.
    pub monitor_failure_threshold: f64,
    /// Default trailing window, in hours, for monitor health evaluation.
    pub monitor_health_window_hours: u32,
    /// Lower bound applied when a monitor's check interval is updated.
    pub monitor_min_check_interval_seconds: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            monitor_failure_threshold: parse_env(
                "MONITOR_FAILURE_THRESHOLD",
                Self::default().monitor_failure_threshold,
            ),
            monitor_health_window_hours: parse_env(
                "MONITOR_HEALTH_WINDOW_HOURS",
                Self::default().monitor_health_window_hours,
            ),
            monitor_min_check_interval_seconds: parse_env(
                "MONITOR_MIN_CHECK_INTERVAL_SECONDS",
                Self::default().monitor_min_check_interval_seconds,
            ),
        };

        if !(0.0..=1.0).contains(&config.monitor_failure_threshold) {
            warn!(
                threshold = config.monitor_failure_threshold,
                "MONITOR_FAILURE_THRESHOLD outside 0.0..=1.0, using default"
            );
            return Self {
                monitor_failure_threshold: Self::default().monitor_failure_threshold,
                ..config
            };
        }

        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            monitor_failure_threshold: 0.10,
            monitor_health_window_hours: 24,
            monitor_min_check_interval_seconds: 60,
        }
    }
}

fn parse_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "unparseable value, using default");
            default
        }),
        Err(_) => default,
    }
}
