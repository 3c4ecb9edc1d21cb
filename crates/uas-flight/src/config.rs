//! Flight manager configuration from environment.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FlightConfig {
    /// How long a handoff waits for the final waypoint of the active mission
    pub advance_timeout: Duration,
    /// Pause between uploading the takeoff mission and switching to AUTO
    pub settle_delay: Duration,
    /// Interval between waypoint-reached polls
    pub poll_interval: Duration,
    /// Pause before the driver resends the land mission after a failed handoff
    pub recovery_delay: Duration,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            advance_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(1),
            poll_interval: Duration::from_millis(250),
            recovery_delay: Duration::from_secs(30),
        }
    }
}

impl FlightConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from a variable lookup. Unset, unparsable and zero values fall
    /// back to the defaults.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| {
            var(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
        };
        Self {
            advance_timeout: number("UAS_ADVANCE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.advance_timeout),
            settle_delay: number("UAS_SETTLE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay),
            poll_interval: number("UAS_POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            recovery_delay: number("UAS_RECOVERY_DELAY_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.recovery_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_handoff_timeout_is_thirty_seconds() {
        let config = FlightConfig::default();
        assert_eq!(config.advance_timeout, Duration::from_secs(30));
        assert_eq!(config.settle_delay, Duration::from_secs(1));
    }

    #[test]
    fn reads_overrides_from_vars() {
        let vars = HashMap::from([
            ("UAS_ADVANCE_TIMEOUT_SECS", "45"),
            ("UAS_SETTLE_DELAY_MS", "500"),
            ("UAS_POLL_INTERVAL_MS", " 100 "),
            ("UAS_RECOVERY_DELAY_SECS", "10"),
        ]);
        let config = FlightConfig::from_vars(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.advance_timeout, Duration::from_secs(45));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.recovery_delay, Duration::from_secs(10));
    }

    #[test]
    fn zero_and_garbage_fall_back_to_defaults() {
        let vars = HashMap::from([
            ("UAS_ADVANCE_TIMEOUT_SECS", "soon"),
            ("UAS_POLL_INTERVAL_MS", "0"),
            ("UAS_SETTLE_DELAY_MS", "-1"),
        ]);
        let config = FlightConfig::from_vars(|key| vars.get(key).map(|v| v.to_string()));
        let defaults = FlightConfig::default();

        assert_eq!(config.advance_timeout, defaults.advance_timeout);
        assert_eq!(config.poll_interval, defaults.poll_interval);
        assert_eq!(config.settle_delay, defaults.settle_delay);
        assert_eq!(config.recovery_delay, defaults.recovery_delay);
    }

    #[test]
    fn from_env_reads_process_environment() {
        env::set_var("UAS_RECOVERY_DELAY_SECS", "7");
        let config = FlightConfig::from_env();
        env::remove_var("UAS_RECOVERY_DELAY_SECS");

        assert_eq!(config.recovery_delay, Duration::from_secs(7));
    }
}
