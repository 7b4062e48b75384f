use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SpeedTier;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
    #[error("axis_decimals {0} is larger than 6")]
    TooManyDecimals(u32),
    #[error("{name} ceiling {value} outside 0..={max}")]
    CeilingOutOfRange {
        name: &'static str,
        value: i32,
        max: i32,
    },
    #[error("rest_value {0} is not finite")]
    NonFiniteRest(f64),
}

/// How continuous axes are turned into commands.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum AxisMode {
    /// Start motion once when an axis leaves rest, stop once when it returns.
    #[default]
    Latched,
    /// Every poll with a deflected axis sends move, pause, stop.
    Pulsed,
}

/// One value per [SpeedTier].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
pub struct TierValues<T> {
    pub low: T,
    pub medium: T,
    pub high: T,
}

impl<T: Copy> TierValues<T> {
    pub fn get(&self, tier: SpeedTier) -> T {
        match tier {
            SpeedTier::Low => self.low,
            SpeedTier::Medium => self.medium,
            SpeedTier::High => self.high,
        }
    }
}

fn default_motion_speed() -> TierValues<i32> {
    TierValues {
        low: 1,
        medium: 7,
        high: 14,
    }
}

fn default_zoom_speed() -> TierValues<i32> {
    TierValues {
        low: 1,
        medium: 3,
        high: 7,
    }
}

fn default_pulse_ms() -> TierValues<u64> {
    TierValues {
        low: 200,
        medium: 100,
        high: 50,
    }
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SerialConfig {
    /// Serial device, e.g. `/dev/ttyUSB0` or `COM9`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_path: Option<String>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub inquiry_timeout_ms: u64,
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_timeout_ms() -> u64 {
    1000
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_path: None,
            baud_rate: default_baud_rate(),
            write_timeout_ms: default_timeout_ms(),
            inquiry_timeout_ms: default_timeout_ms(),
        }
    }
}

impl SerialConfig {
    pub fn timeouts(&self) -> visca::CameraTimeouts {
        visca::CameraTimeouts {
            write: Duration::from_millis(self.write_timeout_ms),
            inquiry: Duration::from_millis(self.inquiry_timeout_ms),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RestartPolicy {
    /// `None` restarts forever.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: Option<u32>,
    #[serde(default = "default_restart_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_restarts() -> Option<u32> {
    Some(10)
}

fn default_restart_delay_ms() -> u64 {
    1000
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: default_max_restarts(),
            delay_ms: default_restart_delay_ms(),
        }
    }
}

impl RestartPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether another restart is allowed after `restarts` have happened.
    pub fn allows(&self, restarts: u32) -> bool {
        self.max_restarts.map_or(true, |max| restarts < max)
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PadConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub axis_mode: AxisMode,
    /// Neutral reading of every axis. Compared for exact equality after
    /// quantization.
    #[serde(default)]
    pub rest_value: f64,
    /// Decimals kept when quantizing axis readings.
    #[serde(default = "default_axis_decimals")]
    pub axis_decimals: u32,
    /// Pan/tilt speed ceilings, 0..=24.
    #[serde(default = "default_motion_speed")]
    pub motion_speed: TierValues<i32>,
    /// Zoom speed ceilings, 0..=7.
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: TierValues<i32>,
    /// Pause between move and stop in pulsed mode.
    #[serde(default = "default_pulse_ms")]
    pub motion_pulse_ms: TierValues<u64>,
    #[serde(default = "default_pulse_ms")]
    pub zoom_pulse_ms: TierValues<u64>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Consecutive failed writes after which the serial link is reopened.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    #[serde(default)]
    pub restart: RestartPolicy,
}

fn default_axis_decimals() -> u32 {
    3
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_max_consecutive_failures() -> u32 {
    20
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            serial: Default::default(),
            axis_mode: Default::default(),
            rest_value: 0.0,
            axis_decimals: default_axis_decimals(),
            motion_speed: default_motion_speed(),
            zoom_speed: default_zoom_speed(),
            motion_pulse_ms: default_pulse_ms(),
            zoom_pulse_ms: default_pulse_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            restart: Default::default(),
        }
    }
}

impl PadConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.axis_decimals > 6 {
            return Err(ConfigError::TooManyDecimals(self.axis_decimals));
        }
        if !self.rest_value.is_finite() {
            return Err(ConfigError::NonFiniteRest(self.rest_value));
        }
        let checks = [
            ("motion speed", self.motion_speed, visca::MAX_MOTION_SPEED),
            ("zoom speed", self.zoom_speed, visca::MAX_DRIVE_SPEED),
        ];
        for (name, tiers, max) in checks {
            for value in [tiers.low, tiers.medium, tiers.high] {
                if !(0..=max).contains(&value) {
                    return Err(ConfigError::CeilingOutOfRange { name, value, max });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() -> eyre::Result<()> {
        let cfg: PadConfig = serde_yaml::from_str("{}")?;
        assert_eq!(cfg, PadConfig::default());
        assert_eq!(cfg.motion_speed.get(SpeedTier::High), 14);
        assert_eq!(cfg.zoom_speed.get(SpeedTier::Medium), 3);
        assert_eq!(cfg.restart.max_restarts, Some(10));
        cfg.validate()?;
        Ok(())
    }

    #[test]
    fn partial_yaml() -> eyre::Result<()> {
        let buf = r#"
serial:
  port_path: /dev/ttyUSB0
axis_mode: pulsed
restart:
  max_restarts: null
"#;
        let cfg: PadConfig = serde_yaml::from_str(buf)?;
        assert_eq!(cfg.serial.port_path.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(cfg.serial.baud_rate, 9600);
        assert_eq!(cfg.axis_mode, AxisMode::Pulsed);
        assert_eq!(cfg.restart.max_restarts, None);
        assert_eq!(cfg.restart.delay_ms, 1000);
        assert!(cfg.restart.allows(1_000_000));
        Ok(())
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(serde_yaml::from_str::<PadConfig>("axis_mod: pulsed").is_err());
    }

    #[test]
    fn restart_limit() {
        let policy = RestartPolicy::default();
        assert!(policy.allows(9));
        assert!(!policy.allows(10));
    }

    #[test]
    fn validation() {
        let mut cfg = PadConfig::default();
        cfg.poll_interval_ms = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroPollInterval));

        let mut cfg = PadConfig::default();
        cfg.zoom_speed.high = 8;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::CeilingOutOfRange {
                name: "zoom speed",
                value: 8,
                max: 7
            })
        );
    }
}
