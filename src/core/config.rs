//! Configuration surface.
//!
//! Plain structs with defaults from [`constants`](super::constants). With the
//! `serde` feature they deserialize from JSON; missing fields take defaults.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::constants;
use super::error::ConfigError;
use super::time::{ClockTime, SimTime};
use super::units::Datarate;

/// Logical clock parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClockConfig {
    /// Global time at which the clock value is pinned (seconds).
    pub origin_secs: f64,
    /// Clock value at the origin (seconds).
    pub origin_clock_secs: f64,
    /// Drift rate in parts per million.
    pub drift_rate_ppm: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            origin_secs: constants::DEFAULT_CLOCK_ORIGIN_SECS,
            origin_clock_secs: constants::DEFAULT_CLOCK_ORIGIN_VALUE_SECS,
            drift_rate_ppm: constants::DEFAULT_DRIFT_RATE_PPM,
        }
    }
}

impl ClockConfig {
    /// A drift-free clock reading zero at global time zero.
    pub fn ideal() -> Self {
        Self::default()
    }

    /// Set the drift rate (ppm).
    pub fn with_drift_ppm(mut self, ppm: f64) -> Self {
        self.drift_rate_ppm = ppm;
        self
    }

    /// Global origin.
    pub fn origin(&self) -> SimTime {
        SimTime::from_secs_f64(self.origin_secs)
    }

    /// Clock value at the origin.
    pub fn origin_clock(&self) -> ClockTime {
        ClockTime::from_secs_f64(self.origin_clock_secs)
    }

    /// Dimensionless drift rate.
    pub fn drift_rate(&self) -> f64 {
        self.drift_rate_ppm / constants::DRIFT_PPM_SCALE
    }

    /// Check the values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if SimTime::try_from_secs_f64(self.origin_secs).is_none() {
            return Err(ConfigError::InvalidDuration {
                field: "origin_secs",
                value: self.origin_secs,
            });
        }
        if ClockTime::try_from_secs_f64(self.origin_clock_secs).is_none() {
            return Err(ConfigError::InvalidDuration {
                field: "origin_clock_secs",
                value: self.origin_clock_secs,
            });
        }
        if !self.drift_rate_ppm.is_finite() || 1.0 + self.drift_rate() <= 0.0 {
            return Err(ConfigError::InvalidDriftRate {
                ppm: self.drift_rate_ppm,
            });
        }
        Ok(())
    }
}

/// Transmitter parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransmitterConfig {
    /// Component name used in diagnostics.
    pub name: String,
    /// Transmission rate in bits per second.
    pub datarate_bps: u64,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            name: "transmitter".into(),
            datarate_bps: constants::DEFAULT_DATARATE_BPS,
        }
    }
}

impl TransmitterConfig {
    /// Set the datarate.
    pub fn with_datarate_bps(mut self, bps: u64) -> Self {
        self.datarate_bps = bps;
        self
    }

    /// Validated datarate.
    pub fn datarate(&self) -> Result<Datarate, ConfigError> {
        Datarate::from_bps(self.datarate_bps).ok_or(ConfigError::ZeroDatarate)
    }
}

/// Receiver parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReceiverConfig {
    /// Component name used in diagnostics.
    pub name: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            name: "receiver".into(),
        }
    }
}

/// Channel parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelConfig {
    /// Component name used in diagnostics.
    pub name: String,
    /// Propagation delay (seconds).
    pub delay_secs: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "channel".into(),
            delay_secs: constants::DEFAULT_CHANNEL_DELAY_SECS,
        }
    }
}

impl ChannelConfig {
    /// Validated propagation delay.
    ///
    /// Must be non-negative and fit on the timeline.
    pub fn delay(&self) -> Result<SimTime, ConfigError> {
        SimTime::try_from_secs_f64(self.delay_secs)
            .filter(|delay| !delay.is_negative())
            .ok_or(ConfigError::InvalidDuration {
                field: "delay_secs",
                value: self.delay_secs,
            })
    }
}

/// Queue parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueConfig {
    /// Component name used in diagnostics.
    pub name: String,
    /// Maximum number of queued packets; `None` is unbounded.
    pub capacity: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "queue".into(),
            capacity: constants::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl QueueConfig {
    /// Check the values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == Some(0) {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

/// Everything a point-to-point link needs.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Transmitter-side clock.
    pub clock: ClockConfig,
    /// Transmitter.
    pub transmitter: TransmitterConfig,
    /// Channel.
    pub channel: ChannelConfig,
    /// Receiver.
    pub receiver: ReceiverConfig,
}

impl LinkConfig {
    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock.validate()?;
        self.transmitter.datarate()?;
        self.channel.delay()?;
        Ok(())
    }

    /// Parse and validate a JSON document.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(LinkConfig::default().validate().is_ok());
        assert!(QueueConfig::default().validate().is_ok());
    }

    #[test]
    fn test_drift_ppm_scaling() {
        let config = ClockConfig::ideal().with_drift_ppm(100_000.0);
        assert!((config.drift_rate() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_drift_that_stops_clock_rejected() {
        let config = ClockConfig::ideal().with_drift_ppm(-1_000_000.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDriftRate { .. })
        ));
    }

    #[test]
    fn test_zero_datarate_rejected() {
        let config = TransmitterConfig::default().with_datarate_bps(0);
        assert_eq!(config.datarate(), Err(ConfigError::ZeroDatarate));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let config = ChannelConfig {
            delay_secs: -1.0,
            ..Default::default()
        };
        assert!(config.delay().is_err());
    }

    #[test]
    fn test_delay_beyond_time_horizon_rejected() {
        let config = LinkConfig {
            channel: ChannelConfig {
                delay_secs: 1e8,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "delay_secs",
                value: 1e8,
            })
        );

        let clock = ClockConfig {
            origin_clock_secs: -1e12,
            ..Default::default()
        };
        assert!(matches!(
            clock.validate(),
            Err(ConfigError::InvalidDuration { field: "origin_clock_secs", .. })
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = QueueConfig {
            capacity: Some(0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_fills_defaults() {
        let config = LinkConfig::from_json(
            r#"{ "clock": { "drift_rate_ppm": 50.0 }, "transmitter": { "datarate_bps": 1000 } }"#,
        )
        .unwrap();

        assert_eq!(config.transmitter.datarate_bps, 1000);
        assert_eq!(config.transmitter.name, "transmitter");
        assert!((config.clock.drift_rate_ppm - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.channel, ChannelConfig::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_rejects_invalid() {
        let result = LinkConfig::from_json(r#"{ "transmitter": { "datarate_bps": 0 } }"#);
        assert_eq!(result, Err(ConfigError::ZeroDatarate));
    }
}
