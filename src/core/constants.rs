//! Defaults and fixed values shared by every component.
//!
//! Configurable values only provide defaults here; see [`crate::core::config`].

// =============================================================================
// TIME
// =============================================================================

/// Resolution of [`SimTime`](super::SimTime) and [`ClockTime`](super::ClockTime).
pub const PICOS_PER_SECOND: i64 = 1_000_000_000_000;

/// Drift rates are configured in parts per million.
pub const DRIFT_PPM_SCALE: f64 = 1e6;

/// Default clock origin on the global timeline (seconds).
pub const DEFAULT_CLOCK_ORIGIN_SECS: f64 = 0.0;

/// Default logical clock value at the origin (seconds).
pub const DEFAULT_CLOCK_ORIGIN_VALUE_SECS: f64 = 0.0;

/// Default drift rate (ppm). A drift-free clock.
pub const DEFAULT_DRIFT_RATE_PPM: f64 = 0.0;

// =============================================================================
// TRANSMISSION
// =============================================================================

/// Default transmitter datarate (100 Mbps).
pub const DEFAULT_DATARATE_BPS: u64 = 100_000_000;

/// Default propagation delay of a channel (seconds).
pub const DEFAULT_CHANNEL_DELAY_SECS: f64 = 0.0;

/// Name of the transmitter's completion timer.
pub const TX_END_TIMER_NAME: &str = "TxEndTimer";

/// Name of a channel's per-signal delivery timer.
pub const DELIVERY_TIMER_NAME: &str = "SignalDelivery";

// =============================================================================
// QUEUEING
// =============================================================================

/// Default queue capacity. `None` is unbounded.
pub const DEFAULT_QUEUE_CAPACITY: Option<usize> = None;
