//! Error types for linkflow.
//!
//! Every error here is a protocol violation or a configuration problem: a
//! wiring or sequencing bug that must be fixed, not tolerated. Recoverable
//! anomalies (desynchronized signals, queue overflow) are not errors; they
//! are reported as [`LinkEvent::PacketDropped`](super::LinkEvent::PacketDropped).

use thiserror::Error;

pub use crate::clock::ClockError;
pub use crate::contract::CapabilityError;

/// Errors from packet queues and other passive sources.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Popped from a source with nothing to pop.
    #[error("{component}: pop from empty source")]
    Empty {
        /// Source that was empty.
        component: String,
    },
}

/// Errors in configuration values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Datarate of zero.
    #[error("datarate must be positive")]
    ZeroDatarate,

    /// Drift rate that would stop or reverse the clock.
    #[error("drift rate {ppm} ppm stops or reverses the clock")]
    InvalidDriftRate {
        /// Offending drift rate in ppm.
        ppm: f64,
    },

    /// Negative, non-finite or unrepresentable duration.
    #[error("invalid {field}: {value}")]
    InvalidDuration {
        /// Name of the configuration field.
        field: &'static str,
        /// Offending value in seconds.
        value: f64,
    },

    /// Bounded queue with zero capacity.
    #[error("queue capacity must be positive")]
    ZeroCapacity,

    /// Configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Top-level linkflow errors.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Clock error.
    #[error("clock error: {0}")]
    Clock(#[from] ClockError),

    /// Capability negotiation error.
    #[error("capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// Queue error.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A timer fired that no component owns.
    #[error("no component owns timer {0}")]
    UnroutedTimer(crate::clock::TimerId),

    /// Transmitter error.
    #[cfg(feature = "transceiver")]
    #[error("transmitter error: {0}")]
    Transmitter(#[from] crate::transceiver::TransmitterError),

    /// Receiver error.
    #[cfg(feature = "transceiver")]
    #[error("receiver error: {0}")]
    Receiver(#[from] crate::transceiver::ReceiverError),

    /// Flow relay error.
    #[cfg(feature = "queueing")]
    #[error("relay error: {0}")]
    Relay(#[from] crate::queueing::RelayError),
}
