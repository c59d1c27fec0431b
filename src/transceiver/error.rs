use thiserror::Error;

use crate::clock::{ClockError, TimerId};
use crate::core::Datarate;

/// Transmitter sequencing errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransmitterError {
    /// A packet was offered while another one is on the wire.
    #[error("{component}: transmission already in progress")]
    AlreadyTransmitting {
        /// Transmitter name.
        component: String,
    },

    /// A transmission update, end or abort with nothing on the wire.
    #[error("{component}: no transmission in progress")]
    NotTransmitting {
        /// Transmitter name.
        component: String,
    },

    /// A packet was offered while the interface is down.
    #[error("{component}: interface is not operating")]
    NotOperating {
        /// Transmitter name.
        component: String,
    },

    /// A timer the transmitter does not own was routed to it.
    #[error("{component}: unknown timer {timer}")]
    UnknownTimer {
        /// Transmitter name.
        component: String,
        /// The offending timer.
        timer: TimerId,
    },

    /// A packet too long to send at the current rate.
    #[error("{component}: {bits} bits at {datarate} exceed the representable time range")]
    DurationOverflow {
        /// Transmitter name.
        component: String,
        /// Packet length.
        bits: u64,
        /// Rate it was to be sent at.
        datarate: Datarate,
    },

    /// Underlying clock error.
    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// Receiver sequencing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceiverError {
    /// A start signal arrived while another reception is in progress.
    #[error("{component}: reception of {current} in progress, got start of {incoming}")]
    AlreadyReceiving {
        /// Receiver name.
        component: String,
        /// Packet currently being received.
        current: String,
        /// Packet whose start arrived.
        incoming: String,
    },
}
