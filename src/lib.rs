//! # linkflow
//!
//! Discrete-event model of a streaming point-to-point link.
//!
//! linkflow simulates how packets move from a producer, through a
//! transmitter, over a channel with propagation delay, into a receiver and on
//! to a consumer. It provides:
//!
//! - **Logical clocks**: per-component clocks with drift and jumps, layered on
//!   one global scheduler; pending timers keep their logical deadlines when
//!   the clock changes
//! - **Streaming transmission**: start, progress, end and abort of a timed
//!   transmission, with truncation to the bits already on the wire
//! - **Capability negotiation**: push/pull and passing/streaming
//!   compatibility checked once, at wiring time
//! - **Flow relay**: pull-driven fan-out of one source to many collectors
//!
//! Everything runs on a single logical thread. Components are sans-IO: they
//! are handed the scheduler, clock and neighbours they act on, and report
//! what happened through per-component notification outboxes.
//!
//! ## Feature Flags
//!
//! - `transceiver` (default): transmitter, channel, receiver and [`Link`]
//! - `queueing` (default): packet queue and flow relay
//! - `serde`: JSON configuration loading
//!
//! ## Modules
//!
//! - [`core`]: time, packets, collaborator traits, notifications, config and
//!   errors (always included)
//! - [`clock`]: global scheduler and logical clocks (always included)
//! - [`contract`]: capability negotiation (always included)
//! - [`transceiver`]: physical layer (requires `transceiver` feature)
//! - [`queueing`]: queue and relay (requires `queueing` feature)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Always included
pub mod clock;
pub mod contract;
pub mod core;

// Physical layer (feature-gated)
#[cfg(feature = "transceiver")]
#[cfg_attr(docsrs, doc(cfg(feature = "transceiver")))]
pub mod transceiver;

// Point-to-point link event loop (feature-gated)
#[cfg(feature = "transceiver")]
#[cfg_attr(docsrs, doc(cfg(feature = "transceiver")))]
mod link;

// Queueing stages (feature-gated)
#[cfg(feature = "queueing")]
#[cfg_attr(docsrs, doc(cfg(feature = "queueing")))]
pub mod queueing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::{ClockContext, ClockError, LogicalClock, Scheduler, TimerId};
    pub use crate::contract::{
        Capabilities, Capability, CapabilityError, Endpoint, EndpointKind, PacketProcessor, Port,
        Wiring,
    };
    pub use crate::core::*;

    #[cfg(feature = "transceiver")]
    pub use crate::link::Link;
    #[cfg(feature = "transceiver")]
    pub use crate::transceiver::{
        Channel, LifecycleOperation, ReceiverError, Signal, SignalPhase, SignalSink,
        StreamingReceiver, StreamingTransmitter, TransmitterError,
    };

    #[cfg(feature = "queueing")]
    pub use crate::queueing::{FlowRelay, OutputId, PacketQueue, RelayError};
}

// Re-export commonly used items at crate root
pub use crate::core::{ClockTime, Datarate, LinkConfig, LinkError, LinkEvent, Packet, SimTime};

#[cfg(feature = "transceiver")]
pub use link::Link;
