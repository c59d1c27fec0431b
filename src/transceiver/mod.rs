//! Physical layer: transmitter, channel and receiver.
//!
//! ```text
//!  producer ──push──▶ StreamingTransmitter ──Signal──▶ Channel ──Signal──▶ StreamingReceiver ──▶ StreamSink
//!      ▲                      │                       (delay)
//!      └── processed / can_push_again
//! ```
//!
//! Components are sans-IO: every handler takes the scheduler and clock it
//! runs on through a [`ClockContext`](crate::clock::ClockContext), plus the
//! neighbours it calls back into.

mod channel;
mod error;
mod lifecycle;
mod receiver;
mod signal;
mod transmitter;

pub use channel::{Channel, SignalSink};
pub use error::{ReceiverError, TransmitterError};
pub use lifecycle::{LifecycleOperation, MessageOrigin, Operational, OperationalState};
pub use receiver::StreamingReceiver;
pub use signal::{Signal, SignalPhase};
pub use transmitter::StreamingTransmitter;
