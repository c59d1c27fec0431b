//! Queueing stages: a FIFO packet queue and a pull-driven flow relay.

mod queue;
mod relay;

pub use queue::PacketQueue;
pub use relay::{FlowRelay, OutputId, RelayError};
