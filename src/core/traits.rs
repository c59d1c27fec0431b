//! Collaborator contracts between pipeline stages.
//!
//! A stage is either active (it initiates transfers) or passive (it is
//! called). Pushing moves a packet from an active source into a passive sink;
//! pulling moves one from a passive source into an active sink. Streaming
//! sinks additionally observe a transfer's start and progress before its end.

use super::error::QueueError;
use super::packet::Packet;

/// Producer side of the push handshake.
///
/// A producer must wait for [`handle_can_push_again`](Self::handle_can_push_again)
/// (or know its sink is idle at startup) before offering a packet.
pub trait PacketProducer {
    /// A previously pushed packet has been fully or partially processed.
    ///
    /// `success` is `false` when processing was cut short (for example an
    /// aborted transmission); `packet` then holds only the processed part.
    fn handle_packet_processed(&mut self, packet: &Packet, success: bool);

    /// The sink invites the producer to offer a new packet.
    fn handle_can_push_again(&mut self);
}

/// Passive sink accepting whole packets.
pub trait PacketSink {
    /// Check if a push would be accepted now.
    fn can_push(&self) -> bool;

    /// Hand a packet over.
    fn push(&mut self, packet: Packet);
}

/// Passive sink observing a packet as it streams in.
///
/// Calls arrive in order `push_start`, any number of `push_progress`, then
/// `push_end`. Start and progress carry snapshots; ownership of the final
/// packet transfers on `push_end`.
pub trait StreamSink {
    /// A packet starts arriving.
    fn push_start(&mut self, packet: Packet);

    /// The in-flight representation changed; `position` bits have arrived.
    fn push_progress(&mut self, packet: Packet, position: u64);

    /// The packet arrived completely.
    fn push_end(&mut self, packet: Packet);
}

/// Passive source that packets are pulled from.
pub trait PassiveSource {
    /// Check if at least one packet can be pulled.
    fn can_pop_some(&self) -> bool;

    /// Peek at the packet the next pop would return.
    fn can_pop(&self) -> Option<&Packet>;

    /// Pull the next packet.
    ///
    /// Popping an empty source is a sequencing error.
    fn pop(&mut self) -> Result<Packet, QueueError>;
}

/// Active sink that pulls from a passive source when told packets are available.
pub trait PacketCollector {
    /// The source has packets available. The collector may pop from `source`
    /// before returning.
    fn handle_can_pop(&mut self, source: &mut dyn PassiveSource);
}
