//! Observable notifications emitted by pipeline components.
//!
//! Each component owns its own [`Notifications`] outbox; callers drain it
//! after driving the component. Telemetry consumers sit outside this crate.

use std::fmt;

use super::packet::Packet;
use super::time::ClockTime;
use super::units::Datarate;

/// Why a packet was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// A bounded queue was full.
    QueueOverflow,
    /// The component was not operating.
    InterfaceDown,
    /// An end or progress signal arrived without a matching start.
    SignalStartMissing,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::QueueOverflow => f.write_str("queue overflow"),
            DropReason::InterfaceDown => f.write_str("interface down"),
            DropReason::SignalStartMissing => f.write_str("signal start missing"),
        }
    }
}

/// A notification. Packets carried here are snapshots, never the
/// authoritative in-flight unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A transmitter started putting a packet on the wire.
    TransmissionStarted {
        /// Emitting component.
        component: String,
        /// Snapshot of the packet.
        packet: Packet,
        /// Rate captured for this transmission.
        datarate: Datarate,
        /// Full transmission duration.
        duration: ClockTime,
    },

    /// A transmission ended, completely or by abort.
    TransmissionEnded {
        /// Emitting component.
        component: String,
        /// Snapshot of the packet as it left the wire (truncated on abort).
        packet: Packet,
        /// Whether the transmission was cut short.
        aborted: bool,
    },

    /// A receiver observed the start of a signal.
    ReceptionStarted {
        /// Emitting component.
        component: String,
        /// Snapshot of the packet being received.
        packet: Packet,
    },

    /// A receiver observed the end of a signal.
    ReceptionEnded {
        /// Emitting component.
        component: String,
        /// Snapshot of the received packet.
        packet: Packet,
    },

    /// A packet was discarded.
    PacketDropped {
        /// Emitting component.
        component: String,
        /// The dropped packet.
        packet: Packet,
        /// Why it was dropped.
        reason: DropReason,
        /// The limit that triggered the drop, where applicable.
        limit: Option<usize>,
    },
}

impl LinkEvent {
    /// Name of the component that emitted this notification.
    pub fn component(&self) -> &str {
        match self {
            LinkEvent::TransmissionStarted { component, .. }
            | LinkEvent::TransmissionEnded { component, .. }
            | LinkEvent::ReceptionStarted { component, .. }
            | LinkEvent::ReceptionEnded { component, .. }
            | LinkEvent::PacketDropped { component, .. } => component,
        }
    }

    /// Check if this is a drop notification.
    pub fn is_drop(&self) -> bool {
        matches!(self, LinkEvent::PacketDropped { .. })
    }
}

/// Per-component notification outbox.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    events: Vec<LinkEvent>,
}

impl Notifications {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a notification.
    pub fn emit(&mut self, event: LinkEvent) {
        self.events.push(event);
    }

    /// Take every pending notification.
    pub fn drain(&mut self) -> Vec<LinkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pending notifications.
    pub fn iter(&self) -> impl Iterator<Item = &LinkEvent> {
        self.events.iter()
    }

    /// Number of pending notifications.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_outbox() {
        let mut outbox = Notifications::new();
        outbox.emit(LinkEvent::PacketDropped {
            component: "queue".into(),
            packet: Packet::new("p", vec![0]),
            reason: DropReason::QueueOverflow,
            limit: Some(4),
        });

        assert_eq!(outbox.len(), 1);
        let events = outbox.drain();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_drop());
        assert_eq!(events[0].component(), "queue");
        assert!(outbox.is_empty());
    }
}
