//! Physical-layer representation of a packet in flight.

use crate::core::{ClockTime, Datarate, Packet};

/// Which part of a transmission a signal announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPhase {
    /// The first bit is on the wire.
    Start,
    /// The in-flight representation changed; `position` bits are on the wire.
    Progress {
        /// Bits transmitted so far.
        position: u64,
    },
    /// The last bit is on the wire.
    End,
}

/// A packet encoded for the channel, with the timing it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    packet: Packet,
    phase: SignalPhase,
    datarate: Datarate,
    duration: ClockTime,
}

impl Signal {
    /// Encode `packet` at `datarate`. The duration covers the whole packet.
    ///
    /// `None` if the packet is too long to send at `datarate` within the
    /// representable time range.
    pub fn encode(packet: Packet, datarate: Datarate, phase: SignalPhase) -> Option<Self> {
        let duration = datarate.transmission_time(packet.bit_length())?;
        Some(Self {
            packet,
            phase,
            datarate,
            duration,
        })
    }

    /// The carried packet.
    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    /// Decode: take the carried packet.
    pub fn into_packet(self) -> Packet {
        self.packet
    }

    /// Which part of the transmission this announces.
    pub fn phase(&self) -> SignalPhase {
        self.phase
    }

    /// Rate the packet is sent at.
    pub fn datarate(&self) -> Datarate {
        self.datarate
    }

    /// Time the whole packet occupies the wire.
    pub fn duration(&self) -> ClockTime {
        self.duration
    }

    /// Check if this updates an earlier start signal.
    pub fn is_update(&self) -> bool {
        !matches!(self.phase, SignalPhase::Start)
    }

    /// The same signal announcing a different phase.
    pub fn with_phase(mut self, phase: SignalPhase) -> Self {
        self.phase = phase;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_derives_duration() {
        let rate = Datarate::from_bps(1000).unwrap();
        let signal =
            Signal::encode(Packet::with_bit_length("p", 500), rate, SignalPhase::Start).unwrap();

        assert_eq!(signal.duration(), ClockTime::from_millis(500));
        assert!(!signal.is_update());
        assert!(signal.clone().with_phase(SignalPhase::End).is_update());
        assert_eq!(signal.into_packet().bit_length(), 500);
    }

    #[test]
    fn test_encode_rejects_unrepresentable_duration() {
        let rate = Datarate::from_bps(1000).unwrap();
        let huge = Packet::with_bit_length("huge", 10_000_000_000);
        assert!(Signal::encode(huge, rate, SignalPhase::Start).is_none());
    }
}
