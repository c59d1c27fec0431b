//! Streaming receiver: turns arriving signals back into packets.
//!
//! Tracks at most one reception. Start, progress and end signals are
//! forwarded to a [`StreamSink`] as they arrive. An end or progress signal
//! with no reception in progress means the two sides lost sync; the signal is
//! dropped with a warning and the receiver stays idle.

use crate::contract::{Capabilities, Capability, EndpointKind, PacketProcessor, Port};
use crate::core::{DropReason, LinkEvent, Notifications, Packet, ReceiverConfig, StreamSink};

use super::error::ReceiverError;
use super::lifecycle::{LifecycleOperation, MessageOrigin, Operational, OperationalState};
use super::signal::{Signal, SignalPhase};

/// Receiver that streams packets to a downstream sink.
#[derive(Debug)]
pub struct StreamingReceiver {
    name: String,
    rx_signal: Option<Signal>,
    operational: Operational,
    events: Notifications,
}

impl StreamingReceiver {
    /// Create a receiver.
    pub fn new(config: &ReceiverConfig) -> Self {
        Self {
            name: config.name.clone(),
            rx_signal: None,
            operational: Operational::new(),
            events: Notifications::new(),
        }
    }

    /// Receiver name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if a reception is in progress.
    pub fn is_receiving(&self) -> bool {
        self.rx_signal.is_some()
    }

    /// The latest signal of the reception in progress.
    pub fn current_signal(&self) -> Option<&Signal> {
        self.rx_signal.as_ref()
    }

    /// Current operational state.
    pub fn operational_state(&self) -> OperationalState {
        self.operational.state()
    }

    /// Pending notifications.
    pub fn events(&self) -> &Notifications {
        &self.events
    }

    /// Take pending notifications.
    pub fn drain_events(&mut self) -> Vec<LinkEvent> {
        self.events.drain()
    }

    /// Apply a lifecycle operation. Going down discards the reception in
    /// progress.
    pub fn handle_lifecycle(&mut self, operation: LifecycleOperation) {
        let previous = self.operational.apply(operation);
        tracing::info!(receiver = %self.name, ?operation, ?previous, "lifecycle operation");
        if !self.operational.is_up()
            && let Some(signal) = self.rx_signal.take()
        {
            tracing::debug!(receiver = %self.name, packet = %signal.packet(), "reception discarded");
        }
    }

    /// Handle a signal delivered by the channel.
    pub fn receive_signal(
        &mut self,
        signal: Signal,
        consumer: &mut dyn StreamSink,
    ) -> Result<(), ReceiverError> {
        if !self.operational.admits(MessageOrigin::External) {
            tracing::warn!(receiver = %self.name, packet = %signal.packet(), "interface down, dropping signal");
            self.drop_packet(signal.into_packet(), DropReason::InterfaceDown);
            return Ok(());
        }
        match signal.phase() {
            SignalPhase::Start => self.receive_start(signal, consumer),
            SignalPhase::Progress { position } => {
                self.receive_progress(signal, position, consumer);
                Ok(())
            }
            SignalPhase::End => {
                self.receive_end(signal, consumer);
                Ok(())
            }
        }
    }

    fn receive_start(
        &mut self,
        signal: Signal,
        consumer: &mut dyn StreamSink,
    ) -> Result<(), ReceiverError> {
        if let Some(current) = &self.rx_signal {
            return Err(ReceiverError::AlreadyReceiving {
                component: self.name.clone(),
                current: current.packet().name().to_owned(),
                incoming: signal.packet().name().to_owned(),
            });
        }
        tracing::info!(receiver = %self.name, packet = %signal.packet(), "starting reception");
        self.events.emit(LinkEvent::ReceptionStarted {
            component: self.name.clone(),
            packet: signal.packet().clone(),
        });
        consumer.push_start(signal.packet().clone());
        self.rx_signal = Some(signal);
        Ok(())
    }

    fn receive_progress(&mut self, signal: Signal, position: u64, consumer: &mut dyn StreamSink) {
        if self.rx_signal.is_none() {
            self.desync(signal);
            return;
        }
        tracing::debug!(receiver = %self.name, packet = %signal.packet(), position, "reception progress");
        consumer.push_progress(signal.packet().clone(), position);
        self.rx_signal = Some(signal);
    }

    fn receive_end(&mut self, signal: Signal, consumer: &mut dyn StreamSink) {
        if self.rx_signal.take().is_none() {
            self.desync(signal);
            return;
        }
        tracing::info!(receiver = %self.name, packet = %signal.packet(), "ending reception");
        self.events.emit(LinkEvent::ReceptionEnded {
            component: self.name.clone(),
            packet: signal.packet().clone(),
        });
        consumer.push_end(signal.into_packet());
    }

    fn desync(&mut self, signal: Signal) {
        tracing::warn!(
            receiver = %self.name,
            packet = %signal.packet(),
            phase = ?signal.phase(),
            "signal without matching start, dropping"
        );
        self.drop_packet(signal.into_packet(), DropReason::SignalStartMissing);
    }

    fn drop_packet(&mut self, packet: Packet, reason: DropReason) {
        self.events.emit(LinkEvent::PacketDropped {
            component: self.name.clone(),
            packet,
            reason,
            limit: None,
        });
    }
}

impl PacketProcessor for StreamingReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self, port: Port) -> Option<Capabilities> {
        match port {
            Port::Input => Some(Capabilities::SENDING),
            Port::Output(0) => Some(
                EndpointKind::PushSource
                    .capabilities()
                    .with(Capability::Streaming),
            ),
            Port::Output(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Datarate;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl StreamSink for Recorder {
        fn push_start(&mut self, packet: Packet) {
            self.calls.push(format!("start {}", packet.name()));
        }

        fn push_progress(&mut self, packet: Packet, position: u64) {
            self.calls.push(format!("progress {} @{position}", packet.name()));
        }

        fn push_end(&mut self, packet: Packet) {
            self.calls.push(format!("end {} {}", packet.name(), packet.bit_length()));
        }
    }

    fn signal(name: &str, bits: u64, phase: SignalPhase) -> Signal {
        let rate = Datarate::from_bps(1000).unwrap();
        Signal::encode(Packet::with_bit_length(name, bits), rate, phase).unwrap()
    }

    fn operating() -> StreamingReceiver {
        let mut rx = StreamingReceiver::new(&ReceiverConfig::default());
        rx.handle_lifecycle(LifecycleOperation::Start);
        rx
    }

    #[test]
    fn test_full_reception() {
        let mut rx = operating();
        let mut sink = Recorder::default();

        rx.receive_signal(signal("p", 64, SignalPhase::Start), &mut sink).unwrap();
        assert!(rx.is_receiving());
        rx.receive_signal(signal("p", 64, SignalPhase::Progress { position: 32 }), &mut sink)
            .unwrap();
        rx.receive_signal(signal("p", 64, SignalPhase::End), &mut sink).unwrap();
        assert!(!rx.is_receiving());

        assert_eq!(sink.calls, ["start p", "progress p @32", "end p 64"]);
        let events = rx.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], LinkEvent::ReceptionEnded { .. }));
    }

    #[test]
    fn test_end_without_start_drops_once() {
        let mut rx = operating();
        let mut sink = Recorder::default();

        rx.receive_signal(signal("p", 64, SignalPhase::End), &mut sink).unwrap();

        assert!(!rx.is_receiving());
        assert!(sink.calls.is_empty());
        let events = rx.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            LinkEvent::PacketDropped { reason: DropReason::SignalStartMissing, .. }
        ));
    }

    #[test]
    fn test_second_start_is_an_error() {
        let mut rx = operating();
        let mut sink = Recorder::default();

        rx.receive_signal(signal("a", 8, SignalPhase::Start), &mut sink).unwrap();
        let err = rx
            .receive_signal(signal("b", 8, SignalPhase::Start), &mut sink)
            .unwrap_err();
        assert_eq!(
            err,
            ReceiverError::AlreadyReceiving {
                component: "receiver".into(),
                current: "a".into(),
                incoming: "b".into(),
            }
        );
    }

    #[test]
    fn test_down_drops_and_discards() {
        let mut rx = operating();
        let mut sink = Recorder::default();
        rx.receive_signal(signal("a", 8, SignalPhase::Start), &mut sink).unwrap();

        rx.handle_lifecycle(LifecycleOperation::Stop);
        assert!(!rx.is_receiving());

        rx.receive_signal(signal("a", 8, SignalPhase::End), &mut sink).unwrap();
        assert_eq!(sink.calls, ["start a"]);
        assert!(rx.drain_events().iter().any(|e| matches!(
            e,
            LinkEvent::PacketDropped { reason: DropReason::InterfaceDown, .. }
        )));
    }
}
