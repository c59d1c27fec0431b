//! Streaming transmitter: turns packets into timed signals on a channel.
//!
//! The transmitter is a passive push sink on its input and a raw sender on
//! its output. It holds at most one transmission at a time:
//!
//! ```text
//!            push / push_start               tx end timer
//!   Idle ───────────────────────▶ Transmitting ───────────▶ Idle
//!                                   │  ▲   │
//!                  push_progress /  └──┘   │ abort / stop / crash
//!                  push_end                ▼
//!                                         Idle
//! ```
//!
//! Timing is computed on the transmitter's logical clock. The datarate is
//! captured when a transmission starts; later rate changes apply to the next
//! packet only.

use crate::clock::{ClockContext, Scheduler, TimerId};
use crate::contract::{Capabilities, Capability, EndpointKind, PacketProcessor, Port};
use crate::core::constants::TX_END_TIMER_NAME;
use crate::core::{
    ClockTime, ConfigError, Datarate, LinkEvent, Notifications, Packet, PacketProducer,
    TransmitterConfig,
};

use super::channel::SignalSink;
use super::error::TransmitterError;
use super::lifecycle::{LifecycleOperation, MessageOrigin, Operational, OperationalState};
use super::signal::{Signal, SignalPhase};

/// The packet currently on the wire.
#[derive(Debug)]
struct TxSession {
    signal: Signal,
    start_time: ClockTime,
    end_time: ClockTime,
}

impl TxSession {
    fn new(
        component: &str,
        packet: Packet,
        datarate: Datarate,
        phase: SignalPhase,
        start_time: ClockTime,
    ) -> Result<Self, TransmitterError> {
        let bits = packet.bit_length();
        let signal = encode(component, packet, datarate, phase)?;
        let end_time = start_time.checked_add(signal.duration()).ok_or_else(|| {
            TransmitterError::DurationOverflow {
                component: component.to_owned(),
                bits,
                datarate,
            }
        })?;
        Ok(Self {
            signal,
            start_time,
            end_time,
        })
    }

    /// Whole bits on the wire at clock time `now`, capped at the packet length.
    fn transmitted_bits(&self, now: ClockTime) -> u64 {
        self.signal
            .datarate()
            .bits_in(now - self.start_time)
            .min(self.signal.packet().bit_length())
    }
}

/// Transmitter that streams packets onto a channel.
#[derive(Debug)]
pub struct StreamingTransmitter {
    name: String,
    datarate: Datarate,
    tx_end_timer: TimerId,
    session: Option<TxSession>,
    operational: Operational,
    events: Notifications,
}

impl StreamingTransmitter {
    /// Create a transmitter. Its end-of-transmission timer is allocated on
    /// `scheduler`.
    pub fn new(config: &TransmitterConfig, scheduler: &mut Scheduler) -> Result<Self, ConfigError> {
        let datarate = config.datarate()?;
        let tx_end_timer = scheduler.create_timer(TX_END_TIMER_NAME);
        Ok(Self {
            name: config.name.clone(),
            datarate,
            tx_end_timer,
            session: None,
            operational: Operational::new(),
            events: Notifications::new(),
        })
    }

    /// Transmitter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rate used for the next transmission.
    pub fn datarate(&self) -> Datarate {
        self.datarate
    }

    /// Change the rate. A transmission in progress keeps its rate.
    pub fn set_datarate(&mut self, datarate: Datarate) {
        self.datarate = datarate;
    }

    /// The end-of-transmission timer.
    pub fn tx_end_timer(&self) -> TimerId {
        self.tx_end_timer
    }

    /// Check if a packet is on the wire.
    pub fn is_transmitting(&self) -> bool {
        self.session.is_some()
    }

    /// Current operational state.
    pub fn operational_state(&self) -> OperationalState {
        self.operational.state()
    }

    /// Check if a push would be accepted now.
    pub fn can_push(&self) -> bool {
        self.operational.is_up() && self.session.is_none()
    }

    /// The packet on the wire.
    pub fn current_packet(&self) -> Option<&Packet> {
        self.session.as_ref().map(|s| s.signal.packet())
    }

    /// Clock time the current transmission started.
    pub fn start_time(&self) -> Option<ClockTime> {
        self.session.as_ref().map(|s| s.start_time)
    }

    /// Clock time the current transmission is due to end.
    pub fn end_time(&self) -> Option<ClockTime> {
        self.session.as_ref().map(|s| s.end_time)
    }

    /// Bits of the current packet on the wire at clock time `now`; zero when
    /// idle.
    pub fn transmitted_length(&self, now: ClockTime) -> u64 {
        self.session
            .as_ref()
            .map_or(0, |session| session.transmitted_bits(now))
    }

    /// Pending notifications.
    pub fn events(&self) -> &Notifications {
        &self.events
    }

    /// Take pending notifications.
    pub fn drain_events(&mut self) -> Vec<LinkEvent> {
        self.events.drain()
    }

    /// Apply a lifecycle operation.
    ///
    /// Starting invites the producer. Stopping or crashing aborts the
    /// transmission in progress without inviting a new one.
    pub fn handle_lifecycle(
        &mut self,
        operation: LifecycleOperation,
        ctx: &mut ClockContext<'_>,
        channel: &mut dyn SignalSink,
        producer: &mut dyn PacketProducer,
    ) -> Result<(), TransmitterError> {
        let previous = self.operational.apply(operation);
        tracing::info!(
            transmitter = %self.name,
            ?operation,
            ?previous,
            "lifecycle operation"
        );
        match operation {
            LifecycleOperation::Start => producer.handle_can_push_again(),
            LifecycleOperation::Stop | LifecycleOperation::Crash => {
                if self.session.is_some() {
                    self.abort(ctx, channel, producer)?;
                }
            }
        }
        Ok(())
    }

    /// Start transmitting a whole packet.
    pub fn push(
        &mut self,
        packet: Packet,
        ctx: &mut ClockContext<'_>,
        channel: &mut dyn SignalSink,
    ) -> Result<(), TransmitterError> {
        self.push_start(packet, ctx, channel)
    }

    /// Start transmitting a packet whose content may still change.
    pub fn push_start(
        &mut self,
        packet: Packet,
        ctx: &mut ClockContext<'_>,
        channel: &mut dyn SignalSink,
    ) -> Result<(), TransmitterError> {
        if !self.operational.admits(MessageOrigin::External) {
            return Err(TransmitterError::NotOperating {
                component: self.name.clone(),
            });
        }
        if self.session.is_some() {
            return Err(TransmitterError::AlreadyTransmitting {
                component: self.name.clone(),
            });
        }

        let session = TxSession::new(
            &self.name,
            packet,
            self.datarate,
            SignalPhase::Start,
            ctx.clock_now(),
        )?;
        ctx.schedule_clock_event(session.end_time, self.tx_end_timer)?;

        tracing::info!(
            transmitter = %self.name,
            packet = %session.signal.packet(),
            datarate = %session.signal.datarate(),
            duration = %session.signal.duration(),
            "starting transmission"
        );
        self.events.emit(LinkEvent::TransmissionStarted {
            component: self.name.clone(),
            packet: session.signal.packet().clone(),
            datarate: session.signal.datarate(),
            duration: session.signal.duration(),
        });
        let snapshot = session.signal.clone();
        self.session = Some(session);
        channel.send_signal(snapshot, ctx.scheduler)?;
        Ok(())
    }

    /// Replace the in-flight representation mid-transmission.
    ///
    /// `position` is how many bits the upstream has produced so far; the
    /// reported wire position never exceeds it. The end timer moves to match
    /// the new length, firing now if that is already in the past.
    pub fn push_progress(
        &mut self,
        packet: Packet,
        position: u64,
        ctx: &mut ClockContext<'_>,
        channel: &mut dyn SignalSink,
    ) -> Result<(), TransmitterError> {
        let now = ctx.clock_now();
        let session = self.replace_packet(packet, ctx)?;
        let wire_position = session.transmitted_bits(now).min(position);
        let snapshot = session
            .signal
            .clone()
            .with_phase(SignalPhase::Progress {
                position: wire_position,
            });
        tracing::debug!(
            transmitter = %self.name,
            packet = %snapshot.packet(),
            position = wire_position,
            "transmission progress"
        );
        channel.send_signal(snapshot, ctx.scheduler)?;
        Ok(())
    }

    /// Replace the in-flight representation with its final form.
    ///
    /// Nothing is sent downstream until the transmission completes.
    pub fn push_end(
        &mut self,
        packet: Packet,
        ctx: &mut ClockContext<'_>,
    ) -> Result<(), TransmitterError> {
        self.replace_packet(packet, ctx)?;
        Ok(())
    }

    /// Handle a fired timer. The end timer completes the transmission even
    /// after the interface went down.
    pub fn handle_timer(
        &mut self,
        timer: TimerId,
        ctx: &mut ClockContext<'_>,
        channel: &mut dyn SignalSink,
        producer: &mut dyn PacketProducer,
    ) -> Result<(), TransmitterError> {
        if timer != self.tx_end_timer {
            return Err(TransmitterError::UnknownTimer {
                component: self.name.clone(),
                timer,
            });
        }
        if !self.operational.admits(MessageOrigin::SelfTimer) {
            return Err(TransmitterError::NotOperating {
                component: self.name.clone(),
            });
        }
        self.end_tx(ctx, channel, producer)
    }

    /// Cut the current transmission short.
    ///
    /// The packet is truncated to the bits already on the wire and a shorter
    /// end signal is sent. The producer learns the packet was only partly
    /// processed, and is invited again if the interface is still up.
    pub fn abort(
        &mut self,
        ctx: &mut ClockContext<'_>,
        channel: &mut dyn SignalSink,
        producer: &mut dyn PacketProducer,
    ) -> Result<(), TransmitterError> {
        let session = self.take_session()?;
        ctx.cancel_clock_event(self.tx_end_timer);

        let bits = session.transmitted_bits(ctx.clock_now());
        let datarate = session.signal.datarate();
        let mut packet = session.signal.into_packet();
        packet.truncate_bits(bits);
        let signal = encode(&self.name, packet, datarate, SignalPhase::End)?;

        tracing::info!(
            transmitter = %self.name,
            packet = %signal.packet(),
            transmitted = bits,
            "aborting transmission"
        );
        self.events.emit(LinkEvent::TransmissionEnded {
            component: self.name.clone(),
            packet: signal.packet().clone(),
            aborted: true,
        });
        producer.handle_packet_processed(signal.packet(), false);
        channel.send_signal(signal, ctx.scheduler)?;
        if self.operational.is_up() {
            producer.handle_can_push_again();
        }
        Ok(())
    }

    fn end_tx(
        &mut self,
        ctx: &mut ClockContext<'_>,
        channel: &mut dyn SignalSink,
        producer: &mut dyn PacketProducer,
    ) -> Result<(), TransmitterError> {
        let session = self.take_session()?;
        let signal = session.signal.with_phase(SignalPhase::End);

        tracing::info!(transmitter = %self.name, packet = %signal.packet(), "ending transmission");
        self.events.emit(LinkEvent::TransmissionEnded {
            component: self.name.clone(),
            packet: signal.packet().clone(),
            aborted: false,
        });
        producer.handle_packet_processed(signal.packet(), true);
        channel.send_signal(signal, ctx.scheduler)?;
        if self.operational.is_up() {
            producer.handle_can_push_again();
        }
        Ok(())
    }

    /// Swap the packet of the ongoing transmission and move its end timer.
    fn replace_packet(
        &mut self,
        packet: Packet,
        ctx: &mut ClockContext<'_>,
    ) -> Result<&TxSession, TransmitterError> {
        let Some(session) = self.session.as_mut() else {
            return Err(TransmitterError::NotTransmitting {
                component: self.name.clone(),
            });
        };
        let replacement = TxSession::new(
            &self.name,
            packet,
            session.signal.datarate(),
            session.signal.phase(),
            session.start_time,
        )?;
        ctx.cancel_clock_event(self.tx_end_timer);
        if let Err(err) = ctx.schedule_clock_event(replacement.end_time, self.tx_end_timer) {
            ctx.schedule_clock_event(session.end_time, self.tx_end_timer)?;
            return Err(err.into());
        }
        *session = replacement;
        Ok(session)
    }

    fn take_session(&mut self) -> Result<TxSession, TransmitterError> {
        self.session
            .take()
            .ok_or_else(|| TransmitterError::NotTransmitting {
                component: self.name.clone(),
            })
    }
}

fn encode(
    component: &str,
    packet: Packet,
    datarate: Datarate,
    phase: SignalPhase,
) -> Result<Signal, TransmitterError> {
    let bits = packet.bit_length();
    Signal::encode(packet, datarate, phase).ok_or_else(|| TransmitterError::DurationOverflow {
        component: component.to_owned(),
        bits,
        datarate,
    })
}

impl PacketProcessor for StreamingTransmitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self, port: Port) -> Option<Capabilities> {
        match port {
            Port::Input => Some(
                EndpointKind::PushSink
                    .capabilities()
                    .with(Capability::Streaming),
            ),
            Port::Output(0) => Some(Capabilities::SENDING),
            Port::Output(_) => None,
        }
    }
}
