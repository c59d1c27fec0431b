//! A complete point-to-point link driven by one event loop.
//!
//! [`Link`] owns the global [`Scheduler`], the transmitter-side
//! [`LogicalClock`] and the three physical-layer components, and routes each
//! fired timer to the component that owns it. The producer and consumer are
//! supplied by the caller.
//!
//! ```rust
//! use linkflow::prelude::*;
//!
//! #[derive(Default)]
//! struct Source {
//!     invited: bool,
//! }
//!
//! impl PacketProducer for Source {
//!     fn handle_packet_processed(&mut self, _packet: &Packet, _success: bool) {}
//!
//!     fn handle_can_push_again(&mut self) {
//!         self.invited = true;
//!     }
//! }
//!
//! let config = LinkConfig {
//!     transmitter: TransmitterConfig::default().with_datarate_bps(1000),
//!     ..Default::default()
//! };
//! let mut link = Link::new(&config, Source::default(), PacketQueue::unbounded("sink"))?;
//! link.start()?;
//! assert!(link.producer().invited);
//!
//! link.push(Packet::with_bit_length("hello", 1000))?;
//! link.run()?;
//!
//! assert_eq!(link.now(), SimTime::from_secs(1));
//! assert_eq!(link.consumer().len(), 1);
//! # Ok::<(), LinkError>(())
//! ```

use crate::clock::{ClockContext, FiredTimer, LogicalClock, Scheduler};
use crate::contract::{Endpoint, EndpointKind, PacketProcessor, Port, Wiring};
use crate::core::{
    ClockTime, LinkConfig, LinkError, LinkEvent, Packet, PacketProducer, SimTime, StreamSink,
};
use crate::transceiver::{Channel, LifecycleOperation, StreamingReceiver, StreamingTransmitter};

/// Transmitter, channel and receiver between a producer and a consumer.
#[derive(Debug)]
pub struct Link<P, C> {
    scheduler: Scheduler,
    clock: LogicalClock,
    transmitter: StreamingTransmitter,
    channel: Channel,
    receiver: StreamingReceiver,
    producer: P,
    consumer: C,
}

impl<P: PacketProducer, C: StreamSink> Link<P, C> {
    /// Build a link and validate its wiring. Components start out not
    /// operating; call [`start`](Self::start) before pushing.
    pub fn new(config: &LinkConfig, producer: P, consumer: C) -> Result<Self, LinkError> {
        config.validate()?;
        let mut scheduler = Scheduler::new();
        let clock = LogicalClock::new(&config.clock)?;
        let transmitter = StreamingTransmitter::new(&config.transmitter, &mut scheduler)?;
        let channel = Channel::new(&config.channel)?;
        let receiver = StreamingReceiver::new(&config.receiver);

        let consumer_input = Endpoint::new("consumer", Port::Input, EndpointKind::StreamingSink);
        Wiring::new()
            .connect(transmitter.endpoint(Port::Output(0)), None)
            .connect(None, receiver.endpoint(Port::Input))
            .connect(receiver.endpoint(Port::Output(0)), Some(consumer_input))
            .validate()?;

        tracing::debug!(
            transmitter = %transmitter.name(),
            channel = %channel.name(),
            receiver = %receiver.name(),
            "link wired"
        );
        Ok(Self {
            scheduler,
            clock,
            transmitter,
            channel,
            receiver,
            producer,
            consumer,
        })
    }

    /// Bring both interfaces up. The producer is invited to push.
    pub fn start(&mut self) -> Result<(), LinkError> {
        self.apply(LifecycleOperation::Start)
    }

    /// Shut both interfaces down, aborting any transmission in progress.
    pub fn stop(&mut self) -> Result<(), LinkError> {
        self.apply(LifecycleOperation::Stop)
    }

    /// Crash both interfaces.
    pub fn crash(&mut self) -> Result<(), LinkError> {
        self.apply(LifecycleOperation::Crash)
    }

    fn apply(&mut self, operation: LifecycleOperation) -> Result<(), LinkError> {
        // The receiver comes up first so the first signal finds it operating.
        if operation == LifecycleOperation::Start {
            self.receiver.handle_lifecycle(operation);
        }
        let mut ctx = ClockContext::new(&mut self.scheduler, &mut self.clock);
        self.transmitter
            .handle_lifecycle(operation, &mut ctx, &mut self.channel, &mut self.producer)?;
        if operation != LifecycleOperation::Start {
            self.receiver.handle_lifecycle(operation);
        }
        Ok(())
    }

    /// Check if the transmitter accepts a packet now.
    pub fn can_push(&self) -> bool {
        self.transmitter.can_push()
    }

    /// Start transmitting a whole packet.
    pub fn push(&mut self, packet: Packet) -> Result<(), LinkError> {
        let mut ctx = ClockContext::new(&mut self.scheduler, &mut self.clock);
        self.transmitter.push(packet, &mut ctx, &mut self.channel)?;
        Ok(())
    }

    /// Update the packet being transmitted; `position` bits of it exist
    /// upstream.
    pub fn push_progress(&mut self, packet: Packet, position: u64) -> Result<(), LinkError> {
        let mut ctx = ClockContext::new(&mut self.scheduler, &mut self.clock);
        self.transmitter
            .push_progress(packet, position, &mut ctx, &mut self.channel)?;
        Ok(())
    }

    /// Replace the packet being transmitted with its final form.
    pub fn push_end(&mut self, packet: Packet) -> Result<(), LinkError> {
        let mut ctx = ClockContext::new(&mut self.scheduler, &mut self.clock);
        self.transmitter.push_end(packet, &mut ctx)?;
        Ok(())
    }

    /// Abort the transmission in progress.
    pub fn abort(&mut self) -> Result<(), LinkError> {
        let mut ctx = ClockContext::new(&mut self.scheduler, &mut self.clock);
        self.transmitter
            .abort(&mut ctx, &mut self.channel, &mut self.producer)?;
        Ok(())
    }

    /// Change the transmitter clock's drift rate.
    pub fn set_drift_rate(&mut self, drift_rate: f64) -> Result<(), LinkError> {
        self.clock.set_drift_rate(&mut self.scheduler, drift_rate)?;
        Ok(())
    }

    /// Jump the transmitter clock to read `t` now.
    pub fn set_clock_time(&mut self, t: ClockTime) -> Result<(), LinkError> {
        self.clock.set_clock_time(&mut self.scheduler, t)?;
        Ok(())
    }

    /// Fire the next event. Returns `None` once nothing is scheduled.
    ///
    /// An error is a protocol violation; the link should not be driven
    /// further.
    pub fn step(&mut self) -> Result<Option<FiredTimer>, LinkError> {
        let Some(fired) = self.scheduler.pop() else {
            return Ok(None);
        };
        tracing::trace!(time = %fired.time, timer = %fired.timer, "event");
        if fired.timer == self.transmitter.tx_end_timer() {
            let mut ctx = ClockContext::new(&mut self.scheduler, &mut self.clock);
            self.transmitter.handle_timer(
                fired.timer,
                &mut ctx,
                &mut self.channel,
                &mut self.producer,
            )?;
        } else if let Some(signal) = self.channel.deliver(fired.timer) {
            self.receiver.receive_signal(signal, &mut self.consumer)?;
        } else {
            return Err(LinkError::UnroutedTimer(fired.timer));
        }
        Ok(Some(fired))
    }

    /// Fire every event due at or before `limit`, then move the global time
    /// to `limit`. Returns the number of events fired.
    pub fn run_until(&mut self, limit: SimTime) -> Result<usize, LinkError> {
        let mut fired = 0;
        while self.scheduler.next_event_time().is_some_and(|t| t <= limit) {
            self.step()?;
            fired += 1;
        }
        self.scheduler.advance_to(limit)?;
        Ok(fired)
    }

    /// Fire events until nothing is scheduled. Returns the number fired.
    pub fn run(&mut self) -> Result<usize, LinkError> {
        let mut fired = 0;
        while self.step()?.is_some() {
            fired += 1;
        }
        Ok(fired)
    }

    /// Time of the next scheduled event, if any.
    pub fn next_event_time(&mut self) -> Option<SimTime> {
        self.scheduler.next_event_time()
    }

    /// Current global time.
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Current reading of the transmitter clock.
    pub fn clock_now(&self) -> ClockTime {
        self.clock.now(&self.scheduler)
    }

    /// Bits of the current packet on the wire now.
    pub fn transmitted_length(&self) -> u64 {
        self.transmitter.transmitted_length(self.clock_now())
    }

    /// Take pending notifications, transmitter side first.
    pub fn drain_events(&mut self) -> Vec<LinkEvent> {
        let mut events = self.transmitter.drain_events();
        events.extend(self.receiver.drain_events());
        events
    }

    /// The producer.
    pub fn producer(&self) -> &P {
        &self.producer
    }

    /// The producer, mutably.
    pub fn producer_mut(&mut self) -> &mut P {
        &mut self.producer
    }

    /// The consumer.
    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    /// The consumer, mutably.
    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    /// The transmitter.
    pub fn transmitter(&self) -> &StreamingTransmitter {
        &self.transmitter
    }

    /// The transmitter, mutably, e.g. to change its datarate.
    pub fn transmitter_mut(&mut self) -> &mut StreamingTransmitter {
        &mut self.transmitter
    }

    /// The channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// The receiver.
    pub fn receiver(&self) -> &StreamingReceiver {
        &self.receiver
    }

    /// The global scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The transmitter clock.
    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    /// Tear the link down and hand back the producer and consumer.
    ///
    /// Fails if timers are still pending on the transmitter clock.
    pub fn close(self) -> Result<(P, C), LinkError> {
        self.clock.close(&self.scheduler)?;
        Ok((self.producer, self.consumer))
    }
}
