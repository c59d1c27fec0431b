//! In-process transmission medium.
//!
//! A [`Channel`] carries [`Signal`]s from a transmitter to a receiver after a
//! fixed propagation delay. Each signal in flight occupies one delivery timer
//! on the global scheduler; signals due at the same instant are delivered in
//! the order they were sent.

use std::collections::BTreeMap;

use crate::clock::{ClockError, Scheduler, TimerId};
use crate::core::constants::DELIVERY_TIMER_NAME;
use crate::core::{ChannelConfig, ConfigError, SimTime};

use super::signal::Signal;

/// Anything a transmitter can put signals onto.
pub trait SignalSink {
    /// Send `signal`; it arrives at the far end later.
    fn send_signal(&mut self, signal: Signal, scheduler: &mut Scheduler) -> Result<(), ClockError>;
}

/// Point-to-point channel with a propagation delay.
#[derive(Debug)]
pub struct Channel {
    name: String,
    delay: SimTime,
    in_flight: BTreeMap<TimerId, Signal>,
    idle_timers: Vec<TimerId>,
}

impl Channel {
    /// Create a channel from configuration.
    pub fn new(config: &ChannelConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            name: config.name.clone(),
            delay: config.delay()?,
            in_flight: BTreeMap::new(),
            idle_timers: Vec::new(),
        })
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Propagation delay.
    pub fn delay(&self) -> SimTime {
        self.delay
    }

    /// Check if `timer` is one of this channel's delivery timers.
    pub fn owns_timer(&self, timer: TimerId) -> bool {
        self.in_flight.contains_key(&timer)
    }

    /// Number of signals in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Take the signal whose delivery timer fired.
    pub fn deliver(&mut self, timer: TimerId) -> Option<Signal> {
        let signal = self.in_flight.remove(&timer)?;
        self.idle_timers.push(timer);
        Some(signal)
    }
}

impl SignalSink for Channel {
    fn send_signal(&mut self, signal: Signal, scheduler: &mut Scheduler) -> Result<(), ClockError> {
        let timer = match self.idle_timers.pop() {
            Some(timer) => timer,
            None => scheduler.create_timer(DELIVERY_TIMER_NAME),
        };
        if let Err(err) = scheduler.schedule_after(timer, self.delay) {
            self.idle_timers.push(timer);
            return Err(err);
        }
        tracing::trace!(
            channel = %self.name,
            packet = %signal.packet(),
            delay = %self.delay,
            "signal sent"
        );
        self.in_flight.insert(timer, signal);
        Ok(())
    }
}
