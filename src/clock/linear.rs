//! Settable linear clock.
//!
//! A [`LogicalClock`] maps its own timeline onto the global one:
//!
//! ```text
//! clock(t)    = origin_clock + (t - origin) / (1 + drift)
//! global(c)   = origin + (c - origin_clock) * (1 + drift)
//! ```
//!
//! The clock may be jumped ([`LogicalClock::set_clock_time`]) or retuned
//! ([`LogicalClock::set_drift_rate`]) while timers are pending. Both re-derive
//! the global deadline of every pending timer from its logical deadline, so
//! timers keep firing at the right logical instant.

use std::collections::BTreeMap;

use crate::core::{ClockConfig, ClockTime, SimTime};

use super::error::ClockError;
use super::scheduler::{Scheduler, TimerId};

#[derive(Debug, Clone, Copy)]
struct ClockTimer {
    /// Requested deadline on this clock.
    clock_deadline: ClockTime,
    /// Where the scheduler currently holds it.
    sim_deadline: SimTime,
    /// Insertion order, for stable ordering of equal deadlines.
    order: u64,
}

/// Drift-capable logical clock layered on a [`Scheduler`].
///
/// The clock owns the bookkeeping for timers scheduled through it; the
/// scheduler owns the timers themselves. One clock per subsystem.
#[derive(Debug)]
pub struct LogicalClock {
    origin: SimTime,
    origin_clock: ClockTime,
    drift_rate: f64,
    timers: BTreeMap<TimerId, ClockTimer>,
    next_order: u64,
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::ideal()
    }
}

impl ClockTimer {
    /// Still scheduled where this clock put it.
    fn is_live(&self, scheduler: &Scheduler, timer: TimerId) -> bool {
        scheduler.deadline(timer) == Some(self.sim_deadline)
    }
}

impl LogicalClock {
    /// Create a clock from configuration.
    pub fn new(config: &ClockConfig) -> Result<Self, ClockError> {
        let drift_rate = config.drift_rate();
        check_drift_rate(drift_rate)?;
        Ok(Self {
            origin: config.origin(),
            origin_clock: config.origin_clock(),
            drift_rate,
            timers: BTreeMap::new(),
            next_order: 0,
        })
    }

    /// A drift-free clock that reads the global time.
    pub fn ideal() -> Self {
        Self {
            origin: SimTime::ZERO,
            origin_clock: ClockTime::ZERO,
            drift_rate: 0.0,
            timers: BTreeMap::new(),
            next_order: 0,
        }
    }

    /// Current clock time.
    pub fn now(&self, scheduler: &Scheduler) -> ClockTime {
        self.clock_time_at(scheduler.now())
    }

    /// Clock reading at global time `t`.
    pub fn clock_time_at(&self, t: SimTime) -> ClockTime {
        self.origin_clock + ClockTime::from_sim(t - self.origin).unscale(self.rate_factor())
    }

    /// Global time at which the clock reads `t`, or `None` if that lies
    /// outside the representable range.
    pub fn sim_time_of(&self, t: ClockTime) -> Option<SimTime> {
        let offset = t
            .checked_sub(self.origin_clock)?
            .as_sim()
            .checked_scale(self.rate_factor())?;
        self.origin.checked_add(offset)
    }

    /// Schedule `timer` to fire when the clock reads `deadline`.
    ///
    /// A deadline the clock has already passed fires at the current global
    /// time.
    pub fn schedule(
        &mut self,
        scheduler: &mut Scheduler,
        deadline: ClockTime,
        timer: TimerId,
    ) -> Result<(), ClockError> {
        self.purge_expired(scheduler);
        if scheduler.is_scheduled(timer) {
            return Err(ClockError::AlreadyScheduled(timer));
        }
        let sim_deadline = self
            .sim_time_of(deadline)
            .ok_or(ClockError::TimeOverflow(timer))?
            .max(scheduler.now());
        scheduler.schedule_at(timer, sim_deadline)?;
        let order = self.next_order;
        self.next_order += 1;
        self.timers.insert(
            timer,
            ClockTimer {
                clock_deadline: deadline,
                sim_deadline,
                order,
            },
        );
        Ok(())
    }

    /// Cancel `timer`. Returns `false` if it was not scheduled.
    pub fn cancel(&mut self, scheduler: &mut Scheduler, timer: TimerId) -> bool {
        self.timers.remove(&timer);
        scheduler.cancel(timer)
    }

    /// Clock time at which a scheduled `timer` is due.
    ///
    /// The timer must be scheduled through this clock.
    pub fn arrival_time(
        &self,
        scheduler: &Scheduler,
        timer: TimerId,
    ) -> Result<ClockTime, ClockError> {
        match self.timers.get(&timer) {
            Some(entry) if entry.is_live(scheduler, timer) => Ok(entry.clock_deadline),
            _ => Err(ClockError::NotScheduled(timer)),
        }
    }

    /// Change the drift rate, keeping the clock reading continuous.
    ///
    /// Every pending timer keeps its logical deadline; global deadlines are
    /// recomputed under the new rate. On error the clock is left unchanged.
    pub fn set_drift_rate(
        &mut self,
        scheduler: &mut Scheduler,
        drift_rate: f64,
    ) -> Result<(), ClockError> {
        check_drift_rate(drift_rate)?;
        let now = scheduler.now();
        let origin_clock = self.clock_time_at(now);
        self.retune(scheduler, origin_clock, drift_rate)?;
        tracing::debug!(drift_rate, "clock drift rate changed");
        Ok(())
    }

    /// Jump the clock to read `t` now, forward or backward.
    ///
    /// Timers whose new global deadline would be in the past fire now. On
    /// error the clock is left unchanged.
    pub fn set_clock_time(
        &mut self,
        scheduler: &mut Scheduler,
        t: ClockTime,
    ) -> Result<(), ClockError> {
        self.retune(scheduler, t, self.drift_rate)?;
        tracing::debug!(clock_time = %t, "clock time set");
        Ok(())
    }

    /// Forget timers that fired, were cancelled or were re-armed behind the
    /// clock's back.
    ///
    /// Returns the number of entries dropped.
    pub fn purge_expired(&mut self, scheduler: &Scheduler) -> usize {
        let before = self.timers.len();
        self.timers.retain(|timer, entry| entry.is_live(scheduler, *timer));
        before - self.timers.len()
    }

    /// Tear the clock down. Every timer must have been cancelled or fired.
    pub fn close(mut self, scheduler: &Scheduler) -> Result<(), ClockError> {
        self.purge_expired(scheduler);
        if self.timers.is_empty() {
            Ok(())
        } else {
            Err(ClockError::TimersPending(self.timers.len()))
        }
    }

    /// Current dimensionless drift rate.
    pub fn drift_rate(&self) -> f64 {
        self.drift_rate
    }

    /// Global time at which the clock was last pinned.
    pub fn origin(&self) -> SimTime {
        self.origin
    }

    /// Clock reading at [`origin`](Self::origin).
    pub fn origin_clock(&self) -> ClockTime {
        self.origin_clock
    }

    /// Number of timers tracked by the clock (including fired ones not yet purged).
    pub fn tracked_count(&self) -> usize {
        self.timers.len()
    }

    /// Check if `timer` is scheduled through this clock.
    pub fn is_pending(&self, scheduler: &Scheduler, timer: TimerId) -> bool {
        self.timers
            .get(&timer)
            .is_some_and(|entry| entry.is_live(scheduler, timer))
    }

    fn rate_factor(&self) -> f64 {
        1.0 + self.drift_rate
    }

    /// Re-pin the clock at the current global time and move every pending
    /// timer to its global deadline under the new mapping.
    fn retune(
        &mut self,
        scheduler: &mut Scheduler,
        origin_clock: ClockTime,
        drift_rate: f64,
    ) -> Result<(), ClockError> {
        self.purge_expired(scheduler);
        let previous = (self.origin, self.origin_clock, self.drift_rate);
        self.origin = scheduler.now();
        self.origin_clock = origin_clock;
        self.drift_rate = drift_rate;

        match self.plan_reschedule(scheduler.now()) {
            Ok(plan) => self.apply_reschedule(scheduler, plan),
            Err(err) => {
                (self.origin, self.origin_clock, self.drift_rate) = previous;
                Err(err)
            }
        }
    }

    /// New global deadlines in logical-deadline order.
    fn plan_reschedule(&self, now: SimTime) -> Result<Vec<(TimerId, SimTime)>, ClockError> {
        let mut pending: Vec<_> = self.timers.iter().collect();
        pending.sort_by_key(|(_, t)| (t.clock_deadline, t.order));
        pending
            .into_iter()
            .map(|(timer, entry)| {
                let sim_deadline = self
                    .sim_time_of(entry.clock_deadline)
                    .ok_or(ClockError::TimeOverflow(*timer))?;
                Ok((*timer, sim_deadline.max(now)))
            })
            .collect()
    }

    fn apply_reschedule(
        &mut self,
        scheduler: &mut Scheduler,
        plan: Vec<(TimerId, SimTime)>,
    ) -> Result<(), ClockError> {
        // Cancel everything first so reinsertion order alone decides ties.
        for (timer, _) in &plan {
            scheduler.cancel(*timer);
        }
        for (timer, sim_deadline) in plan {
            scheduler.schedule_at(timer, sim_deadline)?;
            if let Some(slot) = self.timers.get_mut(&timer) {
                slot.sim_deadline = sim_deadline;
            }
        }
        tracing::debug!(timers = self.timers.len(), "clock timers rescheduled");
        Ok(())
    }
}

fn check_drift_rate(drift_rate: f64) -> Result<(), ClockError> {
    if drift_rate.is_finite() && 1.0 + drift_rate > 0.0 {
        Ok(())
    } else {
        Err(ClockError::InvalidDriftRate(drift_rate))
    }
}
