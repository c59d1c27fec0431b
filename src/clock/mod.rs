//! Time keeping: the global scheduler and logical clocks layered on it.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  components (tx, rx, ...)    │  reason in ClockTime
//! ├──────────────────────────────┤
//! │  LogicalClock                │  drift, jumps, rescheduling
//! ├──────────────────────────────┤
//! │  Scheduler                   │  SimTime, FIFO ties, timer arena
//! └──────────────────────────────┘
//! ```
//!
//! Everything runs on one logical thread. Waiting is expressed by scheduling
//! a timer and returning control to whoever drives the [`Scheduler`].

mod error;
mod linear;
mod scheduler;

pub use error::ClockError;
pub use linear::LogicalClock;
pub use scheduler::{FiredTimer, Scheduler, TimerId};

use crate::core::{ClockTime, SimTime};

/// The scheduler and the clock a component runs on, borrowed together for
/// the duration of one handler.
#[derive(Debug)]
pub struct ClockContext<'a> {
    /// Global timeline.
    pub scheduler: &'a mut Scheduler,
    /// The component's clock.
    pub clock: &'a mut LogicalClock,
}

impl<'a> ClockContext<'a> {
    /// Bundle a scheduler and a clock.
    pub fn new(scheduler: &'a mut Scheduler, clock: &'a mut LogicalClock) -> Self {
        Self { scheduler, clock }
    }

    /// Current clock time.
    pub fn clock_now(&self) -> ClockTime {
        self.clock.now(self.scheduler)
    }

    /// Current global time.
    pub fn sim_now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Schedule `timer` at clock time `deadline`.
    pub fn schedule_clock_event(
        &mut self,
        deadline: ClockTime,
        timer: TimerId,
    ) -> Result<(), ClockError> {
        self.clock.schedule(self.scheduler, deadline, timer)
    }

    /// Cancel `timer`. Returns `false` if it was not scheduled.
    pub fn cancel_clock_event(&mut self, timer: TimerId) -> bool {
        self.clock.cancel(self.scheduler, timer)
    }

    /// Clock time at which `timer` is due.
    pub fn arrival_clock_time(&self, timer: TimerId) -> Result<ClockTime, ClockError> {
        self.clock.arrival_time(self.scheduler, timer)
    }

    /// Check if `timer` is scheduled.
    pub fn is_scheduled(&self, timer: TimerId) -> bool {
        self.scheduler.is_scheduled(timer)
    }
}
