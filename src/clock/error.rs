//! Clock and scheduler errors.

use thiserror::Error;

use crate::core::SimTime;

use super::scheduler::TimerId;

/// Errors from the scheduler and logical clocks.
///
/// All of these are sequencing bugs in the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClockError {
    /// Timer is already scheduled.
    #[error("{0} is already scheduled")]
    AlreadyScheduled(TimerId),

    /// Timer is not scheduled.
    #[error("{0} is not scheduled")]
    NotScheduled(TimerId),

    /// Timer handle refers to a deleted timer.
    #[error("{0} has been deleted")]
    StaleTimer(TimerId),

    /// Requested global time lies before the current time.
    #[error("cannot schedule {timer} at {requested}, now is {now}")]
    ScheduleInPast {
        /// Timer being scheduled.
        timer: TimerId,
        /// Requested time.
        requested: SimTime,
        /// Current time.
        now: SimTime,
    },

    /// Moving the global clock backwards.
    #[error("cannot move time back to {requested}, now is {now}")]
    TimeReversal {
        /// Requested time.
        requested: SimTime,
        /// Current time.
        now: SimTime,
    },

    /// Advancing past an event that has not fired.
    #[error("cannot advance to {requested}, an event is due at {next}")]
    EventSkipped {
        /// Requested time.
        requested: SimTime,
        /// Next event time.
        next: SimTime,
    },

    /// Deadline that does not fit on the timeline.
    #[error("deadline of {0} lies beyond the representable time range")]
    TimeOverflow(TimerId),

    /// Drift rate at or below -1 stops or reverses the clock.
    #[error("drift rate {0} stops or reverses the clock")]
    InvalidDriftRate(f64),

    /// Clock torn down while timers are still scheduled.
    #[error("{0} timers still scheduled on the clock")]
    TimersPending(usize),
}
