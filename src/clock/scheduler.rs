//! Global simulation timeline.
//!
//! Single-threaded discrete-event scheduler. Timers are allocated once from a
//! generational arena and then scheduled, cancelled and rescheduled any number
//! of times. Events fire in nondecreasing [`SimTime`] order; ties fire in the
//! order they were scheduled.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use crate::core::SimTime;

use super::error::ClockError;

/// Handle to a timer slot. Carries a generation so a handle to a deleted
/// timer can never address the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    index: u32,
    generation: u32,
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}.{}", self.index, self.generation)
    }
}

/// A timer that has just fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    /// Global time at which it fired.
    pub time: SimTime,
    /// Which timer.
    pub timer: TimerId,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    time: SimTime,
    seq: u64,
}

#[derive(Debug)]
enum Slot {
    Occupied {
        name: String,
        generation: u32,
        pending: Option<Pending>,
    },
    Free {
        generation: u32,
    },
}

/// Discrete-event scheduler over the global timeline.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: SimTime,
    next_seq: u64,
    slots: Vec<Slot>,
    free: Vec<u32>,
    // (time, seq, timer); entries whose seq no longer matches the slot are stale.
    queue: BinaryHeap<Reverse<(SimTime, u64, TimerId)>>,
    scheduled: usize,
}

impl Scheduler {
    /// Create a scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current global time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Allocate a timer. It starts out unscheduled.
    pub fn create_timer(&mut self, name: impl Into<String>) -> TimerId {
        let name = name.into();
        if let Some(index) = self.free.pop() {
            let generation = match self.slots[index as usize] {
                Slot::Free { generation } => generation,
                Slot::Occupied { .. } => unreachable!("free list must point to free slots"),
            };
            self.slots[index as usize] = Slot::Occupied {
                name,
                generation,
                pending: None,
            };
            return TimerId { index, generation };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied {
            name,
            generation: 0,
            pending: None,
        });
        TimerId {
            index,
            generation: 0,
        }
    }

    /// Release a timer, cancelling it first if scheduled.
    pub fn delete_timer(&mut self, timer: TimerId) -> Result<(), ClockError> {
        self.slot_pending_mut(timer)?;
        if self.cancel(timer) {
            tracing::debug!(%timer, "deleted timer while scheduled");
        }
        self.slots[timer.index as usize] = Slot::Free {
            generation: timer.generation.wrapping_add(1),
        };
        self.free.push(timer.index);
        Ok(())
    }

    /// Name given at creation.
    pub fn timer_name(&self, timer: TimerId) -> Option<&str> {
        match self.slots.get(timer.index as usize)? {
            Slot::Occupied {
                name, generation, ..
            } if *generation == timer.generation => Some(name),
            _ => None,
        }
    }

    /// Schedule `timer` to fire at `time`.
    ///
    /// Fails if the timer is already scheduled, has been deleted, or `time`
    /// lies in the past.
    pub fn schedule_at(&mut self, timer: TimerId, time: SimTime) -> Result<(), ClockError> {
        let now = self.now;
        if time < now {
            return Err(ClockError::ScheduleInPast {
                timer,
                requested: time,
                now,
            });
        }
        let seq = self.next_seq;
        let pending = self.slot_pending_mut(timer)?;
        if pending.is_some() {
            return Err(ClockError::AlreadyScheduled(timer));
        }
        *pending = Some(Pending { time, seq });
        self.next_seq += 1;
        self.scheduled += 1;
        self.queue.push(Reverse((time, seq, timer)));
        Ok(())
    }

    /// Schedule `timer` to fire `delay` after the current time.
    pub fn schedule_after(&mut self, timer: TimerId, delay: SimTime) -> Result<(), ClockError> {
        let time = self
            .now
            .checked_add(delay)
            .ok_or(ClockError::TimeOverflow(timer))?;
        self.schedule_at(timer, time)
    }

    /// Cancel `timer`. Returns `false` if it was not scheduled (or is stale).
    pub fn cancel(&mut self, timer: TimerId) -> bool {
        match self.slot_pending_mut(timer) {
            Ok(pending) if pending.is_some() => {
                *pending = None;
                self.scheduled -= 1;
                true
            }
            _ => false,
        }
    }

    /// Check if `timer` is currently scheduled.
    pub fn is_scheduled(&self, timer: TimerId) -> bool {
        self.deadline(timer).is_some()
    }

    /// When `timer` will fire, if scheduled.
    pub fn deadline(&self, timer: TimerId) -> Option<SimTime> {
        match self.slots.get(timer.index as usize)? {
            Slot::Occupied {
                generation,
                pending: Some(pending),
                ..
            } if *generation == timer.generation => Some(pending.time),
            _ => None,
        }
    }

    /// Number of scheduled timers.
    pub fn scheduled_count(&self) -> usize {
        self.scheduled
    }

    /// Time of the next event, if any.
    pub fn next_event_time(&mut self) -> Option<SimTime> {
        self.discard_stale();
        self.queue.peek().map(|Reverse((time, _, _))| *time)
    }

    /// Fire the next event, advancing the clock to its time.
    pub fn pop(&mut self) -> Option<FiredTimer> {
        self.discard_stale();
        let Reverse((time, _, timer)) = self.queue.pop()?;
        if let Ok(pending) = self.slot_pending_mut(timer) {
            *pending = None;
        }
        self.scheduled -= 1;
        self.now = time;
        Some(FiredTimer { time, timer })
    }

    /// Advance the clock to `time` without firing anything.
    ///
    /// Fails if an event is due before `time` or `time` lies in the past.
    pub fn advance_to(&mut self, time: SimTime) -> Result<(), ClockError> {
        if time < self.now {
            return Err(ClockError::TimeReversal {
                requested: time,
                now: self.now,
            });
        }
        if let Some(next) = self.next_event_time()
            && next < time
        {
            return Err(ClockError::EventSkipped {
                requested: time,
                next,
            });
        }
        self.now = time;
        Ok(())
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse((_, seq, timer))) = self.queue.peek() {
            let live = matches!(
                self.slots.get(timer.index as usize),
                Some(Slot::Occupied { generation, pending: Some(p), .. })
                    if *generation == timer.generation && p.seq == *seq
            );
            if live {
                break;
            }
            self.queue.pop();
        }
    }

    fn slot_pending_mut(&mut self, timer: TimerId) -> Result<&mut Option<Pending>, ClockError> {
        match self.slots.get_mut(timer.index as usize) {
            Some(Slot::Occupied {
                generation,
                pending,
                ..
            }) if *generation == timer.generation => Ok(pending),
            _ => Err(ClockError::StaleTimer(timer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_fire_in_time_order() {
        let mut sched = Scheduler::new();
        let a = sched.create_timer("a");
        let b = sched.create_timer("b");
        sched.schedule_at(a, SimTime::from_secs(2)).unwrap();
        sched.schedule_at(b, SimTime::from_secs(1)).unwrap();

        assert_eq!(sched.pop().unwrap().timer, b);
        assert_eq!(sched.now(), SimTime::from_secs(1));
        assert_eq!(sched.pop().unwrap().timer, a);
        assert_eq!(sched.now(), SimTime::from_secs(2));
        assert!(sched.pop().is_none());
    }

    #[test]
    fn test_ties_fire_fifo() {
        let mut sched = Scheduler::new();
        let timers: Vec<_> = (0..5).map(|i| sched.create_timer(format!("t{i}"))).collect();
        for t in timers.iter().rev() {
            sched.schedule_at(*t, SimTime::from_secs(1)).unwrap();
        }

        let fired: Vec<_> = std::iter::from_fn(|| sched.pop().map(|f| f.timer)).collect();
        let expected: Vec<_> = timers.iter().rev().copied().collect();
        assert_eq!(fired, expected);
    }

    #[test]
    fn test_double_schedule_rejected() {
        let mut sched = Scheduler::new();
        let t = sched.create_timer("t");
        sched.schedule_at(t, SimTime::from_secs(1)).unwrap();
        assert_eq!(
            sched.schedule_at(t, SimTime::from_secs(2)),
            Err(ClockError::AlreadyScheduled(t))
        );
    }

    #[test]
    fn test_schedule_in_past_rejected() {
        let mut sched = Scheduler::new();
        let t = sched.create_timer("t");
        sched.advance_to(SimTime::from_secs(5)).unwrap();
        assert!(matches!(
            sched.schedule_at(t, SimTime::from_secs(4)),
            Err(ClockError::ScheduleInPast { .. })
        ));
        assert!(sched.schedule_at(t, SimTime::from_secs(5)).is_ok());
    }

    #[test]
    fn test_cancel_and_reschedule() {
        let mut sched = Scheduler::new();
        let t = sched.create_timer("t");
        sched.schedule_at(t, SimTime::from_secs(1)).unwrap();
        assert!(sched.cancel(t));
        assert!(!sched.cancel(t));
        assert!(!sched.is_scheduled(t));

        sched.schedule_at(t, SimTime::from_secs(3)).unwrap();
        let fired = sched.pop().unwrap();
        assert_eq!(fired.time, SimTime::from_secs(3));
        assert!(sched.pop().is_none());
        assert_eq!(sched.scheduled_count(), 0);
    }

    #[test]
    fn test_deleted_handle_is_stale() {
        let mut sched = Scheduler::new();
        let old = sched.create_timer("old");
        sched.schedule_at(old, SimTime::from_secs(1)).unwrap();
        sched.delete_timer(old).unwrap();

        let new = sched.create_timer("new");
        assert_ne!(old, new);
        assert_eq!(sched.timer_name(new), Some("new"));
        assert_eq!(sched.timer_name(old), None);
        assert_eq!(
            sched.schedule_at(old, SimTime::from_secs(1)),
            Err(ClockError::StaleTimer(old))
        );
        assert!(!sched.cancel(old));
        assert!(sched.pop().is_none());
    }

    #[test]
    fn test_advance_cannot_skip_events() {
        let mut sched = Scheduler::new();
        let t = sched.create_timer("t");
        sched.schedule_at(t, SimTime::from_secs(1)).unwrap();
        assert!(matches!(
            sched.advance_to(SimTime::from_secs(2)),
            Err(ClockError::EventSkipped { .. })
        ));
        assert!(sched.advance_to(SimTime::from_secs(1)).is_ok());
        assert!(matches!(
            sched.advance_to(SimTime::ZERO),
            Err(ClockError::TimeReversal { .. })
        ));
    }

    #[test]
    fn test_schedule_after_rejects_overflow() {
        let mut sched = Scheduler::new();
        let t = sched.create_timer("t");
        sched.advance_to(SimTime::from_secs(1)).unwrap();

        assert_eq!(
            sched.schedule_after(t, SimTime::MAX),
            Err(ClockError::TimeOverflow(t))
        );
        assert!(!sched.is_scheduled(t));

        sched.schedule_after(t, SimTime::from_millis(250)).unwrap();
        assert_eq!(sched.deadline(t), Some(SimTime::from_millis(1250)));
    }
}
