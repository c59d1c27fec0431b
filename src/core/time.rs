//! Fixed-point time values.
//!
//! Two timelines exist side by side: the global simulation timeline
//! ([`SimTime`]) that the [`Scheduler`](crate::clock::Scheduler) orders events
//! on, and the logical timeline of a clock ([`ClockTime`]) that components
//! reason in. Both are signed picosecond counts so that ordering is exact.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use super::constants::PICOS_PER_SECOND;

/// Round a picosecond count, rejecting values an `i64` cannot hold.
fn picos_from_f64(picos: f64) -> Option<i64> {
    let picos = picos.round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if picos.is_finite() && picos >= i64::MIN as f64 && picos < i64::MAX as f64 {
        Some(picos as i64)
    } else {
        None
    }
}

macro_rules! time_scalar {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// Zero (the timeline origin, or an empty interval).
            pub const ZERO: Self = Self(0);

            /// Largest representable value.
            pub const MAX: Self = Self(i64::MAX);

            /// Create from a raw picosecond count.
            pub const fn from_picos(picos: i64) -> Self {
                Self(picos)
            }

            /// Create from whole seconds.
            pub const fn from_secs(secs: i64) -> Self {
                Self(secs * PICOS_PER_SECOND)
            }

            /// Create from whole milliseconds.
            pub const fn from_millis(millis: i64) -> Self {
                Self(millis * (PICOS_PER_SECOND / 1_000))
            }

            /// Create from fractional seconds, rounded to the nearest picosecond.
            ///
            /// Saturates at [`MAX`](Self::MAX) and its negation; use
            /// [`try_from_secs_f64`](Self::try_from_secs_f64) for untrusted input.
            pub fn from_secs_f64(secs: f64) -> Self {
                Self((secs * PICOS_PER_SECOND as f64).round() as i64)
            }

            /// Create from fractional seconds, or `None` if `secs` is not finite
            /// or lies outside the representable range.
            pub fn try_from_secs_f64(secs: f64) -> Option<Self> {
                picos_from_f64(secs * PICOS_PER_SECOND as f64).map(Self)
            }

            /// Raw picosecond count.
            pub const fn as_picos(self) -> i64 {
                self.0
            }

            /// Value in fractional seconds.
            pub fn as_secs_f64(self) -> f64 {
                self.0 as f64 / PICOS_PER_SECOND as f64
            }

            /// Check if the value is strictly negative.
            pub const fn is_negative(self) -> bool {
                self.0 < 0
            }

            /// Saturating subtraction, clamped at zero.
            pub fn saturating_elapsed_since(self, earlier: Self) -> Self {
                Self(self.0.saturating_sub(earlier.0).max(0))
            }

            /// Multiply by a dimensionless factor, rounding to the nearest picosecond.
            ///
            /// A factor of exactly `1.0` is a no-op so that drift-free clocks
            /// never lose precision.
            pub fn scale(self, factor: f64) -> Self {
                if factor == 1.0 {
                    self
                } else {
                    Self((self.0 as f64 * factor).round() as i64)
                }
            }

            /// Like [`scale`](Self::scale), or `None` if the result is out of range.
            pub fn checked_scale(self, factor: f64) -> Option<Self> {
                if factor == 1.0 {
                    Some(self)
                } else {
                    picos_from_f64(self.0 as f64 * factor).map(Self)
                }
            }

            /// Divide by a dimensionless factor, rounding to the nearest picosecond.
            pub fn unscale(self, factor: f64) -> Self {
                if factor == 1.0 {
                    self
                } else {
                    Self((self.0 as f64 / factor).round() as i64)
                }
            }

            /// Addition, or `None` on overflow.
            pub const fn checked_add(self, rhs: Self) -> Option<Self> {
                match self.0.checked_add(rhs.0) {
                    Some(picos) => Some(Self(picos)),
                    None => None,
                }
            }

            /// Subtraction, or `None` on overflow.
            pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
                match self.0.checked_sub(rhs.0) {
                    Some(picos) => Some(Self(picos)),
                    None => None,
                }
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Neg for $name {
            type Output = Self;

            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}s", self.as_secs_f64())
            }
        }
    };
}

time_scalar!(
    /// A point on (or an interval of) the global simulation timeline.
    SimTime
);

time_scalar!(
    /// A point on (or an interval of) a logical clock's timeline.
    ClockTime
);

impl ClockTime {
    /// Reinterpret a simulation-time interval as a clock-time interval.
    pub const fn from_sim(t: SimTime) -> Self {
        Self(t.as_picos())
    }

    /// Reinterpret this clock-time interval as a simulation-time interval.
    pub const fn as_sim(self) -> SimTime {
        SimTime::from_picos(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_conversion_is_exact_for_whole_units() {
        assert_eq!(SimTime::from_secs(1).as_picos(), PICOS_PER_SECOND);
        assert_eq!(SimTime::from_secs_f64(0.4), SimTime::from_millis(400));
        assert!((ClockTime::from_millis(1500).as_secs_f64() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_scale_identity_is_exact() {
        let t = SimTime::from_picos(i64::MAX / 2 + 1);
        assert_eq!(t.scale(1.0), t);
        assert_eq!(t.unscale(1.0), t);
    }

    #[test]
    fn test_scale_and_unscale() {
        let t = ClockTime::from_secs(10);
        assert_eq!(t.scale(1.1), ClockTime::from_secs(11));
        assert_eq!(ClockTime::from_secs(11).unscale(1.1), t);
    }

    #[test]
    fn test_saturating_elapsed() {
        let a = SimTime::from_secs(3);
        let b = SimTime::from_secs(5);
        assert_eq!(b.saturating_elapsed_since(a), SimTime::from_secs(2));
        assert_eq!(a.saturating_elapsed_since(b), SimTime::ZERO);
    }

    #[test]
    fn test_out_of_range_seconds_rejected() {
        assert_eq!(SimTime::try_from_secs_f64(0.25), Some(SimTime::from_millis(250)));
        assert_eq!(SimTime::try_from_secs_f64(1e8), None);
        assert_eq!(SimTime::try_from_secs_f64(f64::NAN), None);
        assert_eq!(ClockTime::try_from_secs_f64(-1e8), None);
        // Largest whole second count that fits: about 106 days.
        assert!(SimTime::try_from_secs_f64(9_223_372.0).is_some());
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = SimTime::MAX;
        assert_eq!(max.checked_add(SimTime::from_picos(1)), None);
        assert_eq!(
            SimTime::from_secs(1).checked_add(SimTime::from_secs(2)),
            Some(SimTime::from_secs(3))
        );
        assert_eq!(SimTime::from_picos(i64::MIN).checked_sub(SimTime::from_picos(1)), None);
        assert_eq!(ClockTime::from_secs(10).checked_scale(1.1), Some(ClockTime::from_secs(11)));
        assert_eq!(ClockTime::MAX.checked_scale(2.0), None);
        assert_eq!(ClockTime::MAX.checked_scale(1.0), Some(ClockTime::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime::from_millis(250).to_string(), "0.25s");
    }
}
