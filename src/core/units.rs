//! Datarates and bit-position arithmetic.

use std::fmt;
use std::num::NonZeroU64;

use super::constants::PICOS_PER_SECOND;
use super::time::ClockTime;

/// A transmission rate in bits per second. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Datarate(NonZeroU64);

impl Datarate {
    /// Create a datarate, or `None` for zero.
    pub const fn from_bps(bps: u64) -> Option<Self> {
        match NonZeroU64::new(bps) {
            Some(rate) => Some(Self(rate)),
            None => None,
        }
    }

    /// Bits per second.
    pub const fn bps(self) -> u64 {
        self.0.get()
    }

    /// Time needed to put `bits` on the wire.
    ///
    /// Rounded up to the picosecond: a transmission never ends before its
    /// last bit has physically elapsed. `None` if the duration does not fit
    /// in a [`ClockTime`].
    pub fn transmission_time(self, bits: u64) -> Option<ClockTime> {
        let num = bits as u128 * PICOS_PER_SECOND as u128;
        let picos = num.div_ceil(self.bps() as u128);
        i64::try_from(picos).ok().map(ClockTime::from_picos)
    }

    /// Number of whole bits transmitted during `elapsed`.
    ///
    /// Uses floor: never reports a bit that has not fully elapsed. Negative
    /// intervals transmit nothing.
    pub fn bits_in(self, elapsed: ClockTime) -> u64 {
        if elapsed.as_picos() <= 0 {
            return 0;
        }
        let bits = self.bps() as u128 * elapsed.as_picos() as u128 / PICOS_PER_SECOND as u128;
        u64::try_from(bits).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for Datarate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.bps())
    }
}
