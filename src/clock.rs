//! Free-running microsecond counter abstraction.
//!
//! Bus timing is policed against a hardware timer that keeps counting and
//! wraps at its bit width. Elapsed durations are always computed with modular
//! subtraction, so a single rollover between two readings is harmless.

/// Raw counter value produced by a [`Clock`].
pub trait Ticks: Copy {
    /// Microseconds from `earlier` to `self`, tolerating one wraparound.
    fn wrapping_since(self, earlier: Self) -> u32;
}

macro_rules! impl_ticks {
    ($($ty:ty),*) => {
        $(
            impl Ticks for $ty {
                #[inline]
                fn wrapping_since(self, earlier: Self) -> u32 {
                    u32::from(self.wrapping_sub(earlier))
                }
            }
        )*
    };
}

impl_ticks!(u8, u16, u32);

/// Free-running, wraparound-tolerant microsecond counter.
///
/// One tick must be at most 1 µs; the tightest protocol margins are 1–2 µs.
pub trait Clock {
    /// Counter width used by the underlying timer.
    type Instant: Ticks;

    /// Samples the counter.
    fn now(&mut self) -> Self::Instant;

    /// Microseconds elapsed since `since`.
    fn elapsed(&mut self, since: Self::Instant) -> u32 {
        self.now().wrapping_since(since)
    }
}

impl<C: Clock + ?Sized> Clock for &mut C {
    type Instant = C::Instant;

    fn now(&mut self) -> Self::Instant {
        (**self).now()
    }

    fn elapsed(&mut self, since: Self::Instant) -> u32 {
        (**self).elapsed(since)
    }
}
