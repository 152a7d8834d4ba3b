//! Bit-level signaling on the 1-Wire line.
//!
//! Every bit is a timed low pulse followed by a release: a short pulse writes
//! a one, a long pulse writes a zero, and a short pulse followed by a sample
//! reads whatever the device leaves on the line. A transaction always starts
//! with a reset pulse answered by the device's presence pulse.

use embedded_hal::delay::DelayNs;

use crate::clock::Clock;
use crate::config::Timing;
use crate::error::Result;
use crate::framer::BitIo;
use crate::interface::OneWireBus;

/// Outcome of listening for the presence pulse after a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Presence {
    /// The line never went low inside the wait window.
    NoPulse,
    /// A pulse started but was too short or never ended.
    InvalidPulse,
    /// A well-formed presence pulse was observed.
    Valid,
}

impl Presence {
    /// Collapses the outcome to "a device answered".
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Bit codec owning the line, the microsecond counter and the delay provider.
pub struct BitCodec<BUS, CLK, D> {
    bus: BUS,
    clock: CLK,
    delay: D,
    timing: Timing,
}

impl<BUS, CLK, D> BitCodec<BUS, CLK, D> {
    /// Creates a codec from its capabilities and timing set.
    pub fn new(bus: BUS, clock: CLK, delay: D, timing: Timing) -> Self {
        Self {
            bus,
            clock,
            delay,
            timing,
        }
    }

    /// Consumes the codec and returns the owned capabilities.
    pub fn release(self) -> (BUS, CLK, D) {
        (self.bus, self.clock, self.delay)
    }

    /// Returns the active timing set.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub(crate) fn set_timing(&mut self, timing: Timing) {
        self.timing = timing;
    }

    /// Provides mutable access to the underlying bus.
    pub fn bus_mut(&mut self) -> &mut BUS {
        &mut self.bus
    }
}

impl<BUS, CLK, D> BitCodec<BUS, CLK, D>
where
    BUS: OneWireBus,
    CLK: Clock,
    D: DelayNs,
{
    /// Sends a reset pulse and classifies the device's answer.
    ///
    /// When a pulse is seen, the call returns only after the full presence
    /// receive slot has elapsed, leaving the line idle. When nothing answers,
    /// it returns as soon as the wait window closes.
    pub fn reset(&mut self) -> Result<Presence, BUS::Error> {
        self.bus.release()?;
        self.bus.drive_low()?;
        self.delay.delay_us(self.timing.reset_pulse_us);
        self.bus.release()?;

        self.detect_presence()
    }

    fn detect_presence(&mut self) -> Result<Presence, BUS::Error> {
        let t = self.timing;

        // The device never answers during the quiet time.
        self.delay.delay_us(t.presence_start_us);
        let window_start = self.clock.now();

        let started = loop {
            if !self.bus.sample()? {
                break true;
            }
            if self.clock.elapsed(window_start) >= t.presence_wait_us {
                break false;
            }
        };

        if !started {
            return Ok(Presence::NoPulse);
        }

        let pulse_start = self.clock.now();
        let mut long_enough = false;
        let ended = loop {
            let high = self.bus.sample()?;
            let width = self.clock.elapsed(pulse_start);
            if width >= t.presence_min_us {
                long_enough = true;
            }
            if high {
                break true;
            }
            if width >= t.presence_max_us {
                break false;
            }
        };

        let slot = t.presence_slot_us.saturating_sub(t.presence_start_us);
        let spent = self.clock.elapsed(window_start);
        self.delay.delay_us(slot.saturating_sub(spent));

        Ok(if long_enough && ended {
            Presence::Valid
        } else {
            Presence::InvalidPulse
        })
    }

    /// Busy-waits for `ms` milliseconds.
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

impl<BUS, CLK, D> BitIo for BitCodec<BUS, CLK, D>
where
    BUS: OneWireBus,
    CLK: Clock,
    D: DelayNs,
{
    type Error = BUS::Error;

    fn write_bit(&mut self, bit: bool) -> Result<(), BUS::Error> {
        let t = self.timing;
        let low = if bit { t.write_one_us } else { t.write_zero_us };

        self.bus.drive_low()?;
        self.delay.delay_us(low);
        self.bus.release()?;

        self.delay
            .delay_us(t.write_slot_us.saturating_sub(low).saturating_add(t.recovery_us));
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, BUS::Error> {
        let t = self.timing;

        self.bus.drive_low()?;
        self.delay.delay_us(t.read_pulse_us);
        self.bus.release()?;

        self.delay.delay_us(t.sample_delay_us);
        let bit = self.bus.sample()?;

        self.delay
            .delay_us(t.read_slot_us().saturating_add(t.recovery_us));
        Ok(bit)
    }
}
