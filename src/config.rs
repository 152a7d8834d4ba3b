//! Configuration primitives for the 1-Wire driver.

/// Bus timing parameters, in microseconds unless the name says otherwise.
///
/// Defaults are taken from the DS18B20 datasheet. A bit value is carried by
/// the width of the low pulse: short means one, long means zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Length of the transmitted reset pulse.
    pub reset_pulse_us: u32,
    /// Quiet time after reset before a presence pulse may start.
    pub presence_start_us: u32,
    /// How long to wait for the presence pulse to begin.
    pub presence_wait_us: u32,
    /// Minimum width of a valid presence pulse.
    pub presence_min_us: u32,
    /// Maximum width of a valid presence pulse.
    pub presence_max_us: u32,
    /// Full presence receive slot, measured from the end of the reset pulse.
    pub presence_slot_us: u32,
    /// Low time when writing a zero.
    pub write_zero_us: u32,
    /// Low time when writing a one.
    pub write_one_us: u32,
    /// Total write slot length, excluding recovery.
    pub write_slot_us: u32,
    /// Low time that initiates a read slot.
    pub read_pulse_us: u32,
    /// Delay between releasing the line and sampling it in a read slot.
    pub sample_delay_us: u32,
    /// Total read slot length, excluding recovery.
    pub time_slot_us: u32,
    /// Recovery time between slots.
    pub recovery_us: u32,
    /// Wait after copying the scratchpad to EEPROM (milliseconds).
    pub copy_wait_ms: u32,
    /// Wait after recalling EEPROM into the scratchpad (milliseconds).
    pub recall_wait_ms: u32,
    /// Interval between busy-flag polls during a blocking conversion (milliseconds).
    pub conversion_poll_ms: u32,
    /// Maximum number of busy-flag polls during a blocking conversion.
    pub conversion_poll_limit: u32,
}

impl Timing {
    /// Datasheet-derived timing set.
    pub const fn datasheet() -> Self {
        Self {
            reset_pulse_us: 480,
            presence_start_us: 15,
            presence_wait_us: 60 - 15,
            presence_min_us: 60,
            presence_max_us: 240,
            presence_slot_us: 480,
            write_zero_us: 90,
            write_one_us: 2,
            write_slot_us: 90,
            read_pulse_us: 2,
            sample_delay_us: 8,
            time_slot_us: 60,
            recovery_us: 2,
            copy_wait_ms: 10,
            recall_wait_ms: 1,
            conversion_poll_ms: 10,
            conversion_poll_limit: 100,
        }
    }

    /// Remainder of the read slot after the sample point.
    pub const fn read_slot_us(&self) -> u32 {
        self.time_slot_us
            .saturating_sub(self.sample_delay_us)
            .saturating_sub(self.read_pulse_us)
    }

    /// Checks the ordering relationships the protocol depends on.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.reset_pulse_us <= self.presence_max_us {
            return Err(ConfigError::ResetTooShort);
        }

        if self.presence_max_us <= self.presence_min_us || self.presence_min_us == 0 {
            return Err(ConfigError::PresenceWindow);
        }

        let presence_end = self
            .presence_start_us
            .checked_add(self.presence_wait_us)
            .and_then(|us| us.checked_add(self.presence_max_us))
            .ok_or(ConfigError::PresenceWindow)?;
        if presence_end > self.presence_slot_us {
            return Err(ConfigError::PresenceWindow);
        }

        if self.write_zero_us <= self.sample_delay_us
            || self.sample_delay_us < self.write_one_us
            || self.write_one_us == 0
            || self.write_zero_us > self.write_slot_us
        {
            return Err(ConfigError::WriteTiming);
        }

        let sample_point = self
            .read_pulse_us
            .checked_add(self.sample_delay_us)
            .ok_or(ConfigError::ReadTiming)?;
        if self.read_pulse_us == 0 || sample_point >= self.time_slot_us {
            return Err(ConfigError::ReadTiming);
        }

        if self.conversion_poll_limit == 0 {
            return Err(ConfigError::PollLimit);
        }

        Ok(())
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::datasheet()
    }
}

/// User-facing configuration for the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Bus timing parameters.
    pub timing: Timing,
    /// Reject scratchpad reads whose CRC byte does not match.
    pub verify_checksum: bool,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks whether this configuration is usable.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        self.timing.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: Timing::datasheet(),
            verify_checksum: false,
        }
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Replaces the whole timing set.
    pub fn timing(mut self, timing: Timing) -> Self {
        self.config.timing = timing;
        self
    }

    /// Overrides the write-zero low time.
    pub fn write_zero_us(mut self, us: u32) -> Self {
        self.config.timing.write_zero_us = us;
        self
    }

    /// Overrides the write-one low time.
    pub fn write_one_us(mut self, us: u32) -> Self {
        self.config.timing.write_one_us = us;
        self
    }

    /// Overrides the read slot sample delay.
    pub fn sample_delay_us(mut self, us: u32) -> Self {
        self.config.timing.sample_delay_us = us;
        self
    }

    /// Overrides the blocking conversion poll ceiling.
    pub fn conversion_poll_limit(mut self, polls: u32) -> Self {
        self.config.timing.conversion_poll_limit = polls;
        self
    }

    /// Enables scratchpad CRC verification.
    pub fn verify_checksum(mut self, enabled: bool) -> Self {
        self.config.verify_checksum = enabled;
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation errors generated while verifying a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Reset pulse is not longer than the longest presence pulse.
    ResetTooShort,
    /// Presence pulse bounds are inverted or do not fit the receive slot.
    PresenceWindow,
    /// Write low times are inverted or exceed the write slot.
    WriteTiming,
    /// Read initiation and sample delay do not fit in the time slot.
    ReadTiming,
    /// Blocking conversion would never poll.
    PollLimit,
}
