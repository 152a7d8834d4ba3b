//! Command transactions built from reset, addressing and payload exchange.
//!
//! Every transaction starts with a reset. If no valid presence pulse follows,
//! the transaction stops without touching the line again and reports `false`
//! (or `None`). Otherwise the broadcast skip-ROM command addresses the single
//! device on the bus and the function command and payload follow.

use embedded_hal::delay::DelayNs;

use crate::clock::Clock;
use crate::codec::{BitCodec, Presence};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::framer::BitIo;
use crate::interface::OneWireBus;
use crate::log::{debug, trace, warning};
use crate::params::{Blocking, PowerSupply};
use crate::registers::{
    CMD_CONVERT_T, CMD_COPY_SCRATCHPAD, CMD_READ_POWER_SUPPLY, CMD_READ_ROM, CMD_READ_SCRATCHPAD,
    CMD_RECALL_EEPROM, CMD_SKIP_ROM, CMD_WRITE_SCRATCHPAD, ROM_LEN, SCRATCHPAD_LEN,
};
use crate::scratchpad::{RomCode, Scratchpad};

/// Runs complete bus transactions against a single device.
pub struct TransactionEngine<BUS, CLK, D> {
    codec: BitCodec<BUS, CLK, D>,
    config: Config,
}

impl<BUS, CLK, D> TransactionEngine<BUS, CLK, D> {
    /// Returns a shared reference to the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Provides mutable access to the bit codec for raw bus work.
    pub fn codec_mut(&mut self) -> &mut BitCodec<BUS, CLK, D> {
        &mut self.codec
    }

    /// Consumes the engine and returns its capabilities and configuration.
    pub fn release(self) -> (BUS, CLK, D, Config) {
        let (bus, clock, delay) = self.codec.release();
        (bus, clock, delay, self.config)
    }
}

impl<BUS, CLK, D, CommE> TransactionEngine<BUS, CLK, D>
where
    BUS: OneWireBus<Error = CommE>,
    CLK: Clock,
    D: DelayNs,
{
    /// Creates an engine after validating the configuration.
    pub fn new(bus: BUS, clock: CLK, delay: D, config: Config) -> Result<Self, CommE> {
        config.validate().map_err(|_| Error::InvalidConfig)?;

        Ok(Self {
            codec: BitCodec::new(bus, clock, delay, config.timing),
            config,
        })
    }

    /// Applies a new configuration.
    pub fn set_config(&mut self, config: Config) -> Result<(), CommE> {
        config.validate().map_err(|_| Error::InvalidConfig)?;

        self.codec.set_timing(config.timing);
        self.config = config;
        Ok(())
    }

    /// Issues a bare reset and reports the detailed presence outcome.
    pub fn presence(&mut self) -> Result<Presence, CommE> {
        self.codec.reset()
    }

    fn begin(&mut self, rom_command: u8) -> Result<bool, CommE> {
        let presence = self.codec.reset()?;
        if !presence.is_valid() {
            debug!("no device answered reset: {}", presence);
            return Ok(false);
        }

        trace!("rom command {=u8:#x}", rom_command);
        self.codec.write_byte(rom_command)?;
        Ok(true)
    }

    fn begin_function(&mut self, command: u8) -> Result<bool, CommE> {
        if !self.begin(CMD_SKIP_ROM)? {
            return Ok(false);
        }

        trace!("function command {=u8:#x}", command);
        self.codec.write_byte(command)?;
        Ok(true)
    }

    /// Reads all nine scratchpad bytes.
    ///
    /// The CRC byte is only checked when `verify_checksum` is enabled.
    pub fn read_scratchpad(&mut self) -> Result<Option<Scratchpad>, CommE> {
        if !self.begin_function(CMD_READ_SCRATCHPAD)? {
            return Ok(None);
        }

        let mut bytes = [0u8; SCRATCHPAD_LEN];
        self.codec.read_bytes(&mut bytes)?;
        let scratchpad = Scratchpad::from(bytes);

        if self.config.verify_checksum && !scratchpad.checksum_valid() {
            warning!("scratchpad crc mismatch: {=u8:#x}", scratchpad.crc());
            return Err(Error::ChecksumMismatch);
        }

        Ok(Some(scratchpad))
    }

    /// Writes T<sub>H</sub>, T<sub>L</sub> and the configuration byte.
    ///
    /// The values live in volatile scratchpad memory until
    /// [`copy_scratchpad`](Self::copy_scratchpad) is issued.
    pub fn write_scratchpad(
        &mut self,
        alarm_high: u8,
        alarm_low: u8,
        config: u8,
    ) -> Result<bool, CommE> {
        if !self.begin_function(CMD_WRITE_SCRATCHPAD)? {
            return Ok(false);
        }

        self.codec.write_bytes(&[alarm_high, alarm_low, config])?;
        Ok(true)
    }

    /// Copies bytes 2–4 of the scratchpad to EEPROM and waits for the write.
    pub fn copy_scratchpad(&mut self) -> Result<bool, CommE> {
        if !self.begin_function(CMD_COPY_SCRATCHPAD)? {
            return Ok(false);
        }

        self.codec.delay_ms(self.config.timing.copy_wait_ms);
        Ok(true)
    }

    /// Reloads bytes 2–4 of the scratchpad from EEPROM.
    pub fn recall_eeprom(&mut self) -> Result<bool, CommE> {
        if !self.begin_function(CMD_RECALL_EEPROM)? {
            return Ok(false);
        }

        self.codec.delay_ms(self.config.timing.recall_wait_ms);
        Ok(true)
    }

    /// Starts a temperature conversion.
    ///
    /// Non-blocking calls return `true` once the command is out; the result
    /// may not be ready yet. Blocking calls poll the busy flag (a read slot
    /// answered with zero while converting) at a fixed interval and return
    /// `false` if it is still busy after the poll ceiling.
    pub fn start_conversion(&mut self, blocking: impl Into<Blocking>) -> Result<bool, CommE> {
        if !self.begin_function(CMD_CONVERT_T)? {
            return Ok(false);
        }

        let blocking: Blocking = blocking.into();
        if blocking == Blocking::No {
            return Ok(true);
        }

        let timing = self.config.timing;
        for _ in 0..timing.conversion_poll_limit {
            self.codec.delay_ms(timing.conversion_poll_ms);
            if self.codec.read_bit()? {
                return Ok(true);
            }
        }

        warning!(
            "conversion still busy after {=u32} polls",
            timing.conversion_poll_limit
        );
        Ok(false)
    }

    /// Asks the device how it is powered.
    pub fn read_power_supply(&mut self) -> Result<Option<PowerSupply>, CommE> {
        if !self.begin_function(CMD_READ_POWER_SUPPLY)? {
            return Ok(None);
        }

        Ok(Some(if self.codec.read_bit()? {
            PowerSupply::External
        } else {
            PowerSupply::Parasite
        }))
    }

    /// Reads the 64-bit ROM code. Only meaningful with a single device on the bus.
    pub fn read_rom(&mut self) -> Result<Option<RomCode>, CommE> {
        if !self.begin(CMD_READ_ROM)? {
            return Ok(None);
        }

        let mut bytes = [0u8; ROM_LEN];
        self.codec.read_bytes(&mut bytes)?;
        Ok(Some(RomCode::from_bytes(bytes)))
    }
}
