//! High-level DS18B20 device driver implementation.

use crate::clock::Clock;
use crate::codec::Presence;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::interface::pin::PinBus;
use crate::interface::OneWireBus;
use crate::params::{Blocking, PowerSupply, Resolution};
use crate::registers::{ConfigRegister, INVALID_TEMPERATURE};
use crate::scratchpad::{RomCode, Scratchpad};
use crate::transaction::TransactionEngine;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Temperature in the device's native 1/16 °C fixed-point format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(i16);

impl Temperature {
    /// Wraps a raw scratchpad reading.
    pub const fn from_raw(raw: i16) -> Self {
        Self(raw)
    }

    /// Raw reading in 1/16 °C.
    pub const fn raw(self) -> i16 {
        self.0
    }

    /// Temperature in thousandths of a degree, truncated toward zero.
    pub const fn millicelsius(self) -> i32 {
        self.0 as i32 * 625 / 10
    }

    /// Temperature in degrees Celsius.
    pub fn celsius(self) -> f32 {
        f32::from(self.0) / 16.0
    }
}

/// High-level synchronous driver for a single DS18B20 on a 1-Wire bus.
///
/// The driver owns the bus for its whole lifetime; wrap it in a mutex if it
/// must be reached from more than one execution context. No operation
/// retries on its own.
pub struct Ds18b20<BUS, CLK, D> {
    engine: TransactionEngine<BUS, CLK, D>,
}

impl<BUS, CLK, D> Ds18b20<BUS, CLK, D> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a driver around an existing transaction engine.
    pub fn from_engine(engine: TransactionEngine<BUS, CLK, D>) -> Self {
        Self { engine }
    }

    /// Consumes the driver and returns the owned capabilities.
    pub fn release(self) -> (BUS, CLK, D, Config) {
        self.engine.release()
    }

    /// Provides mutable access to the transaction engine.
    pub fn engine_mut(&mut self) -> &mut TransactionEngine<BUS, CLK, D> {
        &mut self.engine
    }

    /// Returns a shared reference to the active configuration.
    pub fn config(&self) -> &Config {
        self.engine.config()
    }
}

impl<P, CLK, D> Ds18b20<PinBus<P>, CLK, D>
where
    P: InputPin + OutputPin,
    CLK: Clock,
    D: DelayNs,
{
    // ==================================================================
    // == GPIO Convenience Constructors =================================
    // ==================================================================
    /// Convenience constructor for an open-drain GPIO pin.
    pub fn new_pin(pin: P, clock: CLK, delay: D, config: Config) -> Result<Self, P::Error> {
        Self::new(PinBus::new(pin), clock, delay, config)
    }

    /// Releases the driver, returning the pin, clock and delay provider.
    pub fn release_pin(self) -> (P, CLK, D) {
        let (bus, clock, delay, _) = self.release();
        (bus.into_inner(), clock, delay)
    }
}

impl<BUS, CLK, D, CommE> Ds18b20<BUS, CLK, D>
where
    BUS: OneWireBus<Error = CommE>,
    CLK: Clock,
    D: DelayNs,
{
    /// Creates a driver after validating the configuration.
    pub fn new(bus: BUS, clock: CLK, delay: D, config: Config) -> Result<Self, CommE> {
        TransactionEngine::new(bus, clock, delay, config).map(Self::from_engine)
    }

    /// Applies a new configuration.
    pub fn set_config(&mut self, config: Config) -> Result<(), CommE> {
        self.engine.set_config(config)
    }

    // ==================================================================
    // == Identification & Status =======================================
    // ==================================================================
    /// Resets the bus and reports how the device answered.
    pub fn presence(&mut self) -> Result<Presence, CommE> {
        self.engine.presence()
    }

    /// Reads the 64-bit ROM code of the only device on the bus.
    pub fn rom_code(&mut self) -> Result<Option<RomCode>, CommE> {
        self.engine.read_rom()
    }

    /// Reports whether the device is parasite or externally powered.
    pub fn power_supply(&mut self) -> Result<Option<PowerSupply>, CommE> {
        self.engine.read_power_supply()
    }

    /// Reads the full scratchpad.
    pub fn scratchpad(&mut self) -> Result<Option<Scratchpad>, CommE> {
        self.engine.read_scratchpad()
    }

    // ==================================================================
    // == Temperature ===================================================
    // ==================================================================
    /// Starts a temperature conversion, optionally waiting for it to finish.
    pub fn start_conversion(&mut self, blocking: impl Into<Blocking>) -> Result<bool, CommE> {
        self.engine.start_conversion(blocking)
    }

    /// Returns the most recent conversion result.
    ///
    /// Yields `None` when no device answered the reset.
    pub fn read_temperature(&mut self) -> Result<Option<Temperature>, CommE> {
        Ok(self
            .engine
            .read_scratchpad()?
            .map(|sp| Temperature::from_raw(sp.temperature_raw())))
    }

    /// Returns the most recent conversion result in 1/16 °C, or
    /// [`INVALID_TEMPERATURE`] if it could not be read.
    ///
    /// A checksum mismatch, when verification is enabled, also yields the
    /// sentinel.
    pub fn get_temperature(&mut self) -> Result<i16, CommE> {
        match self.read_temperature() {
            Ok(Some(temperature)) => Ok(temperature.raw()),
            Ok(None) | Err(Error::ChecksumMismatch) => Ok(INVALID_TEMPERATURE),
            Err(err) => Err(err),
        }
    }

    /// Runs a blocking conversion and reads the result.
    ///
    /// Yields `None` if the device is missing or the conversion did not
    /// finish within the poll ceiling.
    pub fn measure(&mut self) -> Result<Option<Temperature>, CommE> {
        if !self.engine.start_conversion(Blocking::Yes)? {
            return Ok(None);
        }
        self.read_temperature()
    }

    // ==================================================================
    // == Configuration =================================================
    // ==================================================================
    /// Reads the resolution currently selected in the scratchpad.
    pub fn resolution(&mut self) -> Result<Option<Resolution>, CommE> {
        Ok(self.engine.read_scratchpad()?.map(|sp| sp.resolution()))
    }

    /// Changes the conversion resolution, keeping the alarm thresholds.
    ///
    /// This reads the scratchpad and writes it back in two separate
    /// transactions; it is not atomic. The change is volatile until
    /// [`save_config`](Self::save_config) is called.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<bool, CommE> {
        let Some(current) = self.engine.read_scratchpad()? else {
            return Ok(false);
        };

        let config = ConfigRegister::for_resolution(resolution);
        self.engine.write_scratchpad(
            current.alarm_high() as u8,
            current.alarm_low() as u8,
            u8::from(config),
        )
    }

    /// Changes the alarm thresholds, keeping the configuration byte.
    pub fn set_alarms(&mut self, high: i8, low: i8) -> Result<bool, CommE> {
        let Some(current) = self.engine.read_scratchpad()? else {
            return Ok(false);
        };

        self.engine
            .write_scratchpad(high as u8, low as u8, current.config_byte())
    }

    /// Persists T<sub>H</sub>, T<sub>L</sub> and configuration to EEPROM.
    pub fn save_config(&mut self) -> Result<bool, CommE> {
        self.engine.copy_scratchpad()
    }

    /// Reloads T<sub>H</sub>, T<sub>L</sub> and configuration from EEPROM.
    pub fn load_saved_config(&mut self) -> Result<bool, CommE> {
        self.engine.recall_eeprom()
    }
}
