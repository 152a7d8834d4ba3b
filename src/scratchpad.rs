//! Scratchpad and ROM code views.

use crate::params::Resolution;
use crate::registers::{
    crc8, ConfigRegister, ROM_LEN, SCRATCHPAD_LEN, SP_ALARM_HIGH, SP_ALARM_LOW, SP_CONFIG, SP_CRC,
    SP_TEMP_LSB, SP_TEMP_MSB,
};

/// The nine scratchpad bytes as read from the device.
///
/// The CRC byte is carried along but only checked on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scratchpad([u8; SCRATCHPAD_LEN]);

impl Scratchpad {
    /// Wraps raw scratchpad bytes.
    pub const fn from_bytes(bytes: [u8; SCRATCHPAD_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw scratchpad bytes.
    pub const fn as_bytes(&self) -> &[u8; SCRATCHPAD_LEN] {
        &self.0
    }

    /// Last conversion result in 1/16 °C.
    pub const fn temperature_raw(&self) -> i16 {
        i16::from_le_bytes([self.0[SP_TEMP_LSB], self.0[SP_TEMP_MSB]])
    }

    /// High alarm threshold (T<sub>H</sub>) in whole degrees.
    pub const fn alarm_high(&self) -> i8 {
        self.0[SP_ALARM_HIGH] as i8
    }

    /// Low alarm threshold (T<sub>L</sub>) in whole degrees.
    pub const fn alarm_low(&self) -> i8 {
        self.0[SP_ALARM_LOW] as i8
    }

    /// Raw configuration register byte.
    pub const fn config_byte(&self) -> u8 {
        self.0[SP_CONFIG]
    }

    /// Decoded configuration register.
    pub fn configuration(&self) -> ConfigRegister {
        ConfigRegister::from(self.0[SP_CONFIG])
    }

    /// Conversion resolution selected in the configuration register.
    pub fn resolution(&self) -> Resolution {
        self.configuration().resolution()
    }

    /// CRC byte reported by the device.
    pub const fn crc(&self) -> u8 {
        self.0[SP_CRC]
    }

    /// Whether the CRC byte matches the first eight bytes.
    pub fn checksum_valid(&self) -> bool {
        crc8(&self.0[..SP_CRC]) == self.0[SP_CRC]
    }
}

impl From<[u8; SCRATCHPAD_LEN]> for Scratchpad {
    fn from(bytes: [u8; SCRATCHPAD_LEN]) -> Self {
        Self(bytes)
    }
}

/// 64-bit ROM code: family code, 48-bit serial number, CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RomCode([u8; ROM_LEN]);

impl RomCode {
    /// Family code of the DS18B20.
    pub const DS18B20_FAMILY: u8 = 0x28;

    /// Wraps raw ROM bytes in bus order.
    pub const fn from_bytes(bytes: [u8; ROM_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw ROM bytes in bus order.
    pub const fn as_bytes(&self) -> &[u8; ROM_LEN] {
        &self.0
    }

    /// Device family code (first byte on the bus).
    pub const fn family(&self) -> u8 {
        self.0[0]
    }

    /// 48-bit serial number.
    pub fn serial(&self) -> u64 {
        self.0[1..ROM_LEN - 1]
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }

    /// Whether the last byte matches the CRC of the first seven.
    pub fn checksum_valid(&self) -> bool {
        crc8(&self.0[..ROM_LEN - 1]) == self.0[ROM_LEN - 1]
    }
}
