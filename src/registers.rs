//! Command set and memory map of the DS18B20.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use crate::params::Resolution;

/// ROM command: search all devices on the bus.
pub const CMD_SEARCH_ROM: u8 = 0xF0;
/// ROM command: read the 64-bit code of the only device on the bus.
pub const CMD_READ_ROM: u8 = 0x33;
/// ROM command: address one device by its 64-bit code.
pub const CMD_MATCH_ROM: u8 = 0x55;
/// ROM command: address every device on the bus.
pub const CMD_SKIP_ROM: u8 = 0xCC;
/// ROM command: search devices with an active alarm flag.
pub const CMD_ALARM_SEARCH: u8 = 0xEC;

/// Function command: start a temperature conversion.
pub const CMD_CONVERT_T: u8 = 0x44;
/// Function command: write T<sub>H</sub>, T<sub>L</sub> and configuration.
pub const CMD_WRITE_SCRATCHPAD: u8 = 0x4E;
/// Function command: read the nine scratchpad bytes.
pub const CMD_READ_SCRATCHPAD: u8 = 0xBE;
/// Function command: copy bytes 2–4 of the scratchpad to EEPROM.
pub const CMD_COPY_SCRATCHPAD: u8 = 0x48;
/// Function command: reload bytes 2–4 of the scratchpad from EEPROM.
pub const CMD_RECALL_EEPROM: u8 = 0xB8;
/// Function command: report parasite or external power.
pub const CMD_READ_POWER_SUPPLY: u8 = 0xB4;

/// Number of bytes in the scratchpad.
pub const SCRATCHPAD_LEN: usize = 9;
/// Number of bytes in the ROM code.
pub const ROM_LEN: usize = 8;

/// Scratchpad index of the temperature LSB.
pub const SP_TEMP_LSB: usize = 0;
/// Scratchpad index of the temperature MSB.
pub const SP_TEMP_MSB: usize = 1;
/// Scratchpad index of the high alarm threshold.
pub const SP_ALARM_HIGH: usize = 2;
/// Scratchpad index of the low alarm threshold.
pub const SP_ALARM_LOW: usize = 3;
/// Scratchpad index of the configuration register.
pub const SP_CONFIG: usize = 4;
/// Scratchpad index of the CRC byte.
pub const SP_CRC: usize = 8;

/// Fixed value of configuration bits 0–4.
pub const CONFIG_RESERVED_BITS: u8 = 0b0001_1111;

/// Sentinel returned when no temperature could be read.
pub const INVALID_TEMPERATURE: i16 = 0x7FFF;

/// Bitfield representation of the configuration register (scratchpad byte 4).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigRegister {
    // Reserved, reads back as ones (bits 0-4).
    pub reserved: B5,
    // Conversion resolution R0/R1 (bits 5-6).
    pub resolution: Resolution,
    #[skip]
    __: B1,
}

impl ConfigRegister {
    /// Builds the register value written by a resolution change.
    pub fn for_resolution(resolution: Resolution) -> Self {
        Self::new()
            .with_reserved(CONFIG_RESERVED_BITS)
            .with_resolution(resolution)
    }
}

impl From<u8> for ConfigRegister {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<ConfigRegister> for u8 {
    fn from(value: ConfigRegister) -> Self {
        value.into_bytes()[0]
    }
}

/// Computes the Dallas/Maxim CRC-8 (polynomial X^8 + X^5 + X^4 + 1).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}
