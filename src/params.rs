//! Strongly typed parameter enumerations for the DS18B20 driver.
//!
//! These enums map directly to datasheet field encodings and are used by the
//! [`ConfigRegister`](crate::registers::ConfigRegister) bitfield and the
//! high-level driver APIs.
//!
//! # Examples
//!
//! ```rust
//! use ds18b20_onewire::params::Resolution;
//!
//! let res = Resolution::Bits11;
//! assert_eq!(res.bits(), 11);
//! assert_eq!(res.conversion_time_ms(), 375);
//! ```

use modular_bitfield::prelude::Specifier;

/// Thermometer resolution encoded in configuration register bits 5–6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum Resolution {
    /// 9-bit conversion, 0.5 °C steps.
    Bits9 = 0b00,
    /// 10-bit conversion, 0.25 °C steps.
    Bits10 = 0b01,
    /// 11-bit conversion, 0.125 °C steps.
    Bits11 = 0b10,
    /// 12-bit conversion, 0.0625 °C steps. Power-on default.
    Bits12 = 0b11,
}

impl Resolution {
    /// Number of significant temperature bits.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bits9 => 9,
            Self::Bits10 => 10,
            Self::Bits11 => 11,
            Self::Bits12 => 12,
        }
    }

    /// Worst-case conversion time from the datasheet, in milliseconds.
    pub const fn conversion_time_ms(self) -> u32 {
        match self {
            Self::Bits9 => 94,
            Self::Bits10 => 188,
            Self::Bits11 => 375,
            Self::Bits12 => 750,
        }
    }

    /// Raw two-bit field value.
    pub const fn field(self) -> u8 {
        self as u8
    }

    /// Decodes the two-bit field value, ignoring any higher bits.
    pub const fn from_field(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::Bits9,
            0b01 => Self::Bits10,
            0b10 => Self::Bits11,
            _ => Self::Bits12,
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::Bits12
    }
}

/// Whether the conversion command waits for the busy flag to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Blocking {
    /// Return as soon as the command is issued.
    No,
    /// Poll the busy flag until done or the poll ceiling is reached.
    Yes,
}

impl From<bool> for Blocking {
    fn from(block: bool) -> Self {
        if block { Self::Yes } else { Self::No }
    }
}

/// Power source reported by the read-power-supply command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSupply {
    /// The device draws power from the data line.
    Parasite,
    /// The device has its own supply pin connected.
    External,
}
