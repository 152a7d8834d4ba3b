//! Error handling primitives for the DS18B20 driver.
//!
//! Protocol outcomes such as a missing presence pulse are reported as plain
//! values (`false`, `None` or the invalid-temperature sentinel). Only faults
//! raised by the pin implementation, invalid configurations and opt-in
//! checksum failures travel through [`Error`].

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// The provided timing or driver configuration is invalid.
    InvalidConfig,
    /// Scratchpad checksum did not match while verification was enabled.
    ChecksumMismatch,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}
