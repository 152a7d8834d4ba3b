//! Byte framing over the bit codec.
//!
//! Bytes travel least-significant bit first. There are no start or stop
//! markers; byte boundaries exist only because both ends count to eight.

use crate::error::Result;

/// Bit-level transport, with byte framing layered on top.
pub trait BitIo {
    /// Error type produced by the underlying line.
    type Error;

    /// Transmits one bit in its own time slot.
    fn write_bit(&mut self, bit: bool) -> Result<(), Self::Error>;

    /// Receives one bit from its own time slot.
    fn read_bit(&mut self) -> Result<bool, Self::Error>;

    /// Transmits eight bits, least-significant first.
    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        for i in 0..8 {
            self.write_bit((value >> i) & 1 != 0)?;
        }
        Ok(())
    }

    /// Receives eight bits, least-significant first.
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut value = 0;
        for i in 0..8 {
            if self.read_bit()? {
                value |= 1 << i;
            }
        }
        Ok(value)
    }

    /// Transmits every byte of `data` in order.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Fills `buf` with received bytes.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        for byte in buf.iter_mut() {
            *byte = self.read_byte()?;
        }
        Ok(())
    }
}
