#![no_std]

mod error;

pub mod clock;
pub mod codec;
pub mod config;
pub mod device;
pub mod framer;
pub mod interface;
mod log;
pub mod params;
pub mod registers;
pub mod scratchpad;
pub mod transaction;

#[cfg(test)]
mod sim;

pub use crate::device::Ds18b20;
pub use crate::error::{Error, Result};
