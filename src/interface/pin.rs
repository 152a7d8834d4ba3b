//! Open-drain GPIO interface built on top of `embedded-hal` digital pins.

use embedded_hal::digital::{InputPin, OutputPin};

use super::OneWireBus;

/// Single-pin bus implementation for the 1-Wire driver.
///
/// The pin must be configured as open-drain with an external pull-up so that
/// driving it high releases the line instead of sourcing current into it.
pub struct PinBus<P> {
    pin: P,
}

impl<P> PinBus<P> {
    /// Creates a new interface from the provided open-drain pin.
    pub const fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Provides mutable access to the wrapped pin.
    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// Consumes the interface and returns the owned pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> OneWireBus for PinBus<P>
where
    P: InputPin + OutputPin,
{
    type Error = P::Error;

    fn drive_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn release(&mut self) -> core::result::Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn sample(&mut self) -> core::result::Result<bool, Self::Error> {
        self.pin.is_high()
    }
}
