//! Bus interface abstraction for the 1-Wire driver.

pub mod pin;

/// Abstraction over one open-drain data line.
///
/// The line is wired-AND: it reads high only while neither the driver nor the
/// remote device pulls it low. Implementations must not be shared between
/// execution contexts while a transaction is in flight.
pub trait OneWireBus {
    /// Error type produced by the concrete line implementation.
    type Error;

    /// Actively pulls the line low.
    fn drive_low(&mut self) -> core::result::Result<(), Self::Error>;

    /// Stops driving the line and lets the external pull-up float it high.
    fn release(&mut self) -> core::result::Result<(), Self::Error>;

    /// Samples the observed line level; `true` means high.
    fn sample(&mut self) -> core::result::Result<bool, Self::Error>;
}

impl<B: OneWireBus + ?Sized> OneWireBus for &mut B {
    type Error = B::Error;

    fn drive_low(&mut self) -> core::result::Result<(), Self::Error> {
        (**self).drive_low()
    }

    fn release(&mut self) -> core::result::Result<(), Self::Error> {
        (**self).release()
    }

    fn sample(&mut self) -> core::result::Result<bool, Self::Error> {
        (**self).sample()
    }
}
