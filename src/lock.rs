//! Interface to the process-wide pin lock registry.
//!
//! The registry is shared by every peripheral driver in the process, not just
//! I2S. This crate only consumes it: the embedder supplies an implementation
//! of [`PinLockRegistry`].

use crate::gpio::GpioPin;
use std::fmt;
use thiserror::Error;

/// Peripheral driver families that can own pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Adc,
    Can,
    Dac,
    Gpio,
    I2c,
    I2s,
    Pwm,
    Spi,
    Uart,
}

impl DriverKind {
    fn name(&self) -> &'static str {
        match self {
            DriverKind::Adc => "adc",
            DriverKind::Can => "can",
            DriverKind::Dac => "dac",
            DriverKind::Gpio => "gpio",
            DriverKind::I2c => "i2c",
            DriverKind::I2s => "i2s",
            DriverKind::Pwm => "pwm",
            DriverKind::Spi => "spi",
            DriverKind::Uart => "uart",
        }
    }
}

/// A driver unit holding (or requesting) a pin, e.g. `i2s0` or `spi2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner {
    pub driver: DriverKind,
    pub unit: u8,
}

impl Owner {
    pub fn new(driver: DriverKind, unit: u8) -> Self {
        Self { driver, unit }
    }

    /// The owner identity used for I2S unit `unit`.
    pub fn i2s(unit: u8) -> Self {
        Self::new(DriverKind::I2s, unit)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.driver.name(), self.unit)
    }
}

/// A pin is already held by another owner.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{pin} is used by {holder}")]
pub struct LockConflict {
    /// The contested pin.
    pub pin: GpioPin,
    /// The owner currently holding it.
    pub holder: Owner,
}

/// Cross-driver pin arbiter.
///
/// Implementations must accept a `lock` from the owner that already holds the
/// pin, and must treat `unlock` of a pin the owner does not hold as a no-op.
/// Acquisition is one pin at a time; there is no atomic multi-pin lock.
pub trait PinLockRegistry: Send + Sync {
    /// Claims `pin` for `owner`, or reports who holds it.
    fn lock(&self, owner: Owner, pin: GpioPin) -> Result<(), LockConflict>;

    /// Releases `pin` if held by `owner`.
    fn unlock(&self, owner: Owner, pin: GpioPin);
}

impl<T: PinLockRegistry + ?Sized> PinLockRegistry for &T {
    fn lock(&self, owner: Owner, pin: GpioPin) -> Result<(), LockConflict> {
        (**self).lock(owner, pin)
    }

    fn unlock(&self, owner: Owner, pin: GpioPin) {
        (**self).unlock(owner, pin)
    }
}

impl<T: PinLockRegistry + ?Sized> PinLockRegistry for std::sync::Arc<T> {
    fn lock(&self, owner: Owner, pin: GpioPin) -> Result<(), LockConflict> {
        (**self).lock(owner, pin)
    }

    fn unlock(&self, owner: Owner, pin: GpioPin) {
        (**self).unlock(owner, pin)
    }
}
