//! Interface to the vendor I2S peripheral driver.
//!
//! The vendor driver does the register programming, DMA and clocking. The
//! arbiter calls it only while holding the target unit's lock, so a driver
//! never sees two concurrent calls for the same unit. Calls for different
//! units may arrive concurrently.

use crate::config::{BitsPerSample, Channels, DacMode, I2sConfig};
use crate::events::EventSender;
use crate::gpio::I2sPins;
use std::time::Duration;
use thiserror::Error;

/// Failure code reported by a vendor primitive.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("vendor driver fault (code {0})")]
pub struct DriverFault(pub i32);

/// How long a transfer may block waiting for DMA space or data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Block until the transfer can proceed.
    Forever,
    /// Give up after the duration.
    After(Duration),
}

impl Timeout {
    /// Return immediately with whatever can be transferred.
    pub const NONE: Timeout = Timeout::After(Duration::ZERO);

    pub fn from_millis(ms: u64) -> Self {
        Timeout::After(Duration::from_millis(ms))
    }

    /// The bound as a duration, `None` meaning unbounded.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Timeout::Forever => None,
            Timeout::After(d) => Some(*d),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Timeout::After(d)
    }
}

/// Vendor driver primitives for I2S units.
///
/// Transfer methods return the number of bytes actually moved, which may be
/// less than requested when the timeout expires.
pub trait I2sDriver: Send + Sync {
    /// Installs the driver on `unit`. `events`, when present, is where the
    /// driver posts notifications until the unit releases its queue.
    fn install(
        &self,
        unit: u8,
        config: &I2sConfig,
        events: Option<EventSender>,
    ) -> Result<(), DriverFault>;

    fn uninstall(&self, unit: u8);

    /// Gates the unit's peripheral clock and power.
    fn disable_module(&self, unit: u8);

    fn set_pin(&self, unit: u8, pins: &I2sPins) -> Result<(), DriverFault>;

    fn start(&self, unit: u8) -> Result<(), DriverFault>;

    fn stop(&self, unit: u8) -> Result<(), DriverFault>;

    fn write_bytes(&self, unit: u8, data: &[u8], timeout: Timeout) -> Result<usize, DriverFault>;

    fn read_bytes(&self, unit: u8, buf: &mut [u8], timeout: Timeout)
        -> Result<usize, DriverFault>;

    /// Queues one whole frame.
    fn push_sample(&self, unit: u8, frame: &[u8], timeout: Timeout) -> Result<usize, DriverFault>;

    /// Dequeues one whole frame.
    fn pop_sample(&self, unit: u8, frame: &mut [u8], timeout: Timeout)
        -> Result<usize, DriverFault>;

    fn zero_dma_buffer(&self, unit: u8) -> Result<(), DriverFault>;

    fn set_sample_rate(&self, unit: u8, rate: u32) -> Result<(), DriverFault>;

    fn set_clk(
        &self,
        unit: u8,
        rate: u32,
        bits: BitsPerSample,
        channels: Channels,
    ) -> Result<(), DriverFault>;

    /// Routes the built-in DAC. Chip-wide.
    fn set_dac_mode(&self, mode: DacMode) -> Result<(), DriverFault>;
}
