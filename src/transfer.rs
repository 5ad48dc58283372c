//! Operations on configured units: control, data transfer, clocking.
//!
//! Each call checks the unit exists, takes the unit's lock, checks the unit
//! is configured, then delegates to the vendor driver. Blocking transfers
//! wait for their timeout with the lock held, so a long transfer stalls
//! other calls on the same unit but never calls on other units.

use crate::config::{BitsPerSample, Channels, DacMode, Geometry};
use crate::device::{I2sArbiter, Installed};
use crate::driver::{I2sDriver, Timeout};
use crate::error::{driver_error, Error, Operation, Result};
use crate::events::I2sEvent;
use crate::lock::PinLockRegistry;
use log::{debug, trace};

impl<D: I2sDriver, L: PinLockRegistry> I2sArbiter<D, L> {
    // --- Control ---

    pub fn start(&self, unit: u8) -> Result<()> {
        self.with_installed(unit, |_| {
            debug!("i2s{}: start", unit);
            self.driver
                .start(unit)
                .map_err(driver_error(unit, Operation::Start))
        })
    }

    pub fn stop(&self, unit: u8) -> Result<()> {
        self.with_installed(unit, |_| {
            debug!("i2s{}: stop", unit);
            self.driver
                .stop(unit)
                .map_err(driver_error(unit, Operation::Stop))
        })
    }

    /// Clears the unit's DMA buffers.
    pub fn zero_buffer(&self, unit: u8) -> Result<()> {
        self.with_installed(unit, |_| {
            debug!("i2s{}: zero DMA buffer", unit);
            self.driver
                .zero_dma_buffer(unit)
                .map_err(driver_error(unit, Operation::ZeroBuffer))
        })
    }

    // --- Data transfer ---

    /// Writes raw bytes, returning how many the driver accepted before
    /// `timeout` expired.
    pub fn write(&self, unit: u8, data: &[u8], timeout: Timeout) -> Result<usize> {
        self.with_installed(unit, |_| {
            let written = self
                .driver
                .write_bytes(unit, data, timeout)
                .map_err(driver_error(unit, Operation::Write))?;
            trace!("i2s{}: wrote {}/{} bytes", unit, written, data.len());
            Ok(written)
        })
    }

    /// Reads up to `size` bytes. The returned buffer holds only the bytes
    /// actually read; a short read is not an error. A buffer that cannot be
    /// allocated is reported as [`Error::NotEnoughMemory`].
    pub fn read(&self, unit: u8, size: usize, timeout: Timeout) -> Result<Vec<u8>> {
        self.with_installed(unit, |_| {
            let mut data: Vec<u8> = Vec::new();
            data.try_reserve_exact(size)
                .map_err(|source| Error::NotEnoughMemory {
                    unit,
                    requested: size,
                    source,
                })?;
            data.resize(size, 0u8);
            let read = self
                .driver
                .read_bytes(unit, &mut data, timeout)
                .map_err(driver_error(unit, Operation::Read))?;
            data.truncate(read);
            trace!("i2s{}: read {}/{} bytes", unit, data.len(), size);
            Ok(data)
        })
    }

    /// Queues one whole frame. `frame` must be exactly
    /// [`pushpop_size`](Self::pushpop_size) bytes.
    pub fn push(&self, unit: u8, frame: &[u8], timeout: Timeout) -> Result<usize> {
        self.with_installed(unit, |installed| {
            check_frame(unit, installed, frame.len())?;
            self.driver
                .push_sample(unit, frame, timeout)
                .map_err(driver_error(unit, Operation::Push))
        })
    }

    /// Dequeues one whole frame into `frame`, which must be exactly
    /// [`pushpop_size`](Self::pushpop_size) bytes.
    pub fn pop(&self, unit: u8, frame: &mut [u8], timeout: Timeout) -> Result<usize> {
        self.with_installed(unit, |installed| {
            check_frame(unit, installed, frame.len())?;
            self.driver
                .pop_sample(unit, frame, timeout)
                .map_err(driver_error(unit, Operation::Pop))
        })
    }

    /// Takes the oldest pending driver notification, without blocking.
    /// Always `None` when setup disabled the event queue.
    pub fn next_event(&self, unit: u8) -> Result<Option<I2sEvent>> {
        self.with_installed(unit, |installed| {
            Ok(installed.events.as_ref().and_then(|queue| queue.try_recv()))
        })
    }

    // --- Clocking ---

    /// Changes the sample rate. Frame geometry is unaffected.
    pub fn set_rate(&self, unit: u8, rate: u32) -> Result<()> {
        self.with_installed(unit, |installed| {
            debug!("i2s{}: set rate {} Hz", unit, rate);
            self.driver
                .set_sample_rate(unit, rate)
                .map_err(driver_error(unit, Operation::SetRate))?;
            installed.config.sample_rate = rate;
            Ok(())
        })
    }

    /// Changes rate, bit depth and channel count together.
    ///
    /// A channel count that no longer matches the configured channel format
    /// switches it to `OnlyLeft` (mono) or `RightLeft` (stereo).
    ///
    /// The stored bit depth and frame geometry are updated before the vendor
    /// clock call and are kept even if that call fails, so
    /// [`pushpop_size`](Self::pushpop_size) always reflects the last
    /// requested clocking.
    pub fn set_clock(
        &self,
        unit: u8,
        rate: u32,
        bits: BitsPerSample,
        channels: Channels,
    ) -> Result<()> {
        self.with_installed(unit, |installed| {
            installed.config.bits_per_sample = bits;
            installed.config.channel_format =
                installed.config.channel_format.with_channels(channels);
            installed.geometry = Geometry::new(bits, channels.count());
            let geometry = installed.geometry;
            debug!(
                "i2s{}: set clock {} Hz, {} bits, {} channel(s), {} bytes/frame",
                unit,
                rate,
                bits.bits(),
                geometry.num_channels,
                geometry.bytes_per_pushpop
            );
            self.driver
                .set_clk(unit, rate, bits, geometry.channels())
                .map_err(driver_error(unit, Operation::SetClock))?;
            installed.config.sample_rate = rate;
            Ok(())
        })
    }

    /// Routes the built-in DAC. Applies to the whole chip, so no unit lock is
    /// taken.
    pub fn set_dac_mode(&self, mode: DacMode) -> Result<()> {
        debug!("Setting DAC mode {:?}", mode);
        self.driver
            .set_dac_mode(mode)
            .map_err(|source| Error::DacMode { source })
    }
}

fn check_frame(unit: u8, installed: &Installed, actual: usize) -> Result<()> {
    let expected = installed.geometry.bytes_per_pushpop;
    if actual != expected {
        return Err(Error::BadSampleLength {
            unit,
            expected,
            actual,
        });
    }
    Ok(())
}
