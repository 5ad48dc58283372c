//! Unit setup and teardown.

use crate::config::{Geometry, I2sConfig, PinRetention};
use crate::device::{I2sArbiter, Installed, UnitSlot, UnitState};
use crate::driver::I2sDriver;
use crate::error::{Error, Result};
use crate::events::EventQueue;
use crate::gpio::I2sPins;
use crate::lock::{Owner, PinLockRegistry};
use log::{debug, info, trace, warn};

impl<D: I2sDriver, L: PinLockRegistry> I2sArbiter<D, L> {
    /// Configures `unit`, replacing any previous configuration.
    ///
    /// A configured unit is fully torn down first (driver uninstalled, module
    /// disabled, event queue freed, pins released), so a second setup never
    /// merges with the first. `queue_size` is the event queue capacity; 0
    /// disables the queue.
    ///
    /// Pins are locked in the order bit-clock, word-select, data-out, data-in.
    /// If one is held by another driver, every pin locked by this call is
    /// released again and [`Error::PinLocked`] names the holder. If the vendor
    /// install or pin assignment fails, the pins are kept or released
    /// according to [`ArbiterConfig::pin_retention`](crate::ArbiterConfig).
    /// On any error the unit is left unconfigured.
    pub fn setup(
        &self,
        unit: u8,
        config: &I2sConfig,
        pins: &I2sPins,
        queue_size: usize,
    ) -> Result<()> {
        let slot = self.slot(unit)?;
        let mut state = slot.lock();

        self.teardown_locked(unit, slot, &mut state);

        let events = if queue_size > 0 {
            let queue =
                EventQueue::with_capacity(queue_size).map_err(|source| Error::NotEnoughMemory {
                    unit,
                    requested: queue_size,
                    source,
                })?;
            Some(queue)
        } else {
            None
        };

        self.lock_pins(unit, pins, &mut state)?;

        if let Err(source) = self
            .driver
            .install(unit, config, events.as_ref().map(EventQueue::sender))
        {
            warn!("i2s{}: driver install failed: {}", unit, source);
            self.after_failed_install(unit, &mut state);
            return Err(Error::DriverInstall { unit, source });
        }

        if let Err(source) = self.driver.set_pin(unit, pins) {
            warn!("i2s{}: pin assignment failed: {}", unit, source);
            self.driver.uninstall(unit);
            self.after_failed_install(unit, &mut state);
            return Err(Error::DriverSetPin { unit, source });
        }

        state.installed = Some(Installed {
            config: *config,
            pins: *pins,
            geometry: Geometry::for_config(config),
            events,
        });
        slot.set_configured(true);
        drop(state);

        info!("i2s{} at pins {}", unit, pins);
        Ok(())
    }

    /// Tears down a configured unit: uninstalls the driver, disables the
    /// module, frees the event queue and releases the unit's pins.
    ///
    /// Also releases pins still reserved by an earlier failed setup. Returns
    /// [`Error::NotSetup`] only when the unit had nothing to tear down.
    pub fn teardown(&self, unit: u8) -> Result<()> {
        let slot = self.slot(unit)?;
        let mut state = slot.lock();
        if state.installed.is_none() && state.held_pins.is_empty() {
            return Err(Error::NotSetup { unit });
        }
        self.teardown_locked(unit, slot, &mut state);
        Ok(())
    }

    /// Returns the unit to the unconfigured state with no pins held.
    /// Caller holds the unit lock.
    pub(crate) fn teardown_locked(&self, unit: u8, slot: &UnitSlot, state: &mut UnitState) {
        if let Some(installed) = state.installed.take() {
            slot.set_configured(false);
            self.driver.uninstall(unit);
            self.driver.disable_module(unit);
            debug!(
                "i2s{}: torn down (was {} Hz, {} bits, {} channel(s))",
                unit,
                installed.config.sample_rate,
                installed.config.bits_per_sample.bits(),
                installed.geometry.num_channels
            );
        }
        if !state.held_pins.is_empty() {
            self.release_pins(unit, state);
        }
    }

    /// Locks every required pin, all or nothing.
    fn lock_pins(&self, unit: u8, pins: &I2sPins, state: &mut UnitState) -> Result<()> {
        let owner = Owner::i2s(unit);
        for pin in pins.required() {
            match self.locks.lock(owner, pin) {
                Ok(()) => {
                    trace!("i2s{}: locked {}", unit, pin);
                    if !state.held_pins.contains(&pin) {
                        state.held_pins.push(pin);
                    }
                }
                Err(conflict) => {
                    warn!("i2s{}: {}", unit, conflict);
                    self.release_pins(unit, state);
                    return Err(Error::PinLocked {
                        unit,
                        source: conflict,
                    });
                }
            }
        }
        Ok(())
    }

    fn release_pins(&self, unit: u8, state: &mut UnitState) {
        let owner = Owner::i2s(unit);
        for pin in state.held_pins.drain(..) {
            self.locks.unlock(owner, pin);
            trace!("i2s{}: released {}", unit, pin);
        }
    }

    fn after_failed_install(&self, unit: u8, state: &mut UnitState) {
        match self.config.pin_retention {
            PinRetention::KeepReserved => {
                debug!(
                    "i2s{}: keeping {} pin(s) reserved after failed setup",
                    unit,
                    state.held_pins.len()
                );
            }
            PinRetention::Release => self.release_pins(unit, state),
        }
    }
}
