//! The unit state table: one lock-guarded slot per physical I2S unit.

use crate::config::{ArbiterConfig, Geometry, I2sConfig};
use crate::consts;
use crate::driver::I2sDriver;
use crate::error::{Error, Result};
use crate::events::EventQueue;
use crate::gpio::{GpioPin, I2sPins};
use crate::lock::PinLockRegistry;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// State recorded by a successful setup. Only exists while configured.
#[derive(Debug)]
pub(crate) struct Installed {
    pub(crate) config: I2sConfig,
    pub(crate) pins: I2sPins,
    pub(crate) geometry: Geometry,
    pub(crate) events: Option<EventQueue>,
}

#[derive(Debug, Default)]
pub(crate) struct UnitState {
    pub(crate) installed: Option<Installed>,
    /// Pins this unit holds in the registry. Matches `installed.pins` while
    /// configured; may be non-empty while unconfigured after a failed setup
    /// under `PinRetention::KeepReserved`.
    pub(crate) held_pins: Vec<GpioPin>,
}

#[derive(Debug, Default)]
pub(crate) struct UnitSlot {
    state: Mutex<UnitState>,
    /// Mirror of `state.installed.is_some()`, written only under `state`.
    configured: AtomicBool,
}

impl UnitSlot {
    /// Locks the unit. A panic inside an earlier critical section does not
    /// make the state unusable: fields are only written after vendor calls
    /// return.
    pub(crate) fn lock(&self) -> MutexGuard<'_, UnitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::Release);
    }

    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Acquire)
    }
}

/// Snapshot of a configured unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStatus {
    pub config: I2sConfig,
    pub pins: I2sPins,
    pub geometry: Geometry,
    /// Event queue capacity, 0 when setup disabled the queue.
    pub queue_size: usize,
}

/// Arbiter for the I2S units of one chip.
///
/// Create one instance at start-up and keep it for the lifetime of the
/// process (for example in a `static OnceLock`). Every operation on a unit
/// is serialized by that unit's own lock; operations on different units
/// never contend.
///
/// Dropping the arbiter tears down every configured unit.
#[derive(Debug)]
pub struct I2sArbiter<D: I2sDriver, L: PinLockRegistry> {
    pub(crate) driver: D,
    pub(crate) locks: L,
    pub(crate) config: ArbiterConfig,
    units: [UnitSlot; consts::UNIT_COUNT],
}

impl<D: I2sDriver, L: PinLockRegistry> I2sArbiter<D, L> {
    /// Creates an arbiter with default settings (all units present, pins
    /// kept reserved after a failed install).
    pub fn new(driver: D, locks: L) -> Self {
        Self::with_config(driver, locks, ArbiterConfig::default())
    }

    pub fn with_config(driver: D, locks: L, config: ArbiterConfig) -> Self {
        debug!(
            "Creating I2S arbiter: present units mask={:#04b}, pin retention={:?}",
            config.present_units, config.pin_retention
        );
        Self {
            driver,
            locks,
            config,
            units: Default::default(),
        }
    }

    /// The vendor driver this arbiter delegates to.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The pin lock registry this arbiter locks pins in.
    pub fn locks(&self) -> &L {
        &self.locks
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    // --- Unit table queries ---

    /// Whether `unit` names a physically present unit.
    pub fn exists(&self, unit: u8) -> bool {
        usize::from(unit) < consts::UNIT_COUNT && self.config.present_units & (1 << unit) != 0
    }

    /// Whether `unit` exists and is configured.
    ///
    /// This is a single read that does not wait for the unit's lock; the
    /// answer may be stale by the time the caller acts on it.
    pub fn is_configured(&self, unit: u8) -> bool {
        self.exists(unit) && self.units[usize::from(unit)].is_configured()
    }

    /// Bytes per push/pop frame, or 0 when the unit is not configured.
    pub fn pushpop_size(&self, unit: u8) -> usize {
        if !self.exists(unit) {
            return 0;
        }
        self.units[usize::from(unit)]
            .lock()
            .installed
            .as_ref()
            .map_or(0, |installed| installed.geometry.bytes_per_pushpop)
    }

    /// Configuration, pins, geometry and queue size of a configured unit.
    pub fn status(&self, unit: u8) -> Result<UnitStatus> {
        self.with_installed(unit, |installed| {
            Ok(UnitStatus {
                config: installed.config,
                pins: installed.pins,
                geometry: installed.geometry,
                queue_size: installed.events.as_ref().map_or(0, EventQueue::capacity),
            })
        })
    }

    // --- Internal access ---

    /// The slot for `unit`, or `InvalidUnit`.
    pub(crate) fn slot(&self, unit: u8) -> Result<&UnitSlot> {
        if !self.exists(unit) {
            return Err(Error::InvalidUnit { unit });
        }
        Ok(&self.units[usize::from(unit)])
    }

    /// Runs `f` on a configured unit under its lock.
    pub(crate) fn with_installed<T>(
        &self,
        unit: u8,
        f: impl FnOnce(&mut Installed) -> Result<T>,
    ) -> Result<T> {
        let slot = self.slot(unit)?;
        let mut state = slot.lock();
        match state.installed.as_mut() {
            Some(installed) => f(installed),
            None => Err(Error::NotSetup { unit }),
        }
    }
}

impl<D: I2sDriver, L: PinLockRegistry> Drop for I2sArbiter<D, L> {
    fn drop(&mut self) {
        for (index, slot) in self.units.iter().enumerate() {
            let mut state = slot.lock();
            // UNIT_COUNT fits in u8
            self.teardown_locked(index as u8, slot, &mut state);
        }
    }
}
