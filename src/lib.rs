//! # i2s-arbiter
//!
//! Exclusive ownership and lifecycle management for the I2S (serial audio)
//! units of a microcontroller, shared between competing users.
//!
//! The crate sits between callers (an application, a scripting binding) and
//! the vendor I2S driver. It does not move audio itself. It decides who owns
//! a unit and which pins it uses, and it makes sure every unit is always in a
//! consistent state:
//!
//! *   A fixed table of units, each behind its own lock. Calls on different
//!     units never wait for each other; calls on the same unit are strictly
//!     serialized.
//! *   Setup (`setup`) is idempotent but destructive: a configured unit is
//!     torn down completely before the new configuration is applied.
//! *   Pins are claimed in a process-wide pin lock registry shared with the
//!     other peripheral drivers (`PinLockRegistry`). A conflict names the
//!     current holder and never leaves a partial claim behind.
//! *   Failed setups unwind what they acquired: the event queue is freed, the
//!     driver uninstalled, pins released (or kept reserved, see
//!     `ArbiterConfig::pin_retention`).
//! *   Every other operation (`start`, `stop`, `write`, `read`, `push`,
//!     `pop`, `zero_buffer`, `set_rate`, `set_clock`, `next_event`) validates
//!     the unit before delegating to the driver.
//! *   Frame geometry (`Geometry`) is derived from bit depth and channel
//!     format; `push`/`pop` only accept whole frames.
//!
//! The vendor driver (`I2sDriver`) and the pin registry (`PinLockRegistry`)
//! are supplied by the embedder.
//!
//! ## Usage
//!
//! Add the following to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! i2s-arbiter = "0.1.0" # Replace with the latest version
//! log = "0.4"           # Optional, for logging
//!
//! [dev-dependencies]    # For the demo/tests
//! env_logger = "0.11"
//! ```
//!
//! ## Basic Usage
//!
//! ```no_run
//! use i2s_arbiter::{
//!     GpioPin, I2sArbiter, I2sConfig, I2sDriver, I2sPins, PinLockRegistry, Result, Timeout,
//! };
//!
//! fn play<D: I2sDriver, L: PinLockRegistry>(arbiter: &I2sArbiter<D, L>, pcm: &[u8]) -> Result<()> {
//!     let pins = I2sPins::tx(GpioPin::new(26)?, GpioPin::new(25)?, GpioPin::new(22)?);
//!
//!     // 16-bit stereo, 4 bytes per frame, 8-entry event queue
//!     arbiter.setup(0, &I2sConfig::master_tx(44_100), &pins, 8)?;
//!     assert_eq!(arbiter.pushpop_size(0), 4);
//!
//!     arbiter.start(0)?;
//!     let mut offset = 0;
//!     while offset < pcm.len() {
//!         offset += arbiter.write(0, &pcm[offset..], Timeout::Forever)?;
//!     }
//!     arbiter.stop(0)
//! }
//! ```
//!
//! See `demos/simulated_unit.rs` for a runnable program with a simulated
//! driver.
//!
//! ## Logging
//!
//! The crate logs through the `log` facade: one `info` line per successful
//! setup with the pin assignment, `debug` for lifecycle and control steps,
//! `trace` for transfers and pin locking, `warn` when a setup unwinds.
//!
//! ## License
//!
//! This project is licensed under the WTFPL.

mod config;
mod consts;
mod device;
mod driver;
mod error;
mod events;
pub mod gpio;
mod lifecycle;
mod lock;
mod transfer;

pub use config::{
    ArbiterConfig, BitsPerSample, ChannelFormat, Channels, CommFormat, DacMode, Geometry,
    I2sConfig, Mode, PinRetention,
};
pub use consts::{DEFAULT_EVENT_QUEUE_SIZE, GPIO_MAX, UNIT_COUNT};
pub use device::{I2sArbiter, UnitStatus};
pub use driver::{DriverFault, I2sDriver, Timeout};
pub use error::{Error, ErrorKind, Operation, Result};
pub use events::{EventQueue, EventSender, I2sEvent};
pub use gpio::{GpioPin, I2sPins};
pub use lock::{DriverKind, LockConflict, Owner, PinLockRegistry};
