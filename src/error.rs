use crate::consts::error_code;
use crate::driver::DriverFault;
use crate::lock::LockConflict;
use std::collections::TryReserveError;
use std::fmt;
use thiserror::Error;

/// Errors returned by the arbiter.
///
/// Every unit-level variant names the unit so the caller can tell which
/// peripheral failed. Nothing is retried internally.
#[derive(Error, Debug)]
pub enum Error {
    /// The unit index does not name a physically present unit.
    #[error("i2s{unit}: invalid unit")]
    InvalidUnit {
        /// The requested unit index.
        unit: u8,
    },
    /// The operation needs a configured unit.
    #[error("i2s{unit}: is not setup")]
    NotSetup {
        /// The unit that is not configured.
        unit: u8,
    },
    /// The event queue could not be allocated.
    #[error("i2s{unit}: not enough memory for an event queue of {requested} entries")]
    NotEnoughMemory {
        /// The unit being set up.
        unit: u8,
        /// Requested queue size.
        requested: usize,
        #[source]
        source: TryReserveError,
    },
    /// The vendor driver refused to install.
    #[error("i2s{unit}: driver install failed")]
    DriverInstall {
        /// The unit being set up.
        unit: u8,
        #[source]
        source: DriverFault,
    },
    /// The vendor driver refused the pin assignment.
    #[error("i2s{unit}: driver pin assignment failed")]
    DriverSetPin {
        /// The unit being set up.
        unit: u8,
        #[source]
        source: DriverFault,
    },
    /// A vendor primitive failed after setup.
    #[error("i2s{unit}: driver error during {operation}")]
    DriverError {
        /// The unit the operation targeted.
        unit: u8,
        /// The failing operation.
        operation: Operation,
        #[source]
        source: DriverFault,
    },
    /// The chip-wide DAC routing could not be changed.
    #[error("DAC mode change failed")]
    DacMode {
        #[source]
        source: DriverFault,
    },
    /// A push or pop frame did not match the unit's frame size.
    #[error("i2s{unit}: sample frame must be {expected} bytes (got {actual})")]
    BadSampleLength {
        /// The unit the operation targeted.
        unit: u8,
        /// Bytes per frame for the current configuration.
        expected: usize,
        /// Bytes supplied by the caller.
        actual: usize,
    },
    /// A required pin is held by another driver.
    #[error("i2s{unit}: pin locked")]
    PinLocked {
        /// The unit being set up.
        unit: u8,
        #[source]
        source: LockConflict,
    },
    /// GPIO pin number is outside the valid range for this chip.
    #[error("GPIO pin {pin} argument out of range: {message}")]
    PinArgumentOutOfRange {
        /// The invalid pin number that was specified.
        pin: u8,
        /// Detailed error message explaining the constraint.
        message: String,
    },
    /// Function argument is outside the valid range.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
}

/// Result type alias for arbiter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Vendor primitives that can fail after setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Stop,
    Write,
    Read,
    Push,
    Pop,
    ZeroBuffer,
    SetRate,
    SetClock,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Write => "write",
            Operation::Read => "read",
            Operation::Push => "push",
            Operation::Pop => "pop",
            Operation::ZeroBuffer => "zero buffer",
            Operation::SetRate => "set rate",
            Operation::SetClock => "set clock",
        };
        f.write_str(name)
    }
}

/// Flat error classification for callers that map errors to codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotSetup,
    InvalidUnit,
    NotEnoughMemory,
    DriverInstall,
    DriverSetPin,
    DriverError,
    BadSampleLength,
    PinLocked,
    InvalidArgument,
}

impl ErrorKind {
    /// Stable numeric code.
    pub fn code(&self) -> u8 {
        match self {
            ErrorKind::NotSetup => error_code::NOT_SETUP,
            ErrorKind::InvalidUnit => error_code::INVALID_UNIT,
            ErrorKind::NotEnoughMemory => error_code::NOT_ENOUGH_MEMORY,
            ErrorKind::DriverInstall => error_code::DRIVER_INSTALL,
            ErrorKind::DriverSetPin => error_code::DRIVER_SET_PIN,
            ErrorKind::DriverError => error_code::DRIVER_ERROR,
            ErrorKind::BadSampleLength => error_code::BAD_SAMPLE_LENGTH,
            ErrorKind::PinLocked => error_code::PIN_LOCKED,
            ErrorKind::InvalidArgument => error_code::INVALID_ARGUMENT,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidUnit { .. } => ErrorKind::InvalidUnit,
            Error::NotSetup { .. } => ErrorKind::NotSetup,
            Error::NotEnoughMemory { .. } => ErrorKind::NotEnoughMemory,
            Error::DriverInstall { .. } => ErrorKind::DriverInstall,
            Error::DriverSetPin { .. } => ErrorKind::DriverSetPin,
            Error::DriverError { .. } | Error::DacMode { .. } => ErrorKind::DriverError,
            Error::BadSampleLength { .. } => ErrorKind::BadSampleLength,
            Error::PinLocked { .. } => ErrorKind::PinLocked,
            Error::PinArgumentOutOfRange { .. } | Error::ArgumentOutOfRange(_) => {
                ErrorKind::InvalidArgument
            }
        }
    }

    /// The unit the error concerns, if it is unit-level.
    pub fn unit(&self) -> Option<u8> {
        match self {
            Error::InvalidUnit { unit }
            | Error::NotSetup { unit }
            | Error::NotEnoughMemory { unit, .. }
            | Error::DriverInstall { unit, .. }
            | Error::DriverSetPin { unit, .. }
            | Error::DriverError { unit, .. }
            | Error::BadSampleLength { unit, .. }
            | Error::PinLocked { unit, .. } => Some(*unit),
            Error::DacMode { .. }
            | Error::PinArgumentOutOfRange { .. }
            | Error::ArgumentOutOfRange(_) => None,
        }
    }
}

// Helpers for the errors raised from several places
pub(crate) fn driver_error(unit: u8, operation: Operation) -> impl FnOnce(DriverFault) -> Error {
    move |source| Error::DriverError {
        unit,
        operation,
        source,
    }
}
