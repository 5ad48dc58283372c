//! Internal constants: unit table size, GPIO range, defaults.

/// Number of I2S unit slots in the state table.
pub const UNIT_COUNT: usize = 2;

/// Bitmask of units physically present on the default chip (I2S0 and I2S1).
pub const PRESENT_UNITS_ALL: u8 = 0b0000_0011;

/// Highest GPIO number the chip exposes.
pub const GPIO_MAX: u8 = 39;

/// Suggested event queue depth for setup.
pub const DEFAULT_EVENT_QUEUE_SIZE: usize = 8;

// I2sConfig defaults
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_DMA_BUF_COUNT: u16 = 8;
pub const DEFAULT_DMA_BUF_LEN: u16 = 64;

/// Numeric error codes handed to a binding layer.
/// The first three match the codes the driver has always registered.
pub mod error_code {
    pub const NOT_SETUP: u8 = 0;
    pub const INVALID_UNIT: u8 = 1;
    pub const NOT_ENOUGH_MEMORY: u8 = 2;
    pub const DRIVER_INSTALL: u8 = 3;
    pub const DRIVER_SET_PIN: u8 = 4;
    pub const DRIVER_ERROR: u8 = 5;
    pub const BAD_SAMPLE_LENGTH: u8 = 6;
    pub const PIN_LOCKED: u8 = 7;
    pub const INVALID_ARGUMENT: u8 = 8;
}
