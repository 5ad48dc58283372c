//! Unit configuration, derived frame geometry, and arbiter-wide settings.

use crate::consts;
use crate::error::{Error, Result};
use std::ops::BitOr;
use std::time::Duration;

/// Operating mode flags of an I2S unit. Combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode(u8);

impl Mode {
    pub const MASTER: Mode = Mode(1 << 0);
    pub const SLAVE: Mode = Mode(1 << 1);
    pub const TX: Mode = Mode(1 << 2);
    pub const RX: Mode = Mode(1 << 3);
    /// Route output to the chip's built-in DAC.
    pub const DAC_BUILT_IN: Mode = Mode(1 << 4);
    /// Sample from the chip's built-in ADC.
    pub const ADC_BUILT_IN: Mode = Mode(1 << 5);
    pub const PDM: Mode = Mode(1 << 6);

    /// Raw flag bits.
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Returns true if every flag in `other` is set.
    pub fn contains(&self, other: Mode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Mode {
    type Output = Mode;

    fn bitor(self, rhs: Mode) -> Mode {
        Mode(self.0 | rhs.0)
    }
}

/// Sample bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitsPerSample {
    Bits8,
    Bits16,
    Bits24,
    Bits32,
}

impl BitsPerSample {
    pub fn bits(&self) -> u8 {
        match self {
            BitsPerSample::Bits8 => 8,
            BitsPerSample::Bits16 => 16,
            BitsPerSample::Bits24 => 24,
            BitsPerSample::Bits32 => 32,
        }
    }

    /// Bytes one channel sample occupies in the DMA buffer: the bit depth
    /// rounded up to a whole number of 16-bit words.
    pub fn bytes_per_sample(&self) -> usize {
        (usize::from(self.bits()) + 15) / 16 * 2
    }
}

impl TryFrom<u8> for BitsPerSample {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self> {
        match bits {
            8 => Ok(BitsPerSample::Bits8),
            16 => Ok(BitsPerSample::Bits16),
            24 => Ok(BitsPerSample::Bits24),
            32 => Ok(BitsPerSample::Bits32),
            other => Err(Error::ArgumentOutOfRange(format!(
                "bits per sample must be 8, 16, 24 or 32 (got {})",
                other
            ))),
        }
    }
}

/// How left/right slots are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelFormat {
    /// Separate left and right channels.
    RightLeft,
    /// Right channel data in both slots.
    AllRight,
    /// Left channel data in both slots.
    AllLeft,
    /// Right channel only.
    OnlyRight,
    /// Left channel only.
    OnlyLeft,
}

impl ChannelFormat {
    /// Channels carried per frame.
    pub fn num_channels(&self) -> u8 {
        match self {
            ChannelFormat::RightLeft | ChannelFormat::AllRight | ChannelFormat::AllLeft => 2,
            ChannelFormat::OnlyRight | ChannelFormat::OnlyLeft => 1,
        }
    }

    /// This format if it already carries `channels`, otherwise `OnlyLeft`
    /// for mono or `RightLeft` for stereo.
    pub fn with_channels(self, channels: Channels) -> Self {
        if self.num_channels() == channels.count() {
            return self;
        }
        match channels {
            Channels::Mono => ChannelFormat::OnlyLeft,
            Channels::Stereo => ChannelFormat::RightLeft,
        }
    }
}

/// Channel count argument of a clock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    pub fn count(&self) -> u8 {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

impl TryFrom<u8> for Channels {
    type Error = Error;

    fn try_from(count: u8) -> Result<Self> {
        match count {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            other => Err(Error::ArgumentOutOfRange(format!(
                "channel count must be 1 or 2 (got {})",
                other
            ))),
        }
    }
}

/// Serial data framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommFormat {
    I2s,
    I2sMsb,
    I2sLsb,
    Pcm,
    PcmShort,
    PcmLong,
}

/// Built-in DAC routing. Applies to the whole chip, not to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DacMode {
    Disabled,
    RightEnabled,
    LeftEnabled,
    BothEnabled,
}

/// Configuration of one I2S unit, passed to setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2sConfig {
    pub mode: Mode,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    pub bits_per_sample: BitsPerSample,
    pub channel_format: ChannelFormat,
    pub communication_format: CommFormat,
    /// Number of DMA buffers.
    pub dma_buf_count: u16,
    /// Frames per DMA buffer.
    pub dma_buf_len: u16,
    /// Interrupt allocation flags, passed through to the driver untouched.
    pub intr_alloc_flags: u32,
}

impl Default for I2sConfig {
    fn default() -> Self {
        Self::master_tx(consts::DEFAULT_SAMPLE_RATE)
    }
}

impl I2sConfig {
    /// 16-bit stereo master transmitter.
    pub fn master_tx(sample_rate: u32) -> Self {
        I2sConfig {
            mode: Mode::MASTER | Mode::TX,
            sample_rate,
            bits_per_sample: BitsPerSample::Bits16,
            channel_format: ChannelFormat::RightLeft,
            communication_format: CommFormat::I2s,
            dma_buf_count: consts::DEFAULT_DMA_BUF_COUNT,
            dma_buf_len: consts::DEFAULT_DMA_BUF_LEN,
            intr_alloc_flags: 0,
        }
    }

    /// 16-bit stereo master receiver.
    pub fn master_rx(sample_rate: u32) -> Self {
        I2sConfig {
            mode: Mode::MASTER | Mode::RX,
            ..Self::master_tx(sample_rate)
        }
    }

    /// Master transmitter feeding the built-in DAC (MSB-justified, 16-bit).
    pub fn builtin_dac(sample_rate: u32) -> Self {
        I2sConfig {
            mode: Mode::MASTER | Mode::TX | Mode::DAC_BUILT_IN,
            communication_format: CommFormat::I2sMsb,
            ..Self::master_tx(sample_rate)
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_bits_per_sample(mut self, bits: BitsPerSample) -> Self {
        self.bits_per_sample = bits;
        self
    }

    pub fn with_channel_format(mut self, format: ChannelFormat) -> Self {
        self.channel_format = format;
        self
    }

    pub fn with_communication_format(mut self, format: CommFormat) -> Self {
        self.communication_format = format;
        self
    }

    pub fn with_dma_buffers(mut self, count: u16, len: u16) -> Self {
        self.dma_buf_count = count;
        self.dma_buf_len = len;
        self
    }

    pub fn with_intr_alloc_flags(mut self, flags: u32) -> Self {
        self.intr_alloc_flags = flags;
        self
    }

    /// Time the full DMA ring takes to drain at the configured sample rate.
    pub fn dma_latency(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = u64::from(self.dma_buf_count) * u64::from(self.dma_buf_len);
        Duration::from_nanos(frames * 1_000_000_000 / u64::from(self.sample_rate))
    }
}

/// Frame geometry derived from the bit depth and channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub num_channels: u8,
    pub bytes_per_sample: usize,
    /// Bytes in one multi-channel frame; the exact push/pop size.
    pub bytes_per_pushpop: usize,
}

impl Geometry {
    pub fn new(bits: BitsPerSample, num_channels: u8) -> Self {
        let bytes_per_sample = bits.bytes_per_sample();
        Self {
            num_channels,
            bytes_per_sample,
            bytes_per_pushpop: bytes_per_sample * usize::from(num_channels),
        }
    }

    pub fn for_config(config: &I2sConfig) -> Self {
        Self::new(config.bits_per_sample, config.channel_format.num_channels())
    }

    /// The channel count as a clock-change argument.
    pub fn channels(&self) -> Channels {
        if self.num_channels == 1 {
            Channels::Mono
        } else {
            Channels::Stereo
        }
    }
}

/// What happens to pins locked during a setup whose vendor install or pin
/// assignment then fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinRetention {
    /// Pins stay held by the unit until its next setup or teardown releases
    /// them, so a retry finds them still reserved.
    #[default]
    KeepReserved,
    /// Pins are released before the error is returned.
    Release,
}

/// Arbiter-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbiterConfig {
    /// Bit `n` set means unit `n` physically exists.
    pub present_units: u8,
    pub pin_retention: PinRetention,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        ArbiterConfig {
            present_units: consts::PRESENT_UNITS_ALL,
            pin_retention: PinRetention::default(),
        }
    }
}

impl ArbiterConfig {
    /// Settings for a chip with a single unit (I2S0 only).
    pub fn single_unit() -> Self {
        ArbiterConfig {
            present_units: 0b0000_0001,
            ..Default::default()
        }
    }

    /// Default settings, but pins are released on install or pin-assignment
    /// failure.
    pub fn releasing() -> Self {
        ArbiterConfig {
            pin_retention: PinRetention::Release,
            ..Default::default()
        }
    }
}
