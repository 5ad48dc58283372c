//! Drives both I2S units through a simulated vendor driver.
//!
//! Run with `RUST_LOG=debug cargo run --example simulated_unit` to see the
//! arbiter's lifecycle logging.

use i2s_arbiter::{
    BitsPerSample, Channels, DacMode, DriverFault, DriverKind, EventSender, GpioPin, I2sArbiter,
    I2sConfig, I2sDriver, I2sEvent, I2sPins, LockConflict, Owner, PinLockRegistry, Result,
    Timeout, DEFAULT_EVENT_QUEUE_SIZE,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Accepts every call and reports a TxDone event per write.
#[derive(Default)]
struct SimulatedDriver {
    senders: Mutex<HashMap<u8, EventSender>>,
}

impl I2sDriver for SimulatedDriver {
    fn install(
        &self,
        unit: u8,
        config: &I2sConfig,
        events: Option<EventSender>,
    ) -> std::result::Result<(), DriverFault> {
        println!("  [driver] install i2s{} at {} Hz", unit, config.sample_rate);
        let mut senders = self.senders.lock().unwrap();
        match events {
            Some(sender) => senders.insert(unit, sender),
            None => senders.remove(&unit),
        };
        Ok(())
    }

    fn uninstall(&self, unit: u8) {
        println!("  [driver] uninstall i2s{}", unit);
        self.senders.lock().unwrap().remove(&unit);
    }

    fn disable_module(&self, _unit: u8) {}

    fn set_pin(&self, _unit: u8, _pins: &I2sPins) -> std::result::Result<(), DriverFault> {
        Ok(())
    }

    fn start(&self, _unit: u8) -> std::result::Result<(), DriverFault> {
        Ok(())
    }

    fn stop(&self, _unit: u8) -> std::result::Result<(), DriverFault> {
        Ok(())
    }

    fn write_bytes(
        &self,
        unit: u8,
        data: &[u8],
        _timeout: Timeout,
    ) -> std::result::Result<usize, DriverFault> {
        if let Some(sender) = self.senders.lock().unwrap().get(&unit) {
            sender.post(I2sEvent::TxDone);
        }
        Ok(data.len())
    }

    fn read_bytes(
        &self,
        _unit: u8,
        buf: &mut [u8],
        _timeout: Timeout,
    ) -> std::result::Result<usize, DriverFault> {
        // Half-full DMA buffer: a short read.
        let n = buf.len() / 2;
        buf[..n].fill(0);
        Ok(n)
    }

    fn push_sample(
        &self,
        _unit: u8,
        frame: &[u8],
        _timeout: Timeout,
    ) -> std::result::Result<usize, DriverFault> {
        Ok(frame.len())
    }

    fn pop_sample(
        &self,
        _unit: u8,
        frame: &mut [u8],
        _timeout: Timeout,
    ) -> std::result::Result<usize, DriverFault> {
        frame.fill(0);
        Ok(frame.len())
    }

    fn zero_dma_buffer(&self, _unit: u8) -> std::result::Result<(), DriverFault> {
        Ok(())
    }

    fn set_sample_rate(&self, _unit: u8, _rate: u32) -> std::result::Result<(), DriverFault> {
        Ok(())
    }

    fn set_clk(
        &self,
        _unit: u8,
        _rate: u32,
        _bits: BitsPerSample,
        _channels: Channels,
    ) -> std::result::Result<(), DriverFault> {
        Ok(())
    }

    fn set_dac_mode(&self, _mode: DacMode) -> std::result::Result<(), DriverFault> {
        Ok(())
    }
}

/// Process-wide pin table shared with the other (here imaginary) drivers.
#[derive(Default)]
struct PinTable {
    held: Mutex<HashMap<GpioPin, Owner>>,
}

impl PinLockRegistry for PinTable {
    fn lock(&self, owner: Owner, pin: GpioPin) -> std::result::Result<(), LockConflict> {
        let mut held = self.held.lock().unwrap();
        match held.get(&pin) {
            Some(&holder) if holder != owner => Err(LockConflict { pin, holder }),
            _ => {
                held.insert(pin, owner);
                Ok(())
            }
        }
    }

    fn unlock(&self, owner: Owner, pin: GpioPin) {
        let mut held = self.held.lock().unwrap();
        if held.get(&pin) == Some(&owner) {
            held.remove(&pin);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let pin_table = PinTable::default();
    // An SPI bus already owns GPIO18.
    pin_table.lock(Owner::new(DriverKind::Spi, 2), GpioPin::new(18)?).ok();

    let arbiter = I2sArbiter::new(SimulatedDriver::default(), &pin_table);

    println!("Setting up i2s0 as a 16-bit stereo transmitter...");
    let speaker = I2sPins::tx(GpioPin::new(26)?, GpioPin::new(25)?, GpioPin::new(22)?);
    arbiter.setup(
        0,
        &I2sConfig::master_tx(44_100),
        &speaker,
        DEFAULT_EVENT_QUEUE_SIZE,
    )?;
    println!("Frame size: {} bytes", arbiter.pushpop_size(0));

    arbiter.start(0)?;
    let written = arbiter.write(0, &[0u8; 256], Timeout::from_millis(100))?;
    println!("Wrote {} bytes", written);
    arbiter.push(0, &[0u8; 4], Timeout::Forever)?;
    while let Some(event) = arbiter.next_event(0)? {
        println!("Event: {:?}", event);
    }

    println!("Trying i2s1 on a pin owned by spi2...");
    let mic = I2sPins::rx(GpioPin::new(14)?, GpioPin::new(18)?, GpioPin::new(32)?);
    match arbiter.setup(1, &I2sConfig::master_rx(16_000), &mic, 0) {
        Ok(()) => println!("Unexpected success"),
        Err(e) => println!("Setup refused as expected: {} ({})", e, source_of(&e)),
    }

    let mic = I2sPins::rx(GpioPin::new(14)?, GpioPin::new(15)?, GpioPin::new(32)?);
    arbiter.setup(1, &I2sConfig::master_rx(16_000), &mic, 0)?;
    arbiter.set_clock(1, 16_000, BitsPerSample::Bits32, Channels::Mono)?;
    let captured = arbiter.read(1, 64, Timeout::from_millis(10))?;
    println!(
        "Read {} of 64 bytes, frame size now {} bytes",
        captured.len(),
        arbiter.pushpop_size(1)
    );

    // Invalid unit
    if let Err(e) = arbiter.start(2) {
        println!("Error code {}: {}", e.kind().code(), e);
    }

    arbiter.stop(0)?;
    arbiter.teardown(0)?;
    println!("i2s0 configured after teardown: {}", arbiter.is_configured(0));
    Ok(())
}

fn source_of(err: &dyn std::error::Error) -> String {
    err.source()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no detail".to_string())
}
