//! Test doubles for the vendor driver and the pin lock registry.

#![allow(dead_code)]

use i2s_arbiter::{
    ArbiterConfig, BitsPerSample, Channels, DacMode, DriverFault, EventSender, GpioPin,
    I2sArbiter, I2sConfig, I2sDriver, I2sEvent, I2sPins, LockConflict, Owner, PinLockRegistry,
    Timeout, UNIT_COUNT,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

pub const FAULT: DriverFault = DriverFault(-1);

/// How long a gated transfer waits for its release signal.
pub const GATE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn pin(n: u8) -> GpioPin {
    GpioPin::new(n).expect("valid test pin")
}

/// bck=26 ws=25 dout=22 din=23
pub fn full_pins() -> I2sPins {
    I2sPins {
        bck: pin(26),
        ws: pin(25),
        data_out: Some(pin(22)),
        data_in: Some(pin(23)),
    }
}

/// bck=14 ws=15 dout=13, no data-in
pub fn tx_pins() -> I2sPins {
    I2sPins::tx(pin(14), pin(15), pin(13))
}

pub type TestArbiter = I2sArbiter<MockDriver, Arc<MockPinLocks>>;

pub fn arbiter() -> (TestArbiter, MockDriver, Arc<MockPinLocks>) {
    arbiter_with(ArbiterConfig::default())
}

pub fn arbiter_with(config: ArbiterConfig) -> (TestArbiter, MockDriver, Arc<MockPinLocks>) {
    init_logger();
    let driver = MockDriver::new();
    let locks = Arc::new(MockPinLocks::default());
    let arbiter = I2sArbiter::with_config(driver.clone(), locks.clone(), config);
    (arbiter, driver, locks)
}

/// An arbiter with unit 0 set up as a 16-bit stereo transmitter on
/// `full_pins()` with a 4-entry event queue.
pub fn configured_arbiter() -> (TestArbiter, MockDriver, Arc<MockPinLocks>) {
    let (arbiter, driver, locks) = arbiter();
    arbiter
        .setup(0, &I2sConfig::master_tx(44_100), &full_pins(), 4)
        .expect("setup of unit 0");
    driver.clear_calls();
    (arbiter, driver, locks)
}

// ---------------------------------------------------------------------------
// Mock vendor driver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Install {
        unit: u8,
        config: I2sConfig,
        with_queue: bool,
    },
    Uninstall(u8),
    DisableModule(u8),
    SetPin(u8, I2sPins),
    Start(u8),
    Stop(u8),
    Write(u8, usize),
    Read(u8, usize),
    Push(u8, usize),
    Pop(u8, usize),
    ZeroDmaBuffer(u8),
    SetSampleRate(u8, u32),
    SetClk {
        unit: u8,
        rate: u32,
        bits: BitsPerSample,
        channels: Channels,
    },
    SetDacMode(DacMode),
}

/// Vendor primitives that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Install,
    SetPin,
    Start,
    Stop,
    Write,
    Read,
    Push,
    Pop,
    ZeroDmaBuffer,
    SetSampleRate,
    SetClk,
    SetDacMode,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashSet<FailPoint>>,
    senders: Mutex<HashMap<u8, EventSender>>,
    read_limit: Mutex<Option<usize>>,
    transfer_delay: Mutex<Duration>,
    write_gate: Mutex<Option<(u8, mpsc::Receiver<()>)>>,
    in_flight: [AtomicUsize; UNIT_COUNT],
    max_in_flight: [AtomicUsize; UNIT_COUNT],
}

/// Recording vendor driver. Clones share state, so a test can keep a handle
/// after moving one into the arbiter.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, point: FailPoint) {
        self.state.failures.lock().unwrap().insert(point);
    }

    pub fn clear_failures(&self) {
        self.state.failures.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.state.calls.lock().unwrap().clear();
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|&c| matches(c)).count()
    }

    /// Every read returns at most `limit` bytes.
    pub fn set_read_limit(&self, limit: usize) {
        *self.state.read_limit.lock().unwrap() = Some(limit);
    }

    /// Every transfer takes at least `delay`.
    pub fn set_transfer_delay(&self, delay: Duration) {
        *self.state.transfer_delay.lock().unwrap() = delay;
    }

    /// The next write on `unit` blocks until the returned sender signals.
    pub fn gate_next_write(&self, unit: u8) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.state.write_gate.lock().unwrap() = Some((unit, rx));
        tx
    }

    pub fn in_flight(&self, unit: u8) -> usize {
        self.state.in_flight[usize::from(unit)].load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous transfers seen on `unit`.
    pub fn max_in_flight(&self, unit: u8) -> usize {
        self.state.max_in_flight[usize::from(unit)].load(Ordering::SeqCst)
    }

    /// Posts `event` the way the hardware interrupt would.
    pub fn post_event(&self, unit: u8, event: I2sEvent) -> bool {
        self.state
            .senders
            .lock()
            .unwrap()
            .get(&unit)
            .is_some_and(|sender| sender.post(event))
    }

    /// The event sender handed over at the last install of `unit`.
    pub fn sender(&self, unit: u8) -> Option<EventSender> {
        self.state.senders.lock().unwrap().get(&unit).cloned()
    }

    fn record(&self, call: Call) {
        self.state.calls.lock().unwrap().push(call);
    }

    fn check(&self, point: FailPoint) -> Result<(), DriverFault> {
        if self.state.failures.lock().unwrap().contains(&point) {
            Err(FAULT)
        } else {
            Ok(())
        }
    }

    /// Brackets a transfer so overlapping calls on one unit are observable.
    fn transfer<T>(&self, unit: u8, is_write: bool, body: impl FnOnce() -> T) -> T {
        let index = usize::from(unit);
        let now = self.state.in_flight[index].fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight[index].fetch_max(now, Ordering::SeqCst);

        if is_write {
            let gate = {
                let mut slot = self.state.write_gate.lock().unwrap();
                match slot.take() {
                    Some((gated, rx)) if gated == unit => Some(rx),
                    other => {
                        *slot = other;
                        None
                    }
                }
            };
            if let Some(rx) = gate {
                let _ = rx.recv_timeout(GATE_TIMEOUT);
            }
        }

        let delay = *self.state.transfer_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let result = body();
        self.state.in_flight[index].fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl I2sDriver for MockDriver {
    fn install(
        &self,
        unit: u8,
        config: &I2sConfig,
        events: Option<EventSender>,
    ) -> Result<(), DriverFault> {
        self.record(Call::Install {
            unit,
            config: *config,
            with_queue: events.is_some(),
        });
        self.check(FailPoint::Install)?;
        let mut senders = self.state.senders.lock().unwrap();
        match events {
            Some(sender) => senders.insert(unit, sender),
            None => senders.remove(&unit),
        };
        Ok(())
    }

    fn uninstall(&self, unit: u8) {
        self.record(Call::Uninstall(unit));
    }

    fn disable_module(&self, unit: u8) {
        self.record(Call::DisableModule(unit));
    }

    fn set_pin(&self, unit: u8, pins: &I2sPins) -> Result<(), DriverFault> {
        self.record(Call::SetPin(unit, *pins));
        self.check(FailPoint::SetPin)
    }

    fn start(&self, unit: u8) -> Result<(), DriverFault> {
        self.record(Call::Start(unit));
        self.check(FailPoint::Start)
    }

    fn stop(&self, unit: u8) -> Result<(), DriverFault> {
        self.record(Call::Stop(unit));
        self.check(FailPoint::Stop)
    }

    fn write_bytes(&self, unit: u8, data: &[u8], _timeout: Timeout) -> Result<usize, DriverFault> {
        self.record(Call::Write(unit, data.len()));
        self.transfer(unit, true, || {
            self.check(FailPoint::Write)?;
            Ok(data.len())
        })
    }

    fn read_bytes(
        &self,
        unit: u8,
        buf: &mut [u8],
        _timeout: Timeout,
    ) -> Result<usize, DriverFault> {
        self.record(Call::Read(unit, buf.len()));
        let limit = *self.state.read_limit.lock().unwrap();
        self.transfer(unit, false, || {
            self.check(FailPoint::Read)?;
            let n = limit.map_or(buf.len(), |limit| limit.min(buf.len()));
            buf[..n].fill(0xA5);
            Ok(n)
        })
    }

    fn push_sample(&self, unit: u8, frame: &[u8], _timeout: Timeout) -> Result<usize, DriverFault> {
        self.record(Call::Push(unit, frame.len()));
        self.transfer(unit, false, || {
            self.check(FailPoint::Push)?;
            Ok(frame.len())
        })
    }

    fn pop_sample(
        &self,
        unit: u8,
        frame: &mut [u8],
        _timeout: Timeout,
    ) -> Result<usize, DriverFault> {
        self.record(Call::Pop(unit, frame.len()));
        self.transfer(unit, false, || {
            self.check(FailPoint::Pop)?;
            frame.fill(0x5A);
            Ok(frame.len())
        })
    }

    fn zero_dma_buffer(&self, unit: u8) -> Result<(), DriverFault> {
        self.record(Call::ZeroDmaBuffer(unit));
        self.check(FailPoint::ZeroDmaBuffer)
    }

    fn set_sample_rate(&self, unit: u8, rate: u32) -> Result<(), DriverFault> {
        self.record(Call::SetSampleRate(unit, rate));
        self.check(FailPoint::SetSampleRate)
    }

    fn set_clk(
        &self,
        unit: u8,
        rate: u32,
        bits: BitsPerSample,
        channels: Channels,
    ) -> Result<(), DriverFault> {
        self.record(Call::SetClk {
            unit,
            rate,
            bits,
            channels,
        });
        self.check(FailPoint::SetClk)
    }

    fn set_dac_mode(&self, mode: DacMode) -> Result<(), DriverFault> {
        self.record(Call::SetDacMode(mode));
        self.check(FailPoint::SetDacMode)
    }
}

// ---------------------------------------------------------------------------
// Mock pin lock registry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MockPinLocks {
    held: Mutex<HashMap<GpioPin, Owner>>,
    lock_calls: AtomicUsize,
}

impl MockPinLocks {
    /// Marks `pin` as held by another driver.
    pub fn occupy(&self, pin: GpioPin, owner: Owner) {
        self.held.lock().unwrap().insert(pin, owner);
    }

    pub fn holder(&self, pin: GpioPin) -> Option<Owner> {
        self.held.lock().unwrap().get(&pin).copied()
    }

    /// Pins held by `owner`, sorted.
    pub fn held_by(&self, owner: Owner) -> Vec<GpioPin> {
        let mut pins: Vec<GpioPin> = self
            .held
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, o)| **o == owner)
            .map(|(p, _)| *p)
            .collect();
        pins.sort();
        pins
    }

    pub fn lock_calls(&self) -> usize {
        self.lock_calls.load(Ordering::SeqCst)
    }
}

impl PinLockRegistry for MockPinLocks {
    fn lock(&self, owner: Owner, pin: GpioPin) -> Result<(), LockConflict> {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);
        let mut held = self.held.lock().unwrap();
        match held.get(&pin) {
            Some(holder) if *holder != owner => Err(LockConflict {
                pin,
                holder: *holder,
            }),
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

/// Sorted pin list helper for comparisons.
pub fn sorted(pins: impl IntoIterator<Item = GpioPin>) -> Vec<GpioPin> {
    let mut pins: Vec<GpioPin> = pins.into_iter().collect();
    pins.sort();
    pins
}
