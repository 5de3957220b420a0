//! Hand-written hardware doubles for driver tests

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation};
use embedded_hal::pwm::{self, SetDutyCycle};
use heapless::Vec;

use graphis_core::traits::Clock;

/// Output pin remembering its level
pub struct MockPin {
    pub is_high: Option<bool>,
    pub rising_edges: u32,
}

impl MockPin {
    pub fn new() -> Self {
        Self {
            is_high: None,
            rising_edges: 0,
        }
    }
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.is_high = Some(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.is_high != Some(true) {
            self.rising_edges += 1;
        }
        self.is_high = Some(true);
        Ok(())
    }
}

/// Input pin with a settable level
pub struct MockInput {
    pub high: bool,
    pub fail: bool,
}

impl MockInput {
    pub fn new(high: bool) -> Self {
        Self { high, fail: false }
    }
}

impl digital::ErrorType for MockInput {
    type Error = digital::ErrorKind;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.fail {
            return Err(digital::ErrorKind::Other);
        }
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Delay that returns immediately
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Manually advanced clock
#[derive(Default)]
pub struct MockClock {
    now: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, micros: u64) {
        self.now.set(self.now.get() + micros);
    }
}

impl Clock for MockClock {
    fn now_micros(&self) -> u64 {
        self.now.get()
    }
}

/// I2C bus backed by a 256-byte register file
///
/// Writes of two or more bytes are recorded and stored at the register
/// named by their first byte (auto-incrementing). A single-byte write only
/// sets the read pointer.
pub struct MockI2c {
    pub registers: [u8; 256],
    pub writes: Vec<(u8, Vec<u8, 8>), 32>,
    pub fail: bool,
    pointer: u8,
}

impl MockI2c {
    pub fn new() -> Self {
        Self {
            registers: [0; 256],
            writes: Vec::new(),
            fail: false,
            pointer: 0,
        }
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = i2c::ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(i2c::ErrorKind::Bus);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let Some((&register, data)) = bytes.split_first() else {
                        continue;
                    };
                    self.pointer = register;
                    if data.is_empty() {
                        continue;
                    }
                    for (offset, value) in data.iter().enumerate() {
                        self.registers[register.wrapping_add(offset as u8) as usize] = *value;
                    }
                    let mut frame = Vec::new();
                    frame.extend_from_slice(bytes).unwrap();
                    self.writes.push((address, frame)).unwrap();
                }
                Operation::Read(buf) => {
                    for (offset, slot) in buf.iter_mut().enumerate() {
                        *slot = self.registers[self.pointer.wrapping_add(offset as u8) as usize];
                    }
                }
            }
        }
        Ok(())
    }
}

/// PWM channel remembering its duty
pub struct MockPwm {
    pub max: u16,
    pub duty: u16,
    pub fail: bool,
}

impl MockPwm {
    pub fn new(max: u16) -> Self {
        Self {
            max,
            duty: 0,
            fail: false,
        }
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.fail {
            return Err(pwm::ErrorKind::Other);
        }
        self.duty = duty;
        Ok(())
    }
}

/// UART with in-memory receive and transmit buffers
pub struct MockUart {
    pub rx: Vec<u8, 64>,
    pub tx: Vec<u8, 128>,
    pub fail: bool,
    pub flushes: u32,
}

impl MockUart {
    pub fn new() -> Self {
        Self {
            rx: Vec::new(),
            tx: Vec::new(),
            fail: false,
            flushes: 0,
        }
    }
}

impl embedded_io::ErrorType for MockUart {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::ReadReady for MockUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl embedded_io::Read for MockUart {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(embedded_io::ErrorKind::Other);
        }
        let n = self.rx.len().min(buf.len());
        buf[..n].copy_from_slice(&self.rx[..n]);
        let len = self.rx.len();
        self.rx.copy_within(n..len, 0);
        self.rx.truncate(len - n);
        Ok(n)
    }
}

impl embedded_io::Write for MockUart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(embedded_io::ErrorKind::Other);
        }
        self.tx
            .extend_from_slice(buf)
            .map_err(|_| embedded_io::ErrorKind::OutOfMemory)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}
