//! Test doubles for the collaborator traits

use core::cell::Cell;

use heapless::{String, Vec};

use crate::traits::{ByteStream, Clock, ServoDriver, StepperDriver, StepperStatus};

/// Steppers that move one step per service call
pub struct MockSteppers<const N: usize> {
    pub positions: [i32; N],
    pub targets: [i32; N],
    pub service_calls: [u32; N],
}

impl<const N: usize> MockSteppers<N> {
    pub fn new() -> Self {
        Self {
            positions: [0; N],
            targets: [0; N],
            service_calls: [0; N],
        }
    }
}

impl<const N: usize> StepperStatus for MockSteppers<N> {
    fn count(&self) -> usize {
        N
    }

    fn distance_to_go(&self, index: usize) -> i32 {
        self.targets[index] - self.positions[index]
    }
}

impl<const N: usize> StepperDriver for MockSteppers<N> {
    fn set_target(&mut self, index: usize, position: i32) {
        self.targets[index] = position;
    }

    fn service_once(&mut self, index: usize) -> bool {
        self.service_calls[index] += 1;
        let remaining = self.distance_to_go(index);
        self.positions[index] += remaining.signum();
        remaining != 0
    }
}

/// Servo bank recording every write
pub struct MockServos<const N: usize> {
    pub writes: Vec<(usize, u16), 32>,
}

impl<const N: usize> MockServos<N> {
    pub fn new() -> Self {
        Self { writes: Vec::new() }
    }

    pub fn last(&self, index: usize) -> Option<u16> {
        self.writes
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|(_, us)| *us)
    }
}

impl<const N: usize> ServoDriver for MockServos<N> {
    fn count(&self) -> usize {
        N
    }

    fn write_microseconds(&mut self, index: usize, micros: u16) {
        self.writes.push((index, micros)).unwrap();
    }
}

/// Byte stream fed by the test between polls
pub struct MockStream {
    incoming: Vec<u8, 512>,
    pub replies: Vec<String<64>, 32>,
}

impl MockStream {
    pub fn new() -> Self {
        Self {
            incoming: Vec::new(),
            replies: Vec::new(),
        }
    }

    /// Make bytes available to the next read
    pub fn feed(&mut self, bytes: &[u8]) {
        self.incoming.extend_from_slice(bytes).unwrap();
    }

    pub fn replies(&self) -> impl Iterator<Item = &str> {
        self.replies.iter().map(|r| r.as_str())
    }
}

impl ByteStream for MockStream {
    fn available(&mut self) -> bool {
        !self.incoming.is_empty()
    }

    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let n = self.incoming.len().min(buf.len());
        buf[..n].copy_from_slice(&self.incoming[..n]);
        let len = self.incoming.len();
        self.incoming.copy_within(n..len, 0);
        self.incoming.truncate(len - n);
        n
    }

    fn write_line(&mut self, line: &str) {
        let mut reply = String::new();
        reply.push_str(line).unwrap();
        self.replies.push(reply).unwrap();
    }
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
