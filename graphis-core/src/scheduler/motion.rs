//! Cooperative scheduler loop
//!
//! One `poll` is one pass of the firmware main loop:
//!
//! 1. service every stepper
//! 2. drain whatever bytes the stream has ready into the line buffer
//! 3. report an overlong command
//! 4. execute each complete command, servicing every stepper after each
//! 5. flag partial input that has gone quiet for longer than the timeout
//!
//! With N complete commands buffered the steppers get N+1 service passes,
//! so a burst of input cannot starve motion.

use graphis_protocol::{CommandError, LineBuffer, Reply};

use super::lag::LagMonitor;
use crate::config::SchedulerConfig;
use crate::dispatch::{DispatchStats, Dispatcher};
use crate::registry::ActuatorRegistry;
use crate::traits::{ByteStream, Clock, SensorDriver, ServoDriver, StepperDriver};

/// Line buffer size used by the firmware
pub const DEFAULT_LINE_CAPACITY: usize = 128;

/// Largest read issued to the stream in one call
pub const READ_CHUNK: usize = 32;

/// What a poll iteration saw on the input side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopState {
    /// Nothing buffered
    Idle,
    /// At least one complete command was executed
    CommandAvailable,
    /// Bytes of an unterminated command are waiting for the rest
    PartialInput,
}

/// Result of a single `poll`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollOutcome {
    pub state: LoopState,
    /// Commands taken from the buffer (accepted or rejected)
    pub executed: u32,
    /// Error replies sent, including overflow reports
    pub errors: u32,
    /// Partial input just passed the read timeout (reported once per stall)
    pub stale: bool,
    /// Late service gap seen during this poll, in microseconds
    pub late_gap_us: Option<u32>,
}

/// Counters since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerStats {
    pub polls: u32,
    pub bytes_received: u32,
    pub dispatch: DispatchStats,
    pub overflows: u32,
    pub stale_inputs: u32,
    pub worst_lag_us: u32,
    pub late_passes: u32,
}

/// Non-blocking command and motion scheduler
///
/// `N` is the line buffer capacity, i.e. the longest command accepted.
pub struct MotionScheduler<C, const N: usize> {
    clock: C,
    config: SchedulerConfig,
    line: LineBuffer<N>,
    dispatcher: Dispatcher,
    lag: LagMonitor,
    /// Time the last byte arrived
    last_rx_us: u64,
    /// Current stall already reported
    stale_reported: bool,
    polls: u32,
    bytes_received: u32,
    overflows: u32,
    stale_inputs: u32,
}

impl<C: Clock, const N: usize> MotionScheduler<C, N> {
    /// Create a scheduler reading time from `clock`
    pub fn new(clock: C, config: SchedulerConfig) -> Self {
        let now = clock.now_micros();
        Self {
            clock,
            config,
            line: LineBuffer::new(),
            dispatcher: Dispatcher::new(),
            lag: LagMonitor::new(config.lag_warn_us),
            last_rx_us: now,
            stale_reported: false,
            polls: 0,
            bytes_received: 0,
            overflows: 0,
            stale_inputs: 0,
        }
    }

    /// Scheduler configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Bytes of unterminated input currently buffered
    pub fn pending_len(&self) -> usize {
        self.line.pending_len()
    }

    /// Counters since startup
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            polls: self.polls,
            bytes_received: self.bytes_received,
            dispatch: self.dispatcher.stats(),
            overflows: self.overflows,
            stale_inputs: self.stale_inputs,
            worst_lag_us: self.lag.worst_gap_us(),
            late_passes: self.lag.late_passes(),
        }
    }

    /// Run one loop iteration
    pub fn poll<T, S, L, R, B>(
        &mut self,
        registry: &mut ActuatorRegistry<T, S, L, R>,
        stream: &mut B,
    ) -> PollOutcome
    where
        T: StepperDriver,
        S: ServoDriver,
        L: ServoDriver,
        R: SensorDriver,
        B: ByteStream,
    {
        self.polls = self.polls.wrapping_add(1);
        let mut outcome = PollOutcome {
            state: LoopState::Idle,
            executed: 0,
            errors: 0,
            stale: false,
            late_gap_us: None,
        };

        self.service(&mut registry.steppers, &mut outcome);

        let received = self.fill(stream);
        let now = self.clock.now_micros();
        if received > 0 {
            self.last_rx_us = now;
            self.stale_reported = false;
        }

        if let Err(e) = self.line.check_overflow() {
            self.overflows = self.overflows.saturating_add(1);
            outcome.errors += 1;
            send(stream, Reply::Error(CommandError::Line(e)));
        }

        while let Some(segment) = self.line.next_command() {
            let reply = self.dispatcher.execute_line(registry, &segment);
            outcome.executed += 1;
            if reply.is_error() {
                outcome.errors += 1;
            }
            send(stream, reply);
            self.service(&mut registry.steppers, &mut outcome);
        }

        outcome.state = if outcome.executed > 0 {
            LoopState::CommandAvailable
        } else if !self.line.is_blank() {
            LoopState::PartialInput
        } else {
            LoopState::Idle
        };

        if !self.line.is_blank()
            && !self.stale_reported
            && now.saturating_sub(self.last_rx_us) > self.config.read_timeout_us()
        {
            self.stale_reported = true;
            self.stale_inputs = self.stale_inputs.saturating_add(1);
            outcome.stale = true;
        }

        outcome
    }

    /// Poll forever, handing every outcome and the running counters to
    /// `observe`
    pub fn run_forever<T, S, L, R, B, F>(
        &mut self,
        registry: &mut ActuatorRegistry<T, S, L, R>,
        stream: &mut B,
        mut observe: F,
    ) -> !
    where
        T: StepperDriver,
        S: ServoDriver,
        L: ServoDriver,
        R: SensorDriver,
        B: ByteStream,
        F: FnMut(&PollOutcome, &SchedulerStats),
    {
        loop {
            let outcome = self.poll(registry, stream);
            observe(&outcome, &self.stats());
        }
    }

    fn service<T: StepperDriver>(&mut self, steppers: &mut T, outcome: &mut PollOutcome) {
        steppers.service_all();
        if let Some(gap) = self.lag.record_pass(self.clock.now_micros()) {
            outcome.late_gap_us = Some(outcome.late_gap_us.map_or(gap, |g| g.max(gap)));
        }
    }

    /// Move ready bytes into the line buffer, never more than fits
    fn fill<B: ByteStream>(&mut self, stream: &mut B) -> usize {
        let mut chunk = [0u8; READ_CHUNK];
        let mut total = 0;

        while self.line.free() > 0 && stream.available() {
            let want = chunk.len().min(self.line.free());
            let n = stream.read_available(&mut chunk[..want]);
            if n == 0 {
                break;
            }
            self.line.push_bytes(&chunk[..n]);
            total += n;
        }

        self.bytes_received = self.bytes_received.wrapping_add(total as u32);
        total
    }
}

fn send<B: ByteStream>(stream: &mut B, reply: Reply) {
    if let Some(line) = reply.render() {
        stream.write_line(&line);
    }
}
