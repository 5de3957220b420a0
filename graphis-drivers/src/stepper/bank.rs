//! Fixed set of steppers sharing one clock
//!
//! Adapts individual motors to the core's indexed `StepperDriver`
//! collection. Indices arrive range checked from the dispatcher; anything
//! else is ignored rather than panicking.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use graphis_core::config::StepperConfig;
use graphis_core::traits::{Clock, StepperDriver, StepperStatus};

use super::accel::AccelStepper;

/// A single motor the bank can drive
pub trait Motor {
    /// Set the absolute target position
    fn move_to(&mut self, target: i32);

    /// Steps remaining to the target
    fn distance_to_go(&self) -> i32;

    /// Current position in steps
    fn current_position(&self) -> i32;

    /// Step if due; returns true while still moving
    fn run(&mut self, now_us: u64) -> bool;
}

impl<STEP, DIR, D> Motor for AccelStepper<STEP, DIR, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    D: DelayNs,
{
    fn move_to(&mut self, target: i32) {
        AccelStepper::move_to(self, target)
    }

    fn distance_to_go(&self) -> i32 {
        AccelStepper::distance_to_go(self)
    }

    fn current_position(&self) -> i32 {
        AccelStepper::current_position(self)
    }

    fn run(&mut self, now_us: u64) -> bool {
        AccelStepper::run(self, now_us)
    }
}

impl<STEP, DIR, D> AccelStepper<STEP, DIR, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    D: DelayNs,
{
    /// Create a stepper with limits and polarity from the machine config
    pub fn from_config(step_pin: STEP, dir_pin: DIR, delay: D, config: &StepperConfig) -> Self {
        let mut stepper = Self::new(step_pin, dir_pin, delay);
        stepper.set_max_speed(config.max_speed as f32);
        stepper.set_acceleration(config.acceleration as f32);
        stepper.set_direction_inverted(config.inverted);
        stepper
    }
}

/// N motors serviced against a shared clock
pub struct StepperBank<M, C, const N: usize> {
    motors: [M; N],
    clock: C,
}

impl<M: Motor, C: Clock, const N: usize> StepperBank<M, C, N> {
    pub fn new(motors: [M; N], clock: C) -> Self {
        Self { motors, clock }
    }

    /// Borrow one motor
    pub fn motor(&self, index: usize) -> Option<&M> {
        self.motors.get(index)
    }

    /// Borrow one motor mutably (e.g. to change limits at runtime)
    pub fn motor_mut(&mut self, index: usize) -> Option<&mut M> {
        self.motors.get_mut(index)
    }

    /// Current position of every motor, in index order
    pub fn positions(&self) -> [i32; N] {
        core::array::from_fn(|i| self.motors[i].current_position())
    }
}

impl<M: Motor, C: Clock, const N: usize> StepperStatus for StepperBank<M, C, N> {
    fn count(&self) -> usize {
        N
    }

    fn distance_to_go(&self, index: usize) -> i32 {
        self.motors.get(index).map_or(0, Motor::distance_to_go)
    }
}

impl<M: Motor, C: Clock, const N: usize> StepperDriver for StepperBank<M, C, N> {
    fn set_target(&mut self, index: usize, position: i32) {
        if let Some(motor) = self.motors.get_mut(index) {
            motor.move_to(position);
        }
    }

    fn service_once(&mut self, index: usize) -> bool {
        let now = self.clock.now_micros();
        match self.motors.get_mut(index) {
            Some(motor) => {
                let before = motor.current_position();
                motor.run(now);
                motor.current_position() != before
            }
            None => false,
        }
    }
}
