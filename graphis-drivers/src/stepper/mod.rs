//! Stepper driver implementations

pub mod accel;
pub mod bank;

pub use accel::{AccelStepper, StepDirection, MIN_PULSE_WIDTH_US};
pub use bank::{Motor, StepperBank};
