//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in graphis-core on top of `embedded-hal` and `embedded-io`:
//!
//! - Steppers (step/dir drivers with acceleration ramps)
//! - Servos (PCA9685 shield, direct PWM channels)
//! - Digital input sensors
//! - UART host link

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod sensor;
pub mod serial;
pub mod servo;
pub mod stepper;

#[cfg(test)]
mod mock;
