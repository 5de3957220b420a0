//! Board-agnostic core logic for the Graphis plotter firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (steppers, servos, sensors, byte stream, clock)
//! - Actuator registry and command dispatcher
//! - Non-blocking motion scheduler
//! - Hardware-free sensors
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod registry;
pub mod scheduler;
pub mod sensor;
pub mod traits;

#[cfg(test)]
mod mock;

pub use graphis_protocol as protocol;
