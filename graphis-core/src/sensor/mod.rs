//! Sensor implementations that need no hardware
//!
//! - [`SteppersIdle`]: 1 when every stepper has reached its target
//! - [`FixedSensor`]: returns a stored value (bring-up and testing)
//! - [`SensorArray`]: collection of capability-typed sensor handles

pub mod array;
pub mod idle;

pub use array::SensorArray;
pub use idle::{FixedSensor, SteppersIdle};
