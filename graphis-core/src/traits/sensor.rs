//! Sensor capability traits
//!
//! A sensor is anything that can be set up once and read as an integer,
//! commonly a boolean 0/1. New sensor kinds implement [`Sensor`] and are
//! added to the collection without touching the dispatcher.

use super::stepper::StepperStatus;

/// A single sensor
pub trait Sensor {
    /// One-time hardware setup, called before the scheduler starts
    fn setup(&mut self) {}

    /// Take a reading
    ///
    /// `steppers` gives read access to motion state for sensors derived
    /// from it. Sensors backed by pins may ignore it.
    fn read(&mut self, steppers: &dyn StepperStatus) -> i32;
}

/// Sensor collection driver
pub trait SensorDriver {
    /// Number of sensors
    fn count(&self) -> usize;

    /// Run `setup` on every sensor
    fn setup_all(&mut self);

    /// Read one sensor; `index` is already range checked
    fn read(&mut self, index: usize, steppers: &dyn StepperStatus) -> i32;
}
