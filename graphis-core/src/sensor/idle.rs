//! Motion-derived and constant sensors

use crate::traits::{Sensor, StepperStatus};

/// Reads 1 when all steppers are at their targets, 0 while any is moving
///
/// The host polls this (`i0?;`) to wait for a stroke to finish before
/// lifting or lowering the pen.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteppersIdle;

impl SteppersIdle {
    /// Create the sensor
    pub const fn new() -> Self {
        Self
    }
}

impl Sensor for SteppersIdle {
    fn read(&mut self, steppers: &dyn StepperStatus) -> i32 {
        steppers.all_idle() as i32
    }
}

/// Sensor returning a stored value
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSensor {
    value: i32,
}

impl FixedSensor {
    /// Create a sensor that reads `value`
    pub const fn new(value: i32) -> Self {
        Self { value }
    }

    /// Change the value returned by the next read
    pub fn set(&mut self, value: i32) {
        self.value = value;
    }
}

impl Sensor for FixedSensor {
    fn read(&mut self, _steppers: &dyn StepperStatus) -> i32 {
        self.value
    }
}
