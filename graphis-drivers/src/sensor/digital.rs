//! Digital input sensor
//!
//! Reads a GPIO as 0/1, e.g. a limit switch or pen-contact switch. The pin
//! is configured as an input (and pulled) by the board HAL before it is
//! handed over.

use embedded_hal::digital::InputPin;

use graphis_core::traits::{Sensor, StepperStatus};

/// GPIO-backed boolean sensor
pub struct DigitalSensor<P> {
    pin: P,
    /// If true, the sensor reads 1 when the pin is LOW (switch to ground)
    active_low: bool,
}

impl<P: InputPin> DigitalSensor<P> {
    /// Sensor that reads 1 when the pin is high
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// Sensor that reads 1 when the pin is low
    pub fn new_active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }
}

impl<P: InputPin> Sensor for DigitalSensor<P> {
    /// Pin read failures read as 0
    fn read(&mut self, _steppers: &dyn StepperStatus) -> i32 {
        match self.pin.is_high() {
            Ok(high) => (high != self.active_low) as i32,
            Err(_) => 0,
        }
    }
}
