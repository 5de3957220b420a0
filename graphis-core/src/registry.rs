//! Actuator registry
//!
//! Fixed-shape collections of steppers, servos and sensors, built once at
//! startup and passed by reference into the dispatcher and scheduler. The
//! number of actuators in each collection never changes; their state does.

use crate::traits::{SensorDriver, ServoDriver, StepperDriver};

/// All actuators the command core can address
///
/// Each collection is its own index namespace: stepper 0 and servo 0 are
/// unrelated.
pub struct ActuatorRegistry<T, S, L, N> {
    /// Stepper motors (`t` commands)
    pub steppers: T,
    /// Servos on the PWM driver board (`s` commands)
    pub shield_servos: S,
    /// Servos wired to controller pins (`l` commands)
    pub loose_servos: L,
    /// Sensors (`i` queries)
    pub sensors: N,
}

impl<T, S, L, N> ActuatorRegistry<T, S, L, N>
where
    T: StepperDriver,
    S: ServoDriver,
    L: ServoDriver,
    N: SensorDriver,
{
    /// Assemble a registry from its collections
    pub fn new(steppers: T, shield_servos: S, loose_servos: L, sensors: N) -> Self {
        Self {
            steppers,
            shield_servos,
            loose_servos,
            sensors,
        }
    }

    /// Run one-time sensor setup
    pub fn setup(&mut self) {
        self.sensors.setup_all();
    }

    /// Collection sizes, for logging at boot
    pub fn counts(&self) -> RegistryCounts {
        RegistryCounts {
            steppers: self.steppers.count(),
            shield_servos: self.shield_servos.count(),
            loose_servos: self.loose_servos.count(),
            sensors: self.sensors.count(),
        }
    }
}

/// Number of actuators per collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistryCounts {
    pub steppers: usize,
    pub shield_servos: usize,
    pub loose_servos: usize,
    pub sensors: usize,
}

/// A servo collection with no channels
///
/// For boards without a shield or without loose servos.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServos;

impl ServoDriver for NoServos {
    fn count(&self) -> usize {
        0
    }

    fn write_microseconds(&mut self, _index: usize, _micros: u16) {}
}

/// An optional servo collection; `None` has no channels
///
/// Lets a board decide at boot (from config) whether a shield is fitted
/// without changing the registry type.
impl<D: ServoDriver> ServoDriver for Option<D> {
    fn count(&self) -> usize {
        self.as_ref().map_or(0, ServoDriver::count)
    }

    fn write_microseconds(&mut self, index: usize, micros: u16) {
        if let Some(servos) = self {
            servos.write_microseconds(index, micros);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockServos, MockSteppers};
    use crate::sensor::{FixedSensor, SensorArray, SteppersIdle};
    use crate::traits::Sensor;

    #[test]
    fn test_counts() {
        let mut idle = SteppersIdle::new();
        let mut fixed = FixedSensor::new(3);
        let sensors: [&mut dyn Sensor; 2] = [&mut idle, &mut fixed];

        let registry = ActuatorRegistry::new(
            MockSteppers::<2>::new(),
            MockServos::<16>::new(),
            NoServos,
            SensorArray::new(sensors),
        );

        assert_eq!(
            registry.counts(),
            RegistryCounts {
                steppers: 2,
                shield_servos: 16,
                loose_servos: 0,
                sensors: 2,
            }
        );
    }

    #[test]
    fn test_no_servos_ignores_writes() {
        let mut none = NoServos;
        none.write_microseconds(0, 1500);
        assert_eq!(none.count(), 0);
    }

    #[test]
    fn test_optional_servo_bank() {
        let mut fitted = Some(MockServos::<16>::new());
        assert_eq!(fitted.count(), 16);
        fitted.write_microseconds(4, 1200);
        assert_eq!(fitted.as_ref().and_then(|s| s.last(4)), Some(1200));

        let absent: Option<MockServos<16>> = None;
        assert_eq!(absent.count(), 0);
    }
}
