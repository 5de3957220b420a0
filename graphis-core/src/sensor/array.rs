//! Sensor collection built from trait-object handles

use crate::traits::{Sensor, SensorDriver, StepperStatus};

/// Fixed-size collection of sensors of any kind
///
/// Holds `&mut dyn Sensor` handles so digital inputs, motion-derived
/// sensors and future kinds can sit side by side.
pub struct SensorArray<'a, const N: usize> {
    sensors: [&'a mut dyn Sensor; N],
}

impl<'a, const N: usize> SensorArray<'a, N> {
    /// Wrap a list of sensors; index `i` addresses `sensors[i]`
    pub fn new(sensors: [&'a mut dyn Sensor; N]) -> Self {
        Self { sensors }
    }
}

impl<const N: usize> SensorDriver for SensorArray<'_, N> {
    fn count(&self) -> usize {
        N
    }

    fn setup_all(&mut self) {
        for sensor in self.sensors.iter_mut() {
            sensor.setup();
        }
    }

    fn read(&mut self, index: usize, steppers: &dyn StepperStatus) -> i32 {
        match self.sensors.get_mut(index) {
            Some(sensor) => sensor.read(steppers),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSteppers;
    use crate::sensor::{FixedSensor, SteppersIdle};

    struct CountingSensor {
        setups: u32,
    }

    impl Sensor for CountingSensor {
        fn setup(&mut self) {
            self.setups += 1;
        }

        fn read(&mut self, _steppers: &dyn StepperStatus) -> i32 {
            self.setups as i32
        }
    }

    #[test]
    fn test_setup_all_runs_each_sensor() {
        let mut a = CountingSensor { setups: 0 };
        let mut b = CountingSensor { setups: 0 };
        let steppers = MockSteppers::<1>::new();
        {
            let mut array = SensorArray::new([&mut a, &mut b]);
            array.setup_all();
            assert_eq!(array.read(0, &steppers), 1);
            assert_eq!(array.read(1, &steppers), 1);
        }
        assert_eq!(a.setups, 1);
        assert_eq!(b.setups, 1);
    }

    #[test]
    fn test_mixed_kinds() {
        let mut idle = SteppersIdle::new();
        let mut fixed = FixedSensor::new(42);
        let steppers = MockSteppers::<1>::new();
        let mut array = SensorArray::new([&mut idle, &mut fixed]);

        assert_eq!(array.count(), 2);
        assert_eq!(array.read(0, &steppers), 1);
        assert_eq!(array.read(1, &steppers), 42);
        assert_eq!(array.read(2, &steppers), 0);
    }
}
