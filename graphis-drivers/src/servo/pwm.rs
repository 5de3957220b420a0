//! Servos on controller PWM channels
//!
//! Each channel runs at the standard 50 Hz servo rate; the pulse width is
//! set as a fraction of the 20 ms period.

use embedded_hal::pwm::SetDutyCycle;

use graphis_core::traits::ServoDriver;

/// Servo PWM period in microseconds (50 Hz)
pub const SERVO_PERIOD_US: u16 = 20_000;

/// Fixed set of directly wired servos
pub struct PwmServoBank<P, const N: usize> {
    channels: [P; N],
    write_errors: u32,
}

impl<P: SetDutyCycle, const N: usize> PwmServoBank<P, N> {
    /// Wrap channels already configured for a 20 ms period
    pub fn new(channels: [P; N]) -> Self {
        Self {
            channels,
            write_errors: 0,
        }
    }

    /// Channel writes that failed since startup
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }
}

impl<P: SetDutyCycle, const N: usize> ServoDriver for PwmServoBank<P, N> {
    fn count(&self) -> usize {
        N
    }

    fn write_microseconds(&mut self, index: usize, micros: u16) {
        let Some(channel) = self.channels.get_mut(index) else {
            return;
        };
        let micros = micros.min(SERVO_PERIOD_US);
        if channel
            .set_duty_cycle_fraction(micros, SERVO_PERIOD_US)
            .is_err()
        {
            self.write_errors = self.write_errors.saturating_add(1);
        }
    }
}
