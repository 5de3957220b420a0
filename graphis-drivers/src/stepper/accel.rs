//! Step/direction stepper with constant acceleration
//!
//! Implements the step-interval recurrence from D. Austin, "Generate
//! stepper-motor speed profiles in real time": the first interval is
//! `c0 = 0.676 * sqrt(2 / a)` seconds and each following one is
//! `cn = cn-1 - 2 * cn-1 / (4n + 1)`, clamped at `1 / max_speed`. A
//! negative `n` means the motor is decelerating.
//!
//! The driver never blocks for longer than one step pulse. Call `run` as
//! often as possible with the current time; it steps when the interval
//! has elapsed.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Step pulse width in microseconds
pub const MIN_PULSE_WIDTH_US: u32 = 1;

/// Rotation direction of the last step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepDirection {
    /// Toward higher positions (DIR pin high)
    Forward,
    /// Toward lower positions (DIR pin low)
    Backward,
}

/// Single stepper on a STEP/DIR driver board (A4988, DRV8825, TMC in
/// standalone mode)
pub struct AccelStepper<STEP, DIR, D> {
    step_pin: STEP,
    dir_pin: DIR,
    delay: D,
    /// Flip DIR polarity
    dir_inverted: bool,

    current_pos: i32,
    target_pos: i32,
    /// Signed speed in steps per second
    speed: f32,
    max_speed: f32,
    acceleration: f32,
    direction: StepDirection,

    /// Current step interval in microseconds (0 = stopped)
    step_interval_us: u32,
    last_step_us: u64,

    /// Step counter within the ramp
    n: i32,
    /// Initial step interval in microseconds
    c0: f32,
    /// Last step interval in microseconds
    cn: f32,
    /// Shortest step interval (at max speed)
    cmin: f32,
}

impl<STEP, DIR, D> AccelStepper<STEP, DIR, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    D: DelayNs,
{
    /// Create a stepper at position 0
    ///
    /// Speed and acceleration start at 1 step/s and 1 step/s²; set real
    /// limits with `set_max_speed` and `set_acceleration`.
    pub fn new(step_pin: STEP, dir_pin: DIR, delay: D) -> Self {
        let mut stepper = Self {
            step_pin,
            dir_pin,
            delay,
            dir_inverted: false,
            current_pos: 0,
            target_pos: 0,
            speed: 0.0,
            max_speed: 0.0,
            acceleration: 0.0,
            direction: StepDirection::Backward,
            step_interval_us: 0,
            last_step_us: 0,
            n: 0,
            c0: 0.0,
            cn: 0.0,
            cmin: 1.0,
        };
        stepper.set_max_speed(1.0);
        stepper.set_acceleration(1.0);
        let _ = stepper.step_pin.set_low();
        stepper
    }

    /// Invert the DIR pin
    pub fn set_direction_inverted(&mut self, inverted: bool) {
        self.dir_inverted = inverted;
    }

    /// Set the absolute target position
    pub fn move_to(&mut self, absolute: i32) {
        if self.target_pos != absolute {
            self.target_pos = absolute;
            self.compute_new_speed();
        }
    }

    /// Set the target relative to the current position
    pub fn move_by(&mut self, relative: i32) {
        self.move_to(self.current_pos.saturating_add(relative));
    }

    /// Steps remaining to the target
    pub fn distance_to_go(&self) -> i32 {
        self.target_pos.saturating_sub(self.current_pos)
    }

    pub fn target_position(&self) -> i32 {
        self.target_pos
    }

    pub fn current_position(&self) -> i32 {
        self.current_pos
    }

    /// Current signed speed in steps per second
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// True while moving or not yet at the target
    pub fn is_running(&self) -> bool {
        !(self.speed == 0.0 && self.target_pos == self.current_pos)
    }

    /// Redefine the current position; the motor stops where it is
    pub fn set_current_position(&mut self, position: i32) {
        self.target_pos = position;
        self.current_pos = position;
        self.n = 0;
        self.step_interval_us = 0;
        self.speed = 0.0;
    }

    /// Set the speed limit in steps per second
    pub fn set_max_speed(&mut self, speed: f32) {
        let speed = if speed < 0.0 { -speed } else { speed };
        if speed == 0.0 || self.max_speed == speed {
            return;
        }
        self.max_speed = speed;
        self.cmin = 1_000_000.0 / speed;
        // Already accelerating: recompute where on the ramp we are
        if self.n > 0 {
            self.n = self.steps_to_stop();
            self.compute_new_speed();
        }
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Set the acceleration in steps per second squared (0 is ignored)
    pub fn set_acceleration(&mut self, acceleration: f32) {
        let acceleration = if acceleration < 0.0 {
            -acceleration
        } else {
            acceleration
        };
        if acceleration == 0.0 || self.acceleration == acceleration {
            return;
        }
        if self.acceleration > 0.0 {
            // Keep the same speed on the new ramp
            self.n = (self.n as f32 * (self.acceleration / acceleration)) as i32;
        }
        self.c0 = initial_interval_us(acceleration);
        self.acceleration = acceleration;
        self.compute_new_speed();
    }

    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Decelerate to a stop as quickly as the acceleration allows
    ///
    /// Moves the target to the nearest position the motor can stop at.
    pub fn stop(&mut self) {
        if self.speed != 0.0 {
            let steps = self.steps_to_stop().saturating_add(1);
            if self.speed > 0.0 {
                self.move_by(steps);
            } else {
                self.move_by(-steps);
            }
        }
    }

    /// Step once if a step is due, at the current speed
    ///
    /// Returns true if a step was taken.
    pub fn run_speed(&mut self, now_us: u64) -> bool {
        if self.step_interval_us == 0 {
            return false;
        }
        if now_us.wrapping_sub(self.last_step_us) < self.step_interval_us as u64 {
            return false;
        }

        match self.direction {
            StepDirection::Forward => self.current_pos = self.current_pos.wrapping_add(1),
            StepDirection::Backward => self.current_pos = self.current_pos.wrapping_sub(1),
        }
        self.pulse();
        self.last_step_us = now_us;
        true
    }

    /// Step if due and update the speed for the next step
    ///
    /// Returns true while the motor is still moving toward its target.
    pub fn run(&mut self, now_us: u64) -> bool {
        if self.run_speed(now_us) {
            self.compute_new_speed();
        }
        self.speed != 0.0 || self.distance_to_go() != 0
    }

    fn steps_to_stop(&self) -> i32 {
        ((self.speed * self.speed) / (2.0 * self.acceleration)) as i32
    }

    fn compute_new_speed(&mut self) {
        let distance = self.distance_to_go();
        let steps_to_stop = self.steps_to_stop();

        if distance == 0 && steps_to_stop <= 1 {
            // At the target and slow enough to stop here
            self.step_interval_us = 0;
            self.speed = 0.0;
            self.n = 0;
            return;
        }

        if distance > 0 {
            if self.n > 0 {
                if steps_to_stop >= distance || self.direction == StepDirection::Backward {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0
                && steps_to_stop < distance
                && self.direction == StepDirection::Forward
            {
                self.n = -self.n;
            }
        } else if distance < 0 {
            if self.n > 0 {
                if steps_to_stop >= -distance || self.direction == StepDirection::Forward {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0
                && steps_to_stop < -distance
                && self.direction == StepDirection::Backward
            {
                self.n = -self.n;
            }
        }

        if self.n == 0 {
            // First step from standstill
            self.cn = self.c0;
            self.direction = if distance > 0 {
                StepDirection::Forward
            } else {
                StepDirection::Backward
            };
        } else {
            self.cn -= (2.0 * self.cn) / ((4 * self.n + 1) as f32);
            if self.cn < self.cmin {
                self.cn = self.cmin;
            }
        }
        self.n += 1;
        self.step_interval_us = self.cn as u32;
        self.speed = 1_000_000.0 / self.cn;
        if self.direction == StepDirection::Backward {
            self.speed = -self.speed;
        }
    }

    fn pulse(&mut self) {
        let forward = self.direction == StepDirection::Forward;
        let _ = self.dir_pin.set_state((forward != self.dir_inverted).into());
        let _ = self.step_pin.set_high();
        self.delay.delay_us(MIN_PULSE_WIDTH_US);
        let _ = self.step_pin.set_low();
    }
}

/// `0.676 * sqrt(2 / a)` seconds, in microseconds
fn initial_interval_us(acceleration: f32) -> f32 {
    let ratio = (2.0e12 / acceleration) as u64;
    0.676 * ratio.isqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPin, NoDelay};

    fn stepper() -> AccelStepper<MockPin, MockPin, NoDelay> {
        let mut s = AccelStepper::new(MockPin::new(), MockPin::new(), NoDelay);
        s.set_max_speed(500.0);
        s.set_acceleration(5000.0);
        s
    }

    /// Run until the motor stops or `limit_us` passes; returns step times
    fn run_to_rest(
        s: &mut AccelStepper<MockPin, MockPin, NoDelay>,
        start_us: u64,
        limit_us: u64,
    ) -> heapless::Vec<u64, 512> {
        let mut steps = heapless::Vec::new();
        let mut now = start_us;
        while now < limit_us {
            let before = s.current_position();
            let running = s.run(now);
            if s.current_position() != before {
                steps.push(now).unwrap();
            }
            if !running {
                break;
            }
            now += 10;
        }
        steps
    }

    #[test]
    fn test_initial_interval() {
        // a = 5000 steps/s² -> c0 = 0.676 * 0.02 s
        assert_eq!(initial_interval_us(5000.0) as u32, 13_520);
    }

    #[test]
    fn test_reaches_target_and_stops() {
        let mut s = stepper();
        s.move_to(100);
        assert!(s.is_running());
        assert_eq!(s.distance_to_go(), 100);

        let steps = run_to_rest(&mut s, 0, 2_000_000);
        assert_eq!(steps.len(), 100);
        assert_eq!(s.current_position(), 100);
        assert_eq!(s.distance_to_go(), 0);
        assert_eq!(s.speed(), 0.0);
        assert!(!s.is_running());
        assert_eq!(s.step_pin.rising_edges, 100);
    }

    #[test]
    fn test_accelerates_then_caps_at_max_speed() {
        let mut s = stepper();
        s.move_to(400);
        let steps = run_to_rest(&mut s, 0, 4_000_000);
        assert_eq!(steps.len(), 400);

        let first = steps[1] - steps[0];
        let cruise = steps[200] - steps[199];
        assert!(first > cruise, "{} <= {}", first, cruise);
        // 500 steps/s -> 2000 µs, sampled on a 10 µs grid
        assert!((2_000..2_020).contains(&cruise), "{}", cruise);
        // Decelerates into the target
        let last = steps[399] - steps[398];
        assert!(last > cruise);
    }

    #[test]
    fn test_moves_backwards() {
        let mut s = stepper();
        s.move_to(-20);
        run_to_rest(&mut s, 0, 1_000_000);
        assert_eq!(s.current_position(), -20);
        assert!(s.dir_pin.is_high == Some(false));
    }

    #[test]
    fn test_inverted_direction_pin() {
        let mut s = stepper();
        s.set_direction_inverted(true);
        s.move_to(5);
        run_to_rest(&mut s, 0, 1_000_000);
        assert_eq!(s.current_position(), 5);
        assert!(s.dir_pin.is_high == Some(false));
    }

    #[test]
    fn test_retarget_mid_move() {
        let mut s = stepper();
        s.move_to(300);
        let mut now = 0;
        while s.current_position() < 50 {
            s.run(now);
            now += 10;
        }
        s.move_to(0);
        run_to_rest(&mut s, now, now + 4_000_000);
        assert_eq!(s.current_position(), 0);
        assert!(!s.is_running());
    }

    #[test]
    fn test_stop_decelerates_past_current_position() {
        let mut s = stepper();
        s.move_to(1_000);
        let mut now = 0;
        while s.current_position() < 100 {
            s.run(now);
            now += 10;
        }
        s.stop();
        let target = s.target_position();
        assert!(target > 100 && target < 1_000, "{}", target);

        run_to_rest(&mut s, now, now + 2_000_000);
        assert_eq!(s.current_position(), target);
    }

    #[test]
    fn test_set_current_position_halts() {
        let mut s = stepper();
        s.move_to(50);
        s.run(0);
        s.run(20_000);
        s.set_current_position(7);
        assert_eq!(s.current_position(), 7);
        assert_eq!(s.target_position(), 7);
        assert!(!s.is_running());
        assert!(!s.run(40_000));
    }

    #[test]
    fn test_no_step_before_interval() {
        let mut s = stepper();
        s.move_to(10);
        assert!(!s.run_speed(1_000));
        assert_eq!(s.current_position(), 0);
        assert!(s.run_speed(13_520));
        assert_eq!(s.current_position(), 1);
    }

    #[test]
    fn test_zero_acceleration_ignored() {
        let mut s = stepper();
        s.set_acceleration(0.0);
        assert_eq!(s.acceleration(), 5000.0);
    }
}
