//! Servo driver implementations
//!
//! - PCA9685 16-channel I2C PWM shield
//! - Servos driven directly from controller PWM channels

pub mod pca9685;
pub mod pwm;

pub use pca9685::{Pca9685, Pca9685Error, CHANNELS};
pub use pwm::{PwmServoBank, SERVO_PERIOD_US};
