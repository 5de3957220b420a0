//! Hardware configuration types
//!
//! These types define the actuator line-up of a rig: stepper kinematic
//! limits, the servo shield and the directly wired servos. Pin routing is
//! board-specific and lives in the firmware.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::{SchedulerConfig, SerialConfig, MAX_LABEL_LEN};

/// Maximum steppers per config
pub const MAX_STEPPERS: usize = 4;

/// Maximum directly wired servos per config
pub const MAX_LOOSE_SERVOS: usize = 4;

/// PCA9685 prescaler limits expressed as output frequency (25 MHz clock)
pub const MIN_PWM_FREQ_HZ: u16 = 24;
pub const MAX_PWM_FREQ_HZ: u16 = 1526;

/// Current configuration layout version
pub const CONFIG_VERSION: u8 = 1;

/// Stepper motor configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepperConfig {
    /// Stepper name (e.g., "top_left")
    pub name: String<MAX_LABEL_LEN>,
    /// Maximum speed in steps per second
    pub max_speed: u32,
    /// Acceleration in steps per second squared
    pub acceleration: u32,
    /// Flip the direction pin so positive targets turn the other way
    pub inverted: bool,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            max_speed: 500,
            acceleration: 5000,
            inverted: false,
        }
    }
}

/// Directly wired servo configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LooseServoConfig {
    /// Servo name (e.g., "pen")
    pub name: String<MAX_LABEL_LEN>,
    /// Pulse width written at boot, in microseconds
    pub initial_micros: Option<u16>,
}

/// PCA9685 servo shield configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShieldConfig {
    /// Shield fitted; without it `s` commands are rejected
    pub enabled: bool,
    /// 7-bit I2C address
    pub address: u8,
    /// Calibrated oscillator frequency in Hz
    pub oscillator_hz: u32,
    /// Servo PWM frequency in Hz
    pub pwm_freq_hz: u16,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: 0x40,
            oscillator_hz: 27_000_000,
            pwm_freq_hz: 50,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Stored layout version does not match this firmware
    VersionMismatch,
    /// Stepper max speed is zero
    InvalidSpeed { stepper: usize },
    /// Stepper acceleration is zero
    InvalidAcceleration { stepper: usize },
    /// Two actuators of the same collection share a name
    DuplicateName,
    /// Shield PWM frequency outside what the prescaler can produce
    PwmFrequencyOutOfRange,
    /// Baud rate is zero
    InvalidBaudrate,
    /// Postcard decoding failed
    Deserialize,
}

/// Complete machine configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MachineConfig {
    /// Layout version
    pub version: u8,
    /// Stepper motors, in index order
    pub steppers: Vec<StepperConfig, MAX_STEPPERS>,
    /// Directly wired servos, in index order
    pub loose_servos: Vec<LooseServoConfig, MAX_LOOSE_SERVOS>,
    /// Servo shield
    pub shield: ShieldConfig,
    /// Host link
    pub serial: SerialConfig,
    /// Scheduler timing
    pub scheduler: SchedulerConfig,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            steppers: Vec::new(),
            loose_servos: Vec::new(),
            shield: ShieldConfig::default(),
            serial: SerialConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl MachineConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-belt plotter: two steppers and a pen-lift servo
    pub fn plotter() -> Self {
        let mut config = Self::new();
        for name in ["top_left", "top_right"] {
            let _ = config.steppers.push(StepperConfig {
                name: label(name),
                ..Default::default()
            });
        }
        let _ = config.loose_servos.push(LooseServoConfig {
            name: label("pen"),
            initial_micros: None,
        });
        config
    }

    /// Find a stepper index by name
    pub fn find_stepper(&self, name: &str) -> Option<usize> {
        self.steppers.iter().position(|s| s.name.as_str() == name)
    }

    /// Find a loose servo index by name
    pub fn find_loose_servo(&self, name: &str) -> Option<usize> {
        self.loose_servos
            .iter()
            .position(|s| s.name.as_str() == name)
    }

    /// Steppers configured beyond the first `slots` board positions
    pub fn surplus_steppers(&self, slots: usize) -> &[StepperConfig] {
        self.steppers.get(slots..).unwrap_or(&[])
    }

    /// Loose servos configured beyond the first `slots` board positions
    pub fn surplus_loose_servos(&self, slots: usize) -> &[LooseServoConfig] {
        self.loose_servos.get(slots..).unwrap_or(&[])
    }

    /// Check the configuration for values the drivers cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }

        for (index, stepper) in self.steppers.iter().enumerate() {
            if stepper.max_speed == 0 {
                return Err(ConfigError::InvalidSpeed { stepper: index });
            }
            if stepper.acceleration == 0 {
                return Err(ConfigError::InvalidAcceleration { stepper: index });
            }
        }

        if has_duplicates(self.steppers.iter().map(|s| s.name.as_str()))
            || has_duplicates(self.loose_servos.iter().map(|s| s.name.as_str()))
        {
            return Err(ConfigError::DuplicateName);
        }

        if self.shield.enabled
            && !(MIN_PWM_FREQ_HZ..=MAX_PWM_FREQ_HZ).contains(&self.shield.pwm_freq_hz)
        {
            return Err(ConfigError::PwmFrequencyOutOfRange);
        }

        if self.serial.baudrate == 0 {
            return Err(ConfigError::InvalidBaudrate);
        }

        Ok(())
    }

    /// Decode a postcard-encoded configuration and validate it
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }
}

fn label(name: &str) -> String<MAX_LABEL_LEN> {
    let mut s = String::new();
    let _ = s.push_str(name);
    s
}

/// Empty names are allowed to repeat
fn has_duplicates<'a>(names: impl Iterator<Item = &'a str> + Clone) -> bool {
    names
        .clone()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .any(|(i, name)| names.clone().skip(i + 1).any(|other| other == name))
}
