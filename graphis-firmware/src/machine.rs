//! Machine configuration embedded at build time
//!
//! build.rs validates `machine.toml` and stores it as postcard bytes in
//! `OUT_DIR`. Decoding is checked again at boot; a mismatch falls back to
//! the stock two-belt plotter layout.

use defmt::*;

use graphis_core::config::{MachineConfig, StepperConfig};

static MACHINE_BIN: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/machine.bin"));

/// Decode the embedded configuration
pub fn load() -> MachineConfig {
    match MachineConfig::from_postcard(MACHINE_BIN) {
        Ok(config) => {
            info!(
                "Configuration loaded: {} steppers, {} loose servos, shield={}",
                config.steppers.len(),
                config.loose_servos.len(),
                config.shield.enabled
            );
            config
        }
        Err(e) => {
            error!("Embedded configuration rejected: {}", e);
            error!("Using stock plotter configuration");
            MachineConfig::plotter()
        }
    }
}

/// Log configured actuators the board has no pins for
pub fn warn_unplaced(config: &MachineConfig, stepper_slots: usize, servo_slots: usize) {
    for stepper in config.surplus_steppers(stepper_slots) {
        warn!(
            "Stepper '{}' has no pins on this board",
            stepper.name.as_str()
        );
    }
    for servo in config.surplus_loose_servos(servo_slots) {
        warn!(
            "Loose servo '{}' has no pin on this board",
            servo.name.as_str()
        );
    }
}

/// Stepper settings for a board slot, defaults if the config has none
pub fn stepper(config: &MachineConfig, slot: usize) -> StepperConfig {
    match config.steppers.get(slot) {
        Some(stepper) => {
            info!(
                "Stepper {} '{}': {} steps/s, {} steps/s^2, inverted={}",
                slot,
                stepper.name.as_str(),
                stepper.max_speed,
                stepper.acceleration,
                stepper.inverted
            );
            stepper.clone()
        }
        None => {
            warn!("No config for stepper slot {}, using defaults", slot);
            StepperConfig::default()
        }
    }
}
