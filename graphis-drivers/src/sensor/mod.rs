//! Pin-backed sensors

pub mod digital;

pub use digital::DigitalSensor;
