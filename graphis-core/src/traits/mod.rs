//! Collaborator traits
//!
//! These traits define the interface between the command core and the
//! hardware-specific drivers that move steppers, pulse servos, read
//! sensors and carry bytes.

pub mod clock;
pub mod sensor;
pub mod servo;
pub mod stepper;
pub mod stream;

pub use clock::Clock;
pub use sensor::{Sensor, SensorDriver};
pub use servo::ServoDriver;
pub use stepper::{StepperDriver, StepperStatus};
pub use stream::ByteStream;
