//! Stepper collection traits
//!
//! The core never issues step pulses itself. It sets targets and asks the
//! driver to service each motor's step state machine, as often as it can.

/// Read-only view of a stepper collection
///
/// Handed to sensors so motion-derived readings (e.g. "all idle") need no
/// access to the mutable collection.
pub trait StepperStatus {
    /// Number of steppers (fixed at startup)
    fn count(&self) -> usize;

    /// Signed steps remaining between current and target position
    ///
    /// Zero means the motor is at its target. Out of range indices read
    /// as zero.
    fn distance_to_go(&self, index: usize) -> i32;

    /// True if every stepper has reached its target
    fn all_idle(&self) -> bool {
        (0..self.count()).all(|i| self.distance_to_go(i) == 0)
    }
}

/// Stepper collection driver
///
/// Implementations own the motors and their timing state. Indices passed
/// in are already range checked by the dispatcher.
pub trait StepperDriver: StepperStatus {
    /// Set the absolute target position of one stepper
    ///
    /// Must not block; motion progresses only through `service_once`.
    /// A new target simply replaces the previous one.
    fn set_target(&mut self, index: usize, position: i32);

    /// Run one stepper's step state machine once
    ///
    /// Issues at most one step. Returns true if a step was taken.
    fn service_once(&mut self, index: usize) -> bool;

    /// Service every stepper once, in index order
    ///
    /// Returns the number of steps taken.
    fn service_all(&mut self) -> usize {
        let mut stepped = 0;
        for index in 0..self.count() {
            if self.service_once(index) {
                stepped += 1;
            }
        }
        stepped
    }
}
