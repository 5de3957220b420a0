//! Servo collection trait

/// Servo collection driver (shield board or directly wired)
///
/// Servo hardware has no acknowledge channel: a write is fire and forget.
pub trait ServoDriver {
    /// Number of servo channels
    fn count(&self) -> usize;

    /// Set the pulse width of one channel
    ///
    /// `micros` is already clamped to the safe servo range and `index` is
    /// already range checked.
    fn write_microseconds(&mut self, index: usize, micros: u16);
}
