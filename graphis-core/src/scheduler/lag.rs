//! Step-lag monitor
//!
//! Steppers only move while they are serviced. A long gap between two
//! service passes means a motor may have missed its step deadline, so the
//! scheduler timestamps every pass and keeps the worst gap seen.

/// Tracks the gap between consecutive stepper service passes
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LagMonitor {
    /// Gap above which a pass counts as late (microseconds)
    threshold_us: u32,
    /// Timestamp of the previous pass
    last_pass_us: Option<u64>,
    /// Largest gap since the last reset
    worst_gap_us: u32,
    /// Passes that arrived later than the threshold
    late_passes: u32,
}

impl LagMonitor {
    /// Create a monitor with the given lateness threshold
    pub const fn new(threshold_us: u32) -> Self {
        Self {
            threshold_us,
            last_pass_us: None,
            worst_gap_us: 0,
            late_passes: 0,
        }
    }

    /// Record a service pass at `now_us`
    ///
    /// Returns the gap if it exceeded the threshold. The first pass has no
    /// predecessor and is never late.
    pub fn record_pass(&mut self, now_us: u64) -> Option<u32> {
        let previous = self.last_pass_us.replace(now_us)?;
        let gap = u32::try_from(now_us.saturating_sub(previous)).unwrap_or(u32::MAX);

        self.worst_gap_us = self.worst_gap_us.max(gap);
        if gap > self.threshold_us {
            self.late_passes = self.late_passes.saturating_add(1);
            Some(gap)
        } else {
            None
        }
    }

    /// Largest gap seen, in microseconds
    pub fn worst_gap_us(&self) -> u32 {
        self.worst_gap_us
    }

    /// Number of late passes
    pub fn late_passes(&self) -> u32 {
        self.late_passes
    }

    /// Forget the history (the next pass is treated as the first)
    pub fn reset(&mut self) {
        self.last_pass_us = None;
        self.worst_gap_us = 0;
        self.late_passes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_pass_is_never_late() {
        let mut lag = LagMonitor::new(500);
        assert_eq!(lag.record_pass(1_000_000), None);
        assert_eq!(lag.worst_gap_us(), 0);
    }

    #[test]
    fn test_gap_tracking() {
        let mut lag = LagMonitor::new(500);
        lag.record_pass(0);
        assert_eq!(lag.record_pass(200), None);
        assert_eq!(lag.record_pass(700), None); // exactly at threshold
        assert_eq!(lag.record_pass(1_500), Some(800));
        assert_eq!(lag.record_pass(1_600), None);

        assert_eq!(lag.worst_gap_us(), 800);
        assert_eq!(lag.late_passes(), 1);
    }

    #[test]
    fn test_huge_gap_saturates() {
        let mut lag = LagMonitor::new(500);
        lag.record_pass(0);
        assert_eq!(lag.record_pass(u64::MAX), Some(u32::MAX));
    }

    #[test]
    fn test_reset() {
        let mut lag = LagMonitor::new(10);
        lag.record_pass(0);
        lag.record_pass(100);
        lag.reset();
        assert_eq!(lag.late_passes(), 0);
        assert_eq!(lag.record_pass(10_000), None);
    }
}
