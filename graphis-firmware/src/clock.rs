//! Monotonic time source for the scheduler and the stepper bank

use embassy_time::Instant;
use graphis_core::traits::Clock;

/// Embassy time driver clock (RP2040 TIMER, 1 MHz)
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_micros(&self) -> u64 {
        Instant::now().as_micros()
    }
}
