//! Runtime configuration types
//!
//! Link and scheduler settings. These are small `Copy` structs handed to
//! the scheduler and the serial driver at startup.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Default inter-byte read timeout for partial commands
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 100;

/// Default service gap above which a pass counts as late
pub const DEFAULT_LAG_WARN_US: u32 = 500;

/// Host link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { baudrate: 115200 }
    }
}

/// Motion scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// How long an unterminated command may sit without new bytes before
    /// it is reported as stale (it stays buffered)
    pub read_timeout_ms: u32,
    /// Gap between stepper service passes that counts as late
    pub lag_warn_us: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            lag_warn_us: DEFAULT_LAG_WARN_US,
        }
    }
}

impl SchedulerConfig {
    /// Read timeout in microseconds
    pub fn read_timeout_us(&self) -> u64 {
        self.read_timeout_ms as u64 * 1000
    }
}
