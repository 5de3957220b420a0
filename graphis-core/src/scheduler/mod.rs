//! Motion scheduler
//!
//! Interleaves host input, command execution and stepper servicing in a
//! single cooperative loop that never blocks.

pub mod lag;
pub mod motion;

pub use lag::LagMonitor;
pub use motion::{
    LoopState, MotionScheduler, PollOutcome, SchedulerStats, DEFAULT_LINE_CAPACITY, READ_CHUNK,
};
