//! Application-wide constants and configuration values

// Load shape limits
pub const MAX_CONCURRENCY_LIMIT: u32 = 10_000;

// Channel and buffer constants
pub const MIN_RESULT_CHANNEL_CAPACITY: usize = 1;

// Logging cadence
pub const DEBUG_LOG_INTERVAL: u64 = 100;
pub const PROGRESS_LOG_INTERVAL: u64 = 1_000;
