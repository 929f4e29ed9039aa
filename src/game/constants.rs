//! Game constants
//!
//! Defaults for session configuration and the fixed numbers used by scoring.

/// Session defaults, overridable through [`crate::config::GameConfig`]
pub mod session {
    /// Game length in seconds
    pub const GAME_DURATION_SECONDS: f64 = 30.0;
    /// Coordinate that separates the two sides (0 = x, 1 = y)
    pub const AXIS: usize = 0;
    /// Largest coordinate index a session may play on
    pub const MAX_AXIS: usize = 1;
}

/// Tracking and debounce constants
pub mod tracking {
    /// Per-tick displacement above which a side change is treated as a
    /// tracking artifact (distance units per tick)
    pub const VELOCITY_GLITCH_THRESHOLD: f64 = 1000.0;
}

/// Scoring constants
pub mod scoring {
    /// Added to the total possession time so the score ratio never divides by zero
    pub const EPSILON: f64 = 1e-9;
    /// Upper end of the displayed score range
    pub const MAX_SCORE: u32 = 100;
    /// Score shown on both sides before any possession time has accrued
    pub const INITIAL_SCORE: u32 = 50;
}

/// Presentation-facing constants
pub mod clock {
    /// Clock face angle for a full game's worth of remaining time
    pub const FULL_CIRCLE_DEGREES: f64 = 360.0;
    /// Length of the pre-game countdown shown by presentation (seconds)
    ///
    /// Not part of core timing: the game clock starts at the START event.
    pub const COUNTDOWN_SECONDS: u32 = 3;
}

/// Feed constants
pub mod feed {
    /// Default live feed address
    pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8008";
    /// Log a progress line every this many lines read
    pub const PROGRESS_LOG_INTERVAL: u64 = 100;
    /// Capacity of the input event queue between the input reader and the loop
    pub const INPUT_QUEUE_CAPACITY: usize = 64;
    /// How often queued input is checked while no frame arrives (milliseconds)
    pub const INPUT_POLL_INTERVAL_MS: u64 = 50;
}
