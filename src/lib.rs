//! Mine Dash - A timed star-collecting arcade game with hidden mines
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, proximity checks, run state)
//! - `session`: Run/level state machine wired to timers, storage and view
//! - `platform`: Browser/native platform abstraction (input, storage, time)
//! - `view`: Presentation commands emitted by the core
//! - `best_time`: Persisted best completion time

pub mod best_time;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod view;

pub use best_time::BestTime;
pub use session::Session;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Upper clamp bound on each axis (field is 0..100 in percent)
    pub const FIELD_MAX: f32 = 98.0;
    /// Lower clamp bound on each axis
    pub const FIELD_MIN: f32 = 0.0;

    /// Spawn region for mines and stars (exclusive upper bounds)
    pub const SPAWN_MAX_X: f32 = 95.0;
    pub const SPAWN_MAX_Y: f32 = 85.0;

    /// Player start position at the bottom-center of the field
    pub const START_X: f32 = 50.0;
    pub const START_Y: f32 = 90.0;

    /// Player-to-mine distance below which the run is lost
    pub const MINE_RADIUS: f32 = 3.0;
    /// Player-to-star distance below which the star is collected
    pub const STAR_RADIUS: f32 = 3.5;

    /// Field units moved per frame per active direction
    pub const MOVE_SPEED: f32 = 0.6;

    /// Elapsed-time tick period
    pub const TIMER_PERIOD_MS: u32 = 1000;
    /// How long a reveal keeps mines visible
    pub const REVEAL_MS: u32 = 1000;
    /// Two field taps closer than this trigger a reveal
    pub const DOUBLE_TAP_MS: f64 = 300.0;

    /// Level 1 counts and per-level growth
    pub const BASE_MINES: u32 = 15;
    pub const MINES_PER_LEVEL: u32 = 5;
    pub const BASE_STARS: u32 = 5;
    pub const STARS_PER_LEVEL: u32 = 2;

    /// Storage key for the best completion time (seconds as text)
    pub const BEST_TIME_KEY: &str = "bestTime";
    /// Storage key for persisted settings (JSON)
    pub const SETTINGS_KEY: &str = "mine_dash_settings";
}
