//! Input intent resolution
//!
//! Keyboard keys and the four on-screen touch buttons both feed the same
//! four direction intents. The velocity is recomputed from scratch whenever
//! an intent changes.

use std::collections::HashSet;

use glam::Vec2;

/// Key that triggers a mine reveal
pub const REVEAL_KEY: &str = " ";

/// One of the four movement intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Map a `KeyboardEvent.key` value. Letter keys are case-sensitive.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "w" => Some(Direction::Up),
            "ArrowDown" | "s" => Some(Direction::Down),
            "ArrowLeft" | "a" => Some(Direction::Left),
            "ArrowRight" | "d" => Some(Direction::Right),
            _ => None,
        }
    }

    /// DOM id of the matching touch button
    pub fn button_id(self) -> &'static str {
        match self {
            Direction::Up => "upBtn",
            Direction::Down => "downBtn",
            Direction::Left => "leftBtn",
            Direction::Right => "rightBtn",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Tracks held keys and pressed touch buttons
#[derive(Debug, Clone, Default)]
pub struct IntentResolver {
    /// Direction keys currently held (by key name, so `a` and `ArrowLeft`
    /// are released independently)
    held_keys: HashSet<String>,
    /// Touch buttons currently pressed, indexed by `Direction`
    touch: [bool; 4],
}

impl IntentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns true if a direction intent changed.
    pub fn key_down(&mut self, key: &str) -> bool {
        Direction::from_key(key).is_some() && self.held_keys.insert(key.to_string())
    }

    /// Record a key release. Returns true if a direction intent changed.
    pub fn key_up(&mut self, key: &str) -> bool {
        self.held_keys.remove(key)
    }

    /// Record a touch button press or release
    pub fn set_touch(&mut self, dir: Direction, pressed: bool) -> bool {
        let slot = &mut self.touch[dir.index()];
        let changed = *slot != pressed;
        *slot = pressed;
        changed
    }

    /// Whether any source currently holds this direction
    pub fn is_active(&self, dir: Direction) -> bool {
        self.touch[dir.index()]
            || self
                .held_keys
                .iter()
                .any(|k| Direction::from_key(k) == Some(dir))
    }

    /// Combine intents additively. Diagonals are not normalized, so
    /// up+left moves `speed` on both axes.
    pub fn velocity(&self, speed: f32) -> Vec2 {
        let axis = |neg: Direction, pos: Direction| {
            (self.is_active(pos) as i8 - self.is_active(neg) as i8) as f32
        };
        Vec2::new(
            axis(Direction::Left, Direction::Right),
            axis(Direction::Up, Direction::Down),
        ) * speed
    }
}

/// Recognizes two taps closer together than a window
#[derive(Debug, Clone)]
pub struct DoubleTapDetector {
    window_ms: f64,
    last_tap: Option<f64>,
}

impl DoubleTapDetector {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            last_tap: None,
        }
    }

    /// Register a tap at `now_ms`. Returns true if it completes a double-tap.
    /// Every tap becomes the new reference point.
    pub fn tap(&mut self, now_ms: f64) -> bool {
        let double = self
            .last_tap
            .map(|last| {
                let delta = now_ms - last;
                delta > 0.0 && delta < self.window_ms
            })
            .unwrap_or(false);
        self.last_tap = Some(now_ms);
        double
    }
}
