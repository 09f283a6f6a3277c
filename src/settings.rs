//! Game settings
//!
//! Persisted as JSON next to the best time. Missing fields fall back to
//! their defaults so older saves keep loading.

use serde::{Deserialize, Serialize};

use crate::consts::{DOUBLE_TAP_MS, MOVE_SPEED, REVEAL_MS, SETTINGS_KEY, TIMER_PERIOD_MS};
use crate::platform::KeyValueStore;

/// Gameplay tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Field units moved per frame per held direction
    pub move_speed: f32,
    /// How long a reveal keeps mines visible
    pub reveal_ms: u32,
    /// Maximum gap between two field taps that counts as a double-tap
    pub double_tap_ms: f64,
    /// Elapsed-time tick period
    pub timer_period_ms: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            move_speed: MOVE_SPEED,
            reveal_ms: REVEAL_MS,
            double_tap_ms: DOUBLE_TAP_MS,
            timer_period_ms: TIMER_PERIOD_MS,
        }
    }
}

impl Settings {
    /// Load settings from a store
    pub fn load<K: KeyValueStore>(store: &K) -> Self {
        if let Some(json) = store.get(SETTINGS_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from storage");
                    return settings;
                }
                Err(e) => log::warn!("Stored settings unreadable ({}), using defaults", e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to a store
    pub fn save<K: KeyValueStore>(&self, store: &mut K) {
        match serde_json::to_string(self) {
            Ok(json) => match store.set(SETTINGS_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Settings not saved: {}", e),
            },
            Err(e) => log::warn!("Settings not serialized: {}", e),
        }
    }
}
