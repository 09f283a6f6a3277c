//! Best completion time
//!
//! Stored as plain decimal seconds under a single key. Lower is better.

use crate::consts::BEST_TIME_KEY;
use crate::platform::KeyValueStore;

/// Best-time record backed by a key-value store
#[derive(Debug, Clone)]
pub struct BestTime<K: KeyValueStore> {
    store: K,
}

impl<K: KeyValueStore> BestTime<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Current best in seconds. Missing or unparsable values count as none.
    pub fn current(&self) -> Option<u32> {
        let raw = self.store.get(BEST_TIME_KEY)?;
        match raw.trim().parse::<u32>() {
            Ok(secs) => Some(secs),
            Err(_) => {
                log::warn!("Ignoring unreadable best time {:?}", raw);
                None
            }
        }
    }

    /// Store `candidate` if there is no best yet or it is strictly lower.
    /// Returns true only if the new record was written.
    pub fn record_if_better(&mut self, candidate: u32) -> bool {
        if self.current().is_some_and(|best| candidate >= best) {
            return false;
        }

        match self.store.set(BEST_TIME_KEY, &candidate.to_string()) {
            Ok(()) => {
                log::info!("New best time: {}s", candidate);
                true
            }
            Err(e) => {
                log::warn!("Best time {}s not saved: {}", candidate, e);
                false
            }
        }
    }

    pub fn store(&self) -> &K {
        &self.store
    }
}
