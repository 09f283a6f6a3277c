//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input intents (keyboard, touch buttons, double-tap)
//! - Storage (LocalStorage on web, in-memory elsewhere)
//! - Time (setInterval/setTimeout on web, a manual clock elsewhere)

pub mod input;
pub mod storage;
pub mod time;

pub use input::{Direction, DoubleTapDetector, IntentResolver, REVEAL_KEY};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use time::{Fired, ManualScheduler, Scheduler, Task, TaskHandle};

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStore;
#[cfg(target_arch = "wasm32")]
pub use time::BrowserScheduler;
