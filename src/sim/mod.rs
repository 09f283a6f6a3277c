//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One step per frame, no wall-clock reads
//! - Seeded RNG only
//! - Stable iteration order (generation order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod field;
pub mod layout;
pub mod state;
pub mod tick;

pub use collision::{RunEvent, evaluate};
pub use field::clamp_to_field;
pub use layout::{Layout, generate_layout};
pub use state::{Collectible, Hazard, Level, RunPhase, RunState};
pub use tick::{integrate, tick};
