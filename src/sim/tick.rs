//! Per-frame simulation step
//!
//! One step per display frame, no delta time: movement speed is tied to the
//! display refresh rate.

use glam::Vec2;

use super::collision::{RunEvent, evaluate};
use super::field::clamp_to_field;
use super::state::{RunPhase, RunState};

/// Advance a position by one frame of velocity and clamp it to the field
#[inline]
pub fn integrate(pos: Vec2, velocity: Vec2) -> Vec2 {
    clamp_to_field(pos + velocity)
}

/// Move the player, run proximity checks and apply any terminal outcome.
///
/// Does nothing unless the run is `Running`.
pub fn tick(state: &mut RunState) -> Vec<RunEvent> {
    if state.phase != RunPhase::Running {
        return Vec::new();
    }

    state.pos = integrate(state.pos, state.velocity);

    let events = evaluate(state);
    for event in &events {
        match event {
            RunEvent::Loss { .. } => state.lose(),
            RunEvent::Win => state.win(),
            RunEvent::Collected { .. } => {}
        }
    }
    events
}
