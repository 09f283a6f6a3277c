//! Proximity checks between the player and field entities
//!
//! Mines are checked first, in generation order, and the first one in range
//! ends the evaluation. Stars are only checked if no mine was hit.

use glam::Vec2;

use super::state::RunState;
use crate::consts::{MINE_RADIUS, STAR_RADIUS};

/// Outcome of one proximity evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// Player came within `MINE_RADIUS` of this mine
    Loss { hazard: u32 },
    /// This star was collected
    Collected { star: u32 },
    /// The collected count reached the level's star total
    Win,
}

/// Strict Euclidean proximity test
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance(b) < radius
}

/// Test the player position against every mine and uncollected star.
///
/// Marks stars collected and bumps `state.collected`; the phase itself is
/// left to the caller. A `Loss` is always the only event returned.
pub fn evaluate(state: &mut RunState) -> Vec<RunEvent> {
    let pos = state.pos;

    if let Some(hazard) = state.hazards.iter().find(|h| within(pos, h.pos, MINE_RADIUS)) {
        return vec![RunEvent::Loss { hazard: hazard.id }];
    }

    let total = state.total_stars();
    let mut events = Vec::new();
    for star in state.collectibles.iter_mut() {
        if star.is_collected() || !within(pos, star.pos, STAR_RADIUS) {
            continue;
        }
        star.collect();
        state.collected += 1;
        events.push(RunEvent::Collected { star: star.id });
        if state.collected == total {
            events.push(RunEvent::Win);
        }
    }
    events
}
