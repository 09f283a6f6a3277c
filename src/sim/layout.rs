//! Mine and star placement
//!
//! Both sets are sampled uniformly and independently from the spawn region.
//! Overlaps between entities are allowed.

use glam::Vec2;
use rand::Rng;

use super::state::{Collectible, Hazard, Level};
use crate::consts::{SPAWN_MAX_X, SPAWN_MAX_Y};

/// A freshly generated set of entities for one run
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub hazards: Vec<Hazard>,
    pub collectibles: Vec<Collectible>,
}

impl Layout {
    /// Total number of entities (and IDs consumed)
    pub fn len(&self) -> usize {
        self.hazards.len() + self.collectibles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scatter `level.total_mines()` mines then `level.total_stars()` stars,
/// assigning sequential IDs starting at `first_id`
pub fn generate_layout<R: Rng>(level: Level, rng: &mut R, first_id: u32) -> Layout {
    let mut layout = Layout::default();
    let mut id = first_id;

    for _ in 0..level.total_mines() {
        layout.hazards.push(Hazard::new(id, spawn_point(rng)));
        id += 1;
    }
    for _ in 0..level.total_stars() {
        layout.collectibles.push(Collectible::new(id, spawn_point(rng)));
        id += 1;
    }

    layout
}

/// Uniform point in `[0, SPAWN_MAX_X) x [0, SPAWN_MAX_Y)`
fn spawn_point<R: Rng>(rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.random_range(0.0..SPAWN_MAX_X),
        rng.random_range(0.0..SPAWN_MAX_Y),
    )
}
