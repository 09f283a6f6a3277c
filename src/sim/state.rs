//! Run state and core simulation types
//!
//! Everything a single run needs lives in `RunState`; nothing is global.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::layout::generate_layout;
use crate::consts::*;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    /// Before the first run starts
    #[default]
    Idle,
    /// Active gameplay
    Running,
    /// All stars collected
    Won,
    /// Touched a mine
    Lost,
}

impl RunPhase {
    /// Won or Lost: position and counters are frozen until a reset
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Won | RunPhase::Lost)
    }
}

/// Difficulty index, starting at 1 and only ever incremented on a win
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u32);

impl Level {
    pub const FIRST: Level = Level(1);

    /// Build a level from its 1-based number (0 is treated as 1)
    pub fn new(number: u32) -> Self {
        Self(number.max(1))
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Mines scattered at this level: 15, 20, 25, ...
    pub fn total_mines(self) -> u32 {
        BASE_MINES + MINES_PER_LEVEL * (self.0 - 1)
    }

    /// Stars needed to win at this level: 5, 7, 9, ...
    pub fn total_stars(self) -> u32 {
        BASE_STARS + STARS_PER_LEVEL * (self.0 - 1)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::FIRST
    }
}

/// A mine. Position is fixed for its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Hazard {
    pub id: u32,
    pub pos: Vec2,
    /// Display flag only; hidden unless revealed or the run was lost
    pub visible: bool,
}

impl Hazard {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            visible: false,
        }
    }
}

/// A star. `collected` only ever goes from false to true.
#[derive(Debug, Clone, PartialEq)]
pub struct Collectible {
    pub id: u32,
    pub pos: Vec2,
    collected: bool,
}

impl Collectible {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            collected: false,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Mark collected. Returns false if it already was.
    pub fn collect(&mut self) -> bool {
        let first = !self.collected;
        self.collected = true;
        first
    }
}

/// Complete state of the current run plus the level it belongs to
#[derive(Debug, Clone)]
pub struct RunState {
    /// Seed the layout RNG was created from
    pub seed: u64,
    pub phase: RunPhase,
    pub level: Level,
    /// Player position in field percent
    pub pos: Vec2,
    /// Per-frame displacement, derived from the active input intents
    pub velocity: Vec2,
    /// Stars collected this run, never above `level.total_stars()`
    pub collected: u32,
    pub elapsed_secs: u32,
    /// Mines in generation order
    pub hazards: Vec<Hazard>,
    /// Stars in generation order
    pub collectibles: Vec<Collectible>,
    rng: Pcg32,
    /// Next entity ID (monotonic across runs so stale markers never alias)
    next_id: u32,
}

impl RunState {
    /// Create an idle state at level 1 with the given layout seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            phase: RunPhase::Idle,
            level: Level::FIRST,
            pos: Vec2::new(START_X, START_Y),
            velocity: Vec2::ZERO,
            collected: 0,
            elapsed_secs: 0,
            hazards: Vec::new(),
            collectibles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    pub fn total_stars(&self) -> u32 {
        self.level.total_stars()
    }

    /// Idle -> Running
    pub fn start(&mut self) -> bool {
        if self.phase != RunPhase::Idle {
            return false;
        }
        self.enter_running();
        true
    }

    /// Lost -> Running, same level
    pub fn restart(&mut self) -> bool {
        if self.phase != RunPhase::Lost {
            return false;
        }
        self.enter_running();
        true
    }

    /// Won -> Running at the next level
    pub fn advance(&mut self) -> bool {
        if self.phase != RunPhase::Won {
            return false;
        }
        self.level = self.level.next();
        self.enter_running();
        true
    }

    /// Running -> Lost. Every mine stays visible until the next reset.
    pub fn lose(&mut self) {
        if self.phase == RunPhase::Running {
            self.phase = RunPhase::Lost;
            self.set_hazards_visible(true);
        }
    }

    /// Running -> Won
    pub fn win(&mut self) {
        if self.phase == RunPhase::Running {
            self.phase = RunPhase::Won;
        }
    }

    pub fn set_hazards_visible(&mut self, visible: bool) {
        for hazard in &mut self.hazards {
            hazard.visible = visible;
        }
    }

    /// Reset position and counters and replace the whole layout
    fn enter_running(&mut self) {
        self.pos = Vec2::new(START_X, START_Y);
        self.collected = 0;
        self.elapsed_secs = 0;

        let layout = generate_layout(self.level, &mut self.rng, self.next_id);
        self.next_id += layout.len() as u32;
        self.hazards = layout.hazards;
        self.collectibles = layout.collectibles;

        self.phase = RunPhase::Running;
    }
}
