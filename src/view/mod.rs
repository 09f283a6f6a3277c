//! Presentation commands
//!
//! The core never touches the page. It queues `ViewCommand`s and the shell
//! applies them (`DomView` in the browser).

use glam::Vec2;

#[cfg(target_arch = "wasm32")]
pub mod dom;

#[cfg(target_arch = "wasm32")]
pub use dom::DomView;

/// One change to what the player sees
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    /// Place a (hidden) mine marker
    SpawnHazard { id: u32, pos: Vec2 },
    RemoveHazard { id: u32 },
    SetHazardVisible { id: u32, visible: bool },
    /// Place a star marker
    SpawnCollectible { id: u32, pos: Vec2 },
    /// Star was picked up: mark it collected and take it off the field
    CollectibleTaken { id: u32 },
    RemoveCollectible { id: u32 },
    MovePlayer { pos: Vec2 },
    StarsCollected(u32),
    ElapsedSeconds(u32),
    BestTime(u32),
    Level(u32),
    ShowRestart(bool),
    ShowAdvance(bool),
}
