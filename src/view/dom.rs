//! DOM presentation
//!
//! Markers are absolutely positioned emoji `div`s inside `#game`, placed in
//! field percent. HUD lines are plain text elements.

use std::collections::HashMap;

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use super::ViewCommand;

const MINE_GLYPH: &str = "💣";
const STAR_GLYPH: &str = "⭐";

/// Applies `ViewCommand`s to the page
pub struct DomView {
    document: Document,
    field: Element,
    mines: HashMap<u32, HtmlElement>,
    stars: HashMap<u32, HtmlElement>,
}

impl DomView {
    /// Bind to the `#game` field. Returns `None` if the page lacks it.
    pub fn new(document: Document) -> Option<Self> {
        let field = document.get_element_by_id("game")?;
        Some(Self {
            document,
            field,
            mines: HashMap::new(),
            stars: HashMap::new(),
        })
    }

    pub fn apply_all(&mut self, commands: Vec<ViewCommand>) {
        for cmd in commands {
            self.apply(cmd);
        }
    }

    pub fn apply(&mut self, cmd: ViewCommand) {
        match cmd {
            ViewCommand::SpawnHazard { id, pos } => {
                if let Some(el) = self.marker("mine", MINE_GLYPH, pos) {
                    set_style(&el, "display", "none");
                    self.mines.insert(id, el);
                }
            }
            ViewCommand::RemoveHazard { id } => {
                if let Some(el) = self.mines.remove(&id) {
                    el.remove();
                }
            }
            ViewCommand::SetHazardVisible { id, visible } => {
                if let Some(el) = self.mines.get(&id) {
                    set_style(el, "display", if visible { "block" } else { "none" });
                }
            }
            ViewCommand::SpawnCollectible { id, pos } => {
                if let Some(el) = self.marker("star", STAR_GLYPH, pos) {
                    self.stars.insert(id, el);
                }
            }
            ViewCommand::CollectibleTaken { id } => {
                if let Some(el) = self.stars.remove(&id) {
                    let _ = el.class_list().add_1("collected");
                    el.remove();
                }
            }
            ViewCommand::RemoveCollectible { id } => {
                if let Some(el) = self.stars.remove(&id) {
                    el.remove();
                }
            }
            ViewCommand::MovePlayer { pos } => {
                if let Some(el) = self.html("player") {
                    place(&el, pos);
                }
            }
            ViewCommand::StarsCollected(n) => self.text("stars", &format!("Stars: {}", n)),
            ViewCommand::ElapsedSeconds(n) => self.text("timer", &format!("Time: {}", n)),
            ViewCommand::BestTime(n) => self.text("bestTime", &format!("Best: {}", n)),
            ViewCommand::Level(n) => self.text("levelDisplay", &format!("Level: {}", n)),
            ViewCommand::ShowRestart(show) => self.show("restartBtn", show),
            ViewCommand::ShowAdvance(show) => self.show("nextLevelBtn", show),
        }
    }

    fn marker(&self, class: &str, glyph: &str, pos: Vec2) -> Option<HtmlElement> {
        let el: HtmlElement = self.document.create_element("div").ok()?.dyn_into().ok()?;
        el.set_class_name(class);
        el.set_text_content(Some(glyph));
        place(&el, pos);
        self.field.append_child(&el).ok()?;
        Some(el)
    }

    fn html(&self, id: &str) -> Option<HtmlElement> {
        self.document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn text(&self, id: &str, value: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(value));
        }
    }

    fn show(&self, id: &str, show: bool) {
        if let Some(el) = self.html(id) {
            set_style(&el, "display", if show { "block" } else { "none" });
        }
    }
}

fn place(el: &HtmlElement, pos: Vec2) {
    set_style(el, "left", &format!("{}%", pos.x));
    set_style(el, "top", &format!("{}%", pos.y));
}

fn set_style(el: &HtmlElement, prop: &str, value: &str) {
    let _ = el.style().set_property(prop, value);
}
