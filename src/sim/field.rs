//! Field geometry
//!
//! The play field is percentage-normalized: 0..100 on each axis, with the
//! player clamped a little short of the far edges so its marker stays visible.

use glam::Vec2;

use crate::consts::{FIELD_MAX, FIELD_MIN};

/// Restrict each axis independently to `[FIELD_MIN, FIELD_MAX]`
#[inline]
pub fn clamp_to_field(pos: Vec2) -> Vec2 {
    Vec2::new(
        pos.x.clamp(FIELD_MIN, FIELD_MAX),
        pos.y.clamp(FIELD_MIN, FIELD_MAX),
    )
}
