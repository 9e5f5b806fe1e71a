use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::mapping::ButtonAction;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Triggers {
    pub left: f32,
    pub right: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: i64,
    pub position: Vector2,
    pub phase: TouchPhase,
}

/// Normalized input state at one instant
///
/// Built fresh on every request; the core never diffs two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSnapshot {
    /// Monotonic milliseconds since the core was created
    pub timestamp: f64,
    pub left_stick: Vector2,
    pub right_stick: Vector2,
    pub buttons: BTreeMap<ButtonAction, bool>,
    pub triggers: Triggers,
    /// Active touches ordered by id
    pub touches: Vec<TouchPoint>,
}

impl InputSnapshot {
    pub fn is_pressed(&self, action: ButtonAction) -> bool {
        self.buttons.get(&action).copied().unwrap_or(false)
    }
}
