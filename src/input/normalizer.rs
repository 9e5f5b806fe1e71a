use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::debug;

use super::mapping::{ButtonAction, GamepadButton, InputMapping, InputMappingUpdate};
use super::snapshot::{InputSnapshot, TouchPoint, Triggers, Vector2};

/// Radius around neutral inside which a stick axis reads as exactly zero
pub const DEADZONE: f32 = 0.15;

/// Trigger travel above which a trigger counts as a pressed button
pub const TRIGGER_PRESS_THRESHOLD: f32 = 0.5;

/// Per-axis deadzone: zero inside, the raw value untouched outside
pub fn apply_deadzone(value: f32) -> f32 {
    if value.abs() <= DEADZONE {
        0.0
    } else {
        value
    }
}

/// Deadzone plus sign flip, for vertical axes reported up-positive
pub fn apply_deadzone_inverted(value: f32) -> f32 {
    let filtered = apply_deadzone(value);
    if filtered == 0.0 {
        0.0
    } else {
        -filtered
    }
}

/// Raw analog and button state of one controller in hardware convention
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGamepadState {
    pub left_stick: Vector2,
    pub right_stick: Vector2,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub pressed: BTreeSet<GamepadButton>,
}

impl RawGamepadState {
    pub fn is_pressed(&self, button: GamepadButton) -> bool {
        match button {
            GamepadButton::LeftTrigger => self.left_trigger > TRIGGER_PRESS_THRESHOLD,
            GamepadButton::RightTrigger => self.right_trigger > TRIGGER_PRESS_THRESHOLD,
            GamepadButton::Unknown => false,
            other => self.pressed.contains(&other),
        }
    }
}

/// Builds [`InputSnapshot`]s and owns the mutable mapping table
pub struct InputNormalizer {
    mapping: RwLock<InputMapping>,
    epoch: Instant,
}

impl Default for InputNormalizer {
    fn default() -> Self {
        Self::new(InputMapping::default())
    }
}

impl InputNormalizer {
    pub fn new(mapping: InputMapping) -> Self {
        Self {
            mapping: RwLock::new(mapping),
            epoch: Instant::now(),
        }
    }

    pub fn mapping(&self) -> InputMapping {
        self.mapping.read().clone()
    }

    pub fn set_mapping(&self, update: InputMappingUpdate) {
        let changed = self.mapping.write().merge(update);
        debug!("Input mapping updated, {} bindings replaced", changed);
    }

    fn timestamp_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// `raw` is `None` when no controller is selected; the snapshot is still complete
    pub fn normalize(&self, raw: Option<&RawGamepadState>, touches: Vec<TouchPoint>) -> InputSnapshot {
        let mapping = self.mapping.read();

        let mut buttons: BTreeMap<ButtonAction, bool> =
            ButtonAction::ALL.iter().map(|a| (*a, false)).collect();
        let mut left_stick = Vector2::ZERO;
        let mut right_stick = Vector2::ZERO;
        let mut triggers = Triggers::default();

        if let Some(raw) = raw {
            left_stick = Vector2::new(
                apply_deadzone(raw.left_stick.x),
                apply_deadzone_inverted(raw.left_stick.y),
            );
            right_stick = Vector2::new(
                apply_deadzone(raw.right_stick.x),
                apply_deadzone_inverted(raw.right_stick.y),
            );
            triggers = Triggers {
                left: raw.left_trigger,
                right: raw.right_trigger,
            };
            for action in ButtonAction::ALL {
                buttons.insert(action, raw.is_pressed(mapping.button_for(action)));
            }
        }

        InputSnapshot {
            timestamp: self.timestamp_ms(),
            left_stick,
            right_stick,
            buttons,
            triggers,
            touches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::snapshot::TouchPhase;

    #[test]
    fn test_deadzone_boundary() {
        for v in [0.0, 0.05, 0.1, 0.15, -0.15, -0.149] {
            assert_eq!(apply_deadzone(v), 0.0, "{}", v);
        }
        for v in [0.151, 0.5, -0.2, 1.0, -1.0] {
            assert_eq!(apply_deadzone(v), v, "{}", v);
        }
    }

    #[test]
    fn test_vertical_axes_are_inverted() {
        assert_eq!(apply_deadzone_inverted(0.8), -0.8);
        assert_eq!(apply_deadzone_inverted(-0.3), 0.3);
        let zero = apply_deadzone_inverted(0.1);
        assert_eq!(zero, 0.0);
        assert!(zero.is_sign_positive());
    }

    #[test]
    fn test_no_controller_gives_complete_zero_snapshot() {
        let normalizer = InputNormalizer::default();
        let snapshot = normalizer.normalize(None, Vec::new());
        assert_eq!(snapshot.left_stick, Vector2::ZERO);
        assert_eq!(snapshot.right_stick, Vector2::ZERO);
        assert_eq!(snapshot.triggers, Triggers::default());
        assert_eq!(snapshot.buttons.len(), 3);
        assert!(snapshot.buttons.values().all(|p| !p));
        assert!(snapshot.touches.is_empty());
    }

    #[test]
    fn test_sticks_triggers_and_buttons() {
        let normalizer = InputNormalizer::default();
        let raw = RawGamepadState {
            left_stick: Vector2::new(0.1, 0.9),
            right_stick: Vector2::new(-0.6, -0.05),
            left_trigger: 0.12,
            right_trigger: 0.7,
            pressed: [GamepadButton::ButtonA, GamepadButton::ButtonX].into_iter().collect(),
        };
        let snapshot = normalizer.normalize(Some(&raw), Vec::new());

        assert_eq!(snapshot.left_stick, Vector2::new(0.0, -0.9));
        assert_eq!(snapshot.right_stick, Vector2::new(-0.6, 0.0));
        // Triggers pass through without deadzone
        assert_eq!(snapshot.triggers.left, 0.12);
        assert_eq!(snapshot.triggers.right, 0.7);
        assert!(snapshot.is_pressed(ButtonAction::Jump));
        assert!(!snapshot.is_pressed(ButtonAction::Action));
        assert!(snapshot.is_pressed(ButtonAction::Cancel));
    }

    #[test]
    fn test_remapped_and_unknown_buttons() {
        let normalizer = InputNormalizer::default();
        normalizer.set_mapping(
            InputMappingUpdate::default()
                .with_button(ButtonAction::Jump, GamepadButton::RightTrigger)
                .with_button(ButtonAction::Action, GamepadButton::Unknown),
        );
        let raw = RawGamepadState {
            right_trigger: 0.9,
            pressed: [GamepadButton::ButtonB].into_iter().collect(),
            ..Default::default()
        };
        let snapshot = normalizer.normalize(Some(&raw), Vec::new());
        assert!(snapshot.is_pressed(ButtonAction::Jump));
        assert!(!snapshot.is_pressed(ButtonAction::Action));
    }

    #[test]
    fn test_touches_are_carried_through() {
        let normalizer = InputNormalizer::default();
        let touches = vec![TouchPoint {
            id: 3,
            position: Vector2::new(10.0, 20.0),
            phase: TouchPhase::Began,
        }];
        let snapshot = normalizer.normalize(None, touches.clone());
        assert_eq!(snapshot.touches, touches);
    }

    #[test]
    fn test_timestamps_are_monotonic() {
        let normalizer = InputNormalizer::default();
        let first = normalizer.normalize(None, Vec::new()).timestamp;
        let second = normalizer.normalize(None, Vec::new()).timestamp;
        assert!(second >= first);
    }
}
