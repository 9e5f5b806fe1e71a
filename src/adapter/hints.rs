use serde::Serialize;

use crate::device::InputMode;

/// Short control explanations shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlHints {
    pub movement: &'static str,
    pub action: &'static str,
    pub camera: &'static str,
}

const TOUCH: ControlHints = ControlHints {
    movement: "Drag to move",
    action: "Tap to interact",
    camera: "Pinch to zoom",
};

const GAMEPAD: ControlHints = ControlHints {
    movement: "Left stick to move",
    action: "A / X to interact",
    camera: "Right stick to look",
};

const HYBRID: ControlHints = ControlHints {
    movement: "Touch or stick to move",
    action: "Tap or A to interact",
    camera: "Swipe or right stick",
};

const KEYBOARD: ControlHints = ControlHints {
    movement: "WASD to move",
    action: "Click to interact",
    camera: "Mouse to look",
};

impl Default for ControlHints {
    fn default() -> Self {
        TOUCH
    }
}

impl ControlHints {
    pub fn for_mode(mode: InputMode) -> Self {
        match mode {
            InputMode::Touch => TOUCH,
            InputMode::Gamepad => GAMEPAD,
            InputMode::Hybrid => HYBRID,
            InputMode::Keyboard => KEYBOARD,
        }
    }
}
