//! Logical action to physical control mapping
//!
//! Two independent tables: keyboard key identifiers for all seven actions,
//! and one gamepad button for each of the three button-producing actions.
//! Both change only through [`InputMapping::merge`], which leaves every action
//! the update does not mention untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Maximum key identifiers kept per action
pub const MAX_KEYS_PER_ACTION: usize = 5;
/// Key identifiers must be shorter than this
pub const MAX_KEY_ID_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Jump,
    Action,
    Cancel,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::MoveForward,
        Action::MoveBackward,
        Action::MoveLeft,
        Action::MoveRight,
        Action::Jump,
        Action::Action,
        Action::Cancel,
    ];
}

/// The actions that a gamepad button can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ButtonAction {
    Jump,
    Action,
    Cancel,
}

impl ButtonAction {
    pub const ALL: [ButtonAction; 3] = [ButtonAction::Jump, ButtonAction::Action, ButtonAction::Cancel];
}

impl From<ButtonAction> for Action {
    fn from(action: ButtonAction) -> Self {
        match action {
            ButtonAction::Jump => Action::Jump,
            ButtonAction::Action => Action::Action,
            ButtonAction::Cancel => Action::Cancel,
        }
    }
}

/// Physical gamepad button identifiers
///
/// Names outside this set parse to [`GamepadButton::Unknown`], which is never
/// pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum GamepadButton {
    ButtonA,
    ButtonB,
    ButtonX,
    ButtonY,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    LeftThumbstickButton,
    RightThumbstickButton,
    ButtonMenu,
    ButtonOptions,
    Unknown,
}

impl GamepadButton {
    pub fn name(self) -> &'static str {
        match self {
            GamepadButton::ButtonA => "buttonA",
            GamepadButton::ButtonB => "buttonB",
            GamepadButton::ButtonX => "buttonX",
            GamepadButton::ButtonY => "buttonY",
            GamepadButton::LeftShoulder => "leftShoulder",
            GamepadButton::RightShoulder => "rightShoulder",
            GamepadButton::LeftTrigger => "leftTrigger",
            GamepadButton::RightTrigger => "rightTrigger",
            GamepadButton::DpadUp => "dpadUp",
            GamepadButton::DpadDown => "dpadDown",
            GamepadButton::DpadLeft => "dpadLeft",
            GamepadButton::DpadRight => "dpadRight",
            GamepadButton::LeftThumbstickButton => "leftThumbstickButton",
            GamepadButton::RightThumbstickButton => "rightThumbstickButton",
            GamepadButton::ButtonMenu => "buttonMenu",
            GamepadButton::ButtonOptions => "buttonOptions",
            GamepadButton::Unknown => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "buttonA" => GamepadButton::ButtonA,
            "buttonB" => GamepadButton::ButtonB,
            "buttonX" => GamepadButton::ButtonX,
            "buttonY" => GamepadButton::ButtonY,
            "leftShoulder" => GamepadButton::LeftShoulder,
            "rightShoulder" => GamepadButton::RightShoulder,
            "leftTrigger" => GamepadButton::LeftTrigger,
            "rightTrigger" => GamepadButton::RightTrigger,
            "dpadUp" => GamepadButton::DpadUp,
            "dpadDown" => GamepadButton::DpadDown,
            "dpadLeft" => GamepadButton::DpadLeft,
            "dpadRight" => GamepadButton::DpadRight,
            "leftThumbstickButton" => GamepadButton::LeftThumbstickButton,
            "rightThumbstickButton" => GamepadButton::RightThumbstickButton,
            "buttonMenu" => GamepadButton::ButtonMenu,
            "buttonOptions" => GamepadButton::ButtonOptions,
            other => {
                debug!("Unknown gamepad button name: {}", other);
                GamepadButton::Unknown
            }
        }
    }
}

impl From<String> for GamepadButton {
    fn from(name: String) -> Self {
        GamepadButton::from_name(&name)
    }
}

impl From<GamepadButton> for &'static str {
    fn from(button: GamepadButton) -> Self {
        button.name()
    }
}

impl fmt::Display for GamepadButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Partial mapping update; `None` fields keep their current binding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputMappingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_forward: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_backward: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_left: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_right: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jump: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel: Option<Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub gamepad_buttons: BTreeMap<ButtonAction, GamepadButton>,
}

impl InputMappingUpdate {
    pub fn with_keys<I, K>(mut self, action: Action, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        *self.slot_mut(action) = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_button(mut self, action: ButtonAction, button: GamepadButton) -> Self {
        self.gamepad_buttons.insert(action, button);
        self
    }

    pub fn is_empty(&self) -> bool {
        Action::ALL.iter().all(|a| self.slot(*a).is_none()) && self.gamepad_buttons.is_empty()
    }

    fn slot(&self, action: Action) -> &Option<Vec<String>> {
        match action {
            Action::MoveForward => &self.move_forward,
            Action::MoveBackward => &self.move_backward,
            Action::MoveLeft => &self.move_left,
            Action::MoveRight => &self.move_right,
            Action::Jump => &self.jump,
            Action::Action => &self.action,
            Action::Cancel => &self.cancel,
        }
    }

    fn slot_mut(&mut self, action: Action) -> &mut Option<Vec<String>> {
        match action {
            Action::MoveForward => &mut self.move_forward,
            Action::MoveBackward => &mut self.move_backward,
            Action::MoveLeft => &mut self.move_left,
            Action::MoveRight => &mut self.move_right,
            Action::Jump => &mut self.jump,
            Action::Action => &mut self.action,
            Action::Cancel => &mut self.cancel,
        }
    }
}

/// Current key and gamepad bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMapping {
    keys: BTreeMap<Action, Vec<String>>,
    gamepad_buttons: BTreeMap<ButtonAction, GamepadButton>,
}

impl Default for InputMapping {
    fn default() -> Self {
        let keys = |ids: &[&str]| ids.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut key_table = BTreeMap::new();
        key_table.insert(Action::MoveForward, keys(&["KeyW", "ArrowUp"]));
        key_table.insert(Action::MoveBackward, keys(&["KeyS", "ArrowDown"]));
        key_table.insert(Action::MoveLeft, keys(&["KeyA", "ArrowLeft"]));
        key_table.insert(Action::MoveRight, keys(&["KeyD", "ArrowRight"]));
        key_table.insert(Action::Jump, keys(&["Space"]));
        key_table.insert(Action::Action, keys(&["KeyE", "Enter"]));
        key_table.insert(Action::Cancel, keys(&["Escape"]));

        let mut gamepad_buttons = BTreeMap::new();
        gamepad_buttons.insert(ButtonAction::Jump, GamepadButton::ButtonA);
        gamepad_buttons.insert(ButtonAction::Action, GamepadButton::ButtonB);
        gamepad_buttons.insert(ButtonAction::Cancel, GamepadButton::ButtonX);

        Self {
            keys: key_table,
            gamepad_buttons,
        }
    }
}

impl InputMapping {
    pub fn keys_for(&self, action: Action) -> &[String] {
        self.keys.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn button_for(&self, action: ButtonAction) -> GamepadButton {
        self.gamepad_buttons
            .get(&action)
            .copied()
            .unwrap_or(GamepadButton::Unknown)
    }

    /// Applies a partial update, returns the number of bindings replaced
    pub fn merge(&mut self, update: InputMappingUpdate) -> usize {
        let mut changed = 0;

        for action in Action::ALL {
            if let Some(keys) = update.slot(action) {
                let keys = sanitize_keys(action, keys);
                debug!("Rebinding {:?} to {:?}", action, keys);
                self.keys.insert(action, keys);
                changed += 1;
            }
        }

        for (action, button) in update.gamepad_buttons {
            debug!("Rebinding gamepad {:?} to {}", action, button);
            self.gamepad_buttons.insert(action, button);
            changed += 1;
        }

        changed
    }
}

fn sanitize_keys(action: Action, keys: &[String]) -> Vec<String> {
    if keys.len() > MAX_KEYS_PER_ACTION {
        warn!(
            "{:?} has {} key bindings, keeping the first {}",
            action,
            keys.len(),
            MAX_KEYS_PER_ACTION
        );
    }
    keys.iter()
        .take(MAX_KEYS_PER_ACTION)
        .filter(|k| {
            let keep = k.len() < MAX_KEY_ID_LEN;
            if !keep {
                warn!("Dropping overlong key identifier for {:?}", action);
            }
            keep
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update_keeps_other_actions() {
        let mut mapping = InputMapping::default();
        let before = mapping.clone();

        let changed = mapping.merge(InputMappingUpdate::default().with_keys(Action::Jump, ["Space"]));
        assert_eq!(changed, 1);

        for action in Action::ALL {
            assert_eq!(mapping.keys_for(action), before.keys_for(action));
        }
        for action in ButtonAction::ALL {
            assert_eq!(mapping.button_for(action), before.button_for(action));
        }
    }

    #[test]
    fn test_rebind_replaces_only_named_action() {
        let mut mapping = InputMapping::default();
        mapping.merge(
            InputMappingUpdate::default()
                .with_keys(Action::MoveForward, ["KeyZ"])
                .with_button(ButtonAction::Jump, GamepadButton::ButtonY),
        );
        assert_eq!(mapping.keys_for(Action::MoveForward), ["KeyZ".to_string()]);
        assert_eq!(mapping.keys_for(Action::MoveBackward), ["KeyS".to_string(), "ArrowDown".to_string()]);
        assert_eq!(mapping.button_for(ButtonAction::Jump), GamepadButton::ButtonY);
        assert_eq!(mapping.button_for(ButtonAction::Action), GamepadButton::ButtonB);
    }

    #[test]
    fn test_key_lists_are_sanitized() {
        let mut mapping = InputMapping::default();
        let long = "K".repeat(MAX_KEY_ID_LEN);
        mapping.merge(InputMappingUpdate::default().with_keys(
            Action::Action,
            ["A", "B", long.as_str(), "C", "D", "E", "F"],
        ));
        // Truncated to five entries, then the overlong id dropped
        assert_eq!(mapping.keys_for(Action::Action), ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_unknown_button_names() {
        assert_eq!(GamepadButton::from_name("buttonY"), GamepadButton::ButtonY);
        assert_eq!(GamepadButton::from_name("turboButton"), GamepadButton::Unknown);
        for button in [GamepadButton::DpadLeft, GamepadButton::RightThumbstickButton] {
            assert_eq!(GamepadButton::from_name(button.name()), button);
        }
    }

    #[test]
    fn test_update_from_json() {
        let update: InputMappingUpdate = serde_json::from_str(
            r#"{ "jump": ["Space", "KeyJ"], "gamepadButtons": { "cancel": "dpadDown", "action": "mystery" } }"#,
        )
        .unwrap();
        assert_eq!(update.jump, Some(vec!["Space".to_string(), "KeyJ".to_string()]));
        assert!(update.move_left.is_none());
        assert_eq!(update.gamepad_buttons[&ButtonAction::Cancel], GamepadButton::DpadDown);
        assert_eq!(update.gamepad_buttons[&ButtonAction::Action], GamepadButton::Unknown);
        assert!(InputMappingUpdate::default().is_empty());
        assert!(!update.is_empty());
    }
}
