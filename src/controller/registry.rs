//! Controller registry
//!
//! Enumerates connected controllers from a [`ControllerSource`] and owns the
//! single selected-controller index. The index is a plain atomic scalar:
//! concurrent selections resolve last-writer-wins, and a rejected selection
//! never touches it.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{GamepadConnected, GamepadDisconnected};
use crate::input::RawGamepadState;

const UNKNOWN_CONTROLLER: &str = "Unknown Controller";

/// A controller as the platform reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeController {
    /// Platform identity, stable for the lifetime of the connection
    pub uid: u64,
    pub name: Option<String>,
    /// Last player slot the platform assigned, if any
    pub player_slot: Option<u32>,
    pub has_extended_gamepad: bool,
    pub has_micro_gamepad: bool,
}

impl NativeController {
    pub fn display_id(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_CONTROLLER.to_string())
    }
}

/// Raw controller source implemented once per platform backend
pub trait ControllerSource: Send + Sync + 'static {
    /// Live controller list in platform order
    fn controllers(&self) -> Result<Vec<NativeController>>;

    /// Raw state of the controller at `index`, `None` if there is none
    fn gamepad_state(&self, index: usize) -> Result<Option<RawGamepadState>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerInfo {
    pub index: usize,
    pub id: String,
    pub is_selected: bool,
    pub has_extended_gamepad: bool,
    pub has_micro_gamepad: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedControllers {
    pub controllers: Vec<ControllerInfo>,
    pub selected_index: usize,
}

/// Why a selection request was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionFailure {
    #[error("No controllers connected")]
    NoControllers,

    #[error("Controller index {index} out of range. Available: 0-{max}")]
    OutOfRange { index: i64, max: usize },
}

/// Reported result of [`ControllerRegistry::select`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub failure: Option<SelectionFailure>,
}

impl SelectionOutcome {
    fn selected(index: usize, controller_id: String) -> Self {
        Self {
            success: true,
            selected_index: Some(index),
            controller_id: Some(controller_id),
            error: None,
            failure: None,
        }
    }

    fn rejected(failure: SelectionFailure) -> Self {
        Self {
            success: false,
            selected_index: None,
            controller_id: None,
            error: Some(failure.to_string()),
            failure: Some(failure),
        }
    }
}

pub struct ControllerRegistry<S: ControllerSource> {
    source: Arc<S>,
    selected: AtomicUsize,
}

impl<S: ControllerSource> ControllerRegistry<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            selected: AtomicUsize::new(0),
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected.load(Ordering::Acquire)
    }

    pub fn enumerate(&self) -> Result<Vec<ControllerInfo>> {
        let selected = self.selected_index();
        let controllers = self
            .source
            .controllers()?
            .into_iter()
            .enumerate()
            .map(|(index, controller)| ControllerInfo {
                index,
                id: controller.display_id(),
                is_selected: index == selected,
                has_extended_gamepad: controller.has_extended_gamepad,
                has_micro_gamepad: controller.has_micro_gamepad,
            })
            .collect();
        Ok(controllers)
    }

    pub fn connected(&self) -> Result<ConnectedControllers> {
        Ok(ConnectedControllers {
            controllers: self.enumerate()?,
            selected_index: self.selected_index(),
        })
    }

    /// Selects the controller at `index` if it exists
    ///
    /// Only a platform fault is an `Err`; an invalid index is a rejected outcome.
    pub fn select(&self, index: i64) -> Result<SelectionOutcome> {
        let controllers = self.source.controllers()?;

        if controllers.is_empty() {
            warn!("Rejecting controller selection {}: none connected", index);
            return Ok(SelectionOutcome::rejected(SelectionFailure::NoControllers));
        }

        match usize::try_from(index).ok().and_then(|i| controllers.get(i).map(|c| (i, c))) {
            Some((i, controller)) => {
                self.selected.store(i, Ordering::Release);
                info!("Selected controller {} ({})", i, controller.display_id());
                Ok(SelectionOutcome::selected(i, controller.display_id()))
            }
            None => {
                let failure = SelectionFailure::OutOfRange {
                    index,
                    max: controllers.len() - 1,
                };
                warn!("Rejecting controller selection: {}", failure);
                Ok(SelectionOutcome::rejected(failure))
            }
        }
    }

    /// Raw state of the selected controller, `None` if the selection is stale
    pub fn selected_state(&self) -> Result<Option<RawGamepadState>> {
        self.source.gamepad_state(self.selected_index())
    }

    /// Payload for a connect notification
    ///
    /// The index is the controller's position in the live list at the time of
    /// the call; a concurrent disconnect may shift it.
    pub fn connected_event(&self, uid: u64) -> Result<GamepadConnected> {
        let controllers = self.source.controllers()?;
        let found = controllers.iter().enumerate().find(|(_, c)| c.uid == uid);

        let event = match found {
            Some((index, controller)) => GamepadConnected {
                index,
                id: controller.display_id(),
            },
            None => {
                debug!("Connected controller {} already gone from the live list", uid);
                GamepadConnected {
                    index: 0,
                    id: UNKNOWN_CONTROLLER.to_string(),
                }
            }
        };
        Ok(event)
    }

    /// Payload for a disconnect notification
    ///
    /// The controller has already left the live list, so the index is its last
    /// player slot (0 if it never had one), not a registry position.
    pub fn disconnected_event(&self, controller: &NativeController) -> GamepadDisconnected {
        GamepadDisconnected {
            index: controller.player_slot.map(|s| s as usize).unwrap_or(0),
        }
    }
}
