//! Input normalization
//!
//! Converts the selected controller's raw state plus the active touches into
//! one canonical [`InputSnapshot`]:
//!
//! ```text
//! RawGamepadState ──► deadzone / y-flip ──┐
//! InputMapping ─────► button resolution ──┼──► InputSnapshot
//! TouchTracker ─────► ordered touches ────┘
//! ```

pub mod mapping;
pub mod normalizer;
pub mod snapshot;

pub use mapping::{Action, ButtonAction, GamepadButton, InputMapping, InputMappingUpdate};
pub use normalizer::{apply_deadzone, InputNormalizer, RawGamepadState, DEADZONE};
pub use snapshot::{InputSnapshot, TouchPhase, TouchPoint, Triggers, Vector2};
