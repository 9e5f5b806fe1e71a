//! Controller subsystem
//!
//! 1. [`registry`] - enumeration and single-controller selection over any
//!    [`ControllerSource`]
//! 2. [`event_collector`] - gilrs pump feeding the desktop backend
//!
//! # Architecture
//!
//! ```text
//! gilrs ──► EventCollector ──► SharedPads ──► DesktopPlatform ──► ControllerRegistry
//!                 │
//!                 └──► ControllerChange ──► Strata (gamepadConnected / gamepadDisconnected)
//! ```

pub mod event_collector;
pub mod registry;

pub use event_collector::{
    CollectorError, CollectorHandle, CollectorSettings, ControllerChange, PadRecord,
    RumbleCommand, SharedPads,
};
pub use registry::{
    ConnectedControllers, ControllerInfo, ControllerRegistry, ControllerSource, NativeController,
    SelectionFailure, SelectionOutcome,
};
