//! Device capability and input abstraction
//!
//! Application code asks one [`PlatformAdapter`] what device it runs on, what
//! the player is pressing and touching, and for haptic feedback. Every backend
//! answers in the same shapes:
//!
//! ```text
//! backend signals ──► DeviceProfileDetector ──► DeviceProfile ──┐
//! selected pad ─────► InputNormalizer ─────────► InputSnapshot ─┼──► EventChannel ──► listeners
//! touch callbacks ──► TouchTracker ─────────────────────────────┘
//! HapticsRequest ───► HapticsResolver ──► UiExecutor ──► backend
//! ```
//!
//! The library never installs a tracing subscriber; that is up to the host.

pub mod adapter;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod events;
pub mod executor;
pub mod haptics;
pub mod input;
pub mod platform;
pub mod touch;

pub use adapter::{ControlHints, EventCallback, PlatformAdapter, Strata};
pub use config::{ConfigError, StrataConfig};
pub use controller::{
    ConnectedControllers, ControllerChange, ControllerInfo, NativeController, SelectionFailure,
    SelectionOutcome,
};
pub use device::{
    DeviceInfo, DeviceProfile, DeviceType, InputMode, Orientation, OrientationLock,
    PerformanceMode, Platform, SafeAreaInsets,
};
pub use error::{Result, StrataError};
pub use events::{
    EventChannel, EventKind, GamepadConnected, GamepadDisconnected, ListenerHandle, StrataEvent,
};
pub use executor::{UiExecutor, UiQueue};
pub use haptics::{HapticEffect, HapticIntensity, HapticsRequest};
pub use input::{
    Action, ButtonAction, GamepadButton, InputMapping, InputMappingUpdate, InputSnapshot,
    TouchPhase, TouchPoint, Vector2,
};
pub use platform::{DesktopPlatform, PlatformBackend, SimulatedPlatform};
pub use touch::TouchTracker;
