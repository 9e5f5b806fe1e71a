//! Platform backends
//!
//! A backend is anything that is at once a [`DeviceSource`], a
//! [`ControllerSource`] and a [`HapticsSink`]. Two ship with the crate:
//!
//! - [`DesktopPlatform`]: gilrs controllers and rumble, host-supplied display metrics
//! - [`SimulatedPlatform`]: scriptable in-memory handheld

pub mod desktop;
pub mod simulated;

pub use desktop::DesktopPlatform;
pub use simulated::SimulatedPlatform;

use crate::controller::ControllerSource;
use crate::device::DeviceSource;
use crate::haptics::HapticsSink;

pub trait PlatformBackend: DeviceSource + ControllerSource + HapticsSink {}

impl<T> PlatformBackend for T where T: DeviceSource + ControllerSource + HapticsSink {}
