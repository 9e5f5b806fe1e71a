//! Device profile detection
//!
//! Turns raw platform signals (screen metrics, UI idiom, orientation sensor,
//! touch/pointer/gamepad availability, key window safe area) into one
//! canonical [`DeviceProfile`].

pub mod detector;
pub mod profile;

pub use detector::{
    DeviceIdiom, DeviceProfileDetector, DeviceSignals, DeviceSource, NativeOrientation,
    ScreenMetrics,
};
pub use profile::{
    DeviceInfo, DeviceProfile, DeviceType, InputMode, Orientation, OrientationLock, PerformanceMode,
    Platform, SafeAreaInsets,
};
