//! Derives a [`DeviceProfile`] from raw platform signals

use std::sync::Arc;
use tracing::{debug, warn};

use super::profile::{
    DeviceInfo, DeviceProfile, DeviceType, InputMode, Orientation, OrientationLock,
    PerformanceMode, Platform, SafeAreaInsets,
};
use crate::error::Result;
use crate::executor::UiExecutor;

/// UI idiom reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceIdiom {
    Phone,
    Pad,
    Desktop,
    Tv,
    Unspecified,
}

/// Physical orientation as reported by the motion sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
    Unknown,
}

/// Screen bounds in physical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMetrics {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Default for ScreenMetrics {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
        }
    }
}

/// One fresh read of everything the profile depends on, except safe area
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSignals {
    pub idiom: DeviceIdiom,
    pub manufacturer: String,
    pub model: String,
    pub os_version: String,
    pub has_touch: bool,
    pub has_pointer: bool,
    pub has_gamepad: bool,
    pub screen: ScreenMetrics,
    /// `None` when the platform has no orientation sensor
    pub orientation: Option<NativeOrientation>,
}

/// Raw device signal source implemented once per platform backend
pub trait DeviceSource: Send + Sync + 'static {
    fn platform(&self) -> Platform;

    fn signals(&self) -> Result<DeviceSignals>;

    /// Safe area of the active key window, `None` if no window is resolvable
    ///
    /// Always called on the UI-affinity thread.
    fn key_window_insets(&self) -> Result<Option<SafeAreaInsets>>;

    /// Input mode override for platforms that classify themselves
    /// (keyboard-primary desktops). `None` keeps the shared algorithm.
    fn classify_input_mode(&self, _signals: &DeviceSignals) -> Option<InputMode> {
        None
    }

    /// Whether the OS power saver is on; platforms without one report `false`
    fn power_save_mode(&self) -> Result<bool> {
        Ok(false)
    }

    /// Applies a screen orientation lock. Always called on the UI-affinity thread.
    fn lock_orientation(&self, _lock: OrientationLock) -> Result<()> {
        Ok(())
    }
}

/// Known foldable product lines, matched on lowercase manufacturer and model
pub fn is_foldable(manufacturer: &str, model: &str) -> bool {
    let manufacturer = manufacturer.to_lowercase();
    let model = model.to_lowercase();

    (manufacturer.contains("samsung") && (model.contains("fold") || model.contains("flip")))
        || (manufacturer.contains("huawei") && model.contains("mate x"))
        || (manufacturer.contains("motorola") && model.contains("razr"))
}

pub fn classify_device_type(idiom: DeviceIdiom, manufacturer: &str, model: &str) -> DeviceType {
    if is_foldable(manufacturer, model) {
        return DeviceType::Foldable;
    }
    match idiom {
        DeviceIdiom::Phone => DeviceType::Mobile,
        DeviceIdiom::Pad => DeviceType::Tablet,
        DeviceIdiom::Desktop => DeviceType::Desktop,
        DeviceIdiom::Tv | DeviceIdiom::Unspecified => DeviceType::Mobile,
    }
}

pub fn classify_input_mode(has_gamepad: bool, has_touch: bool) -> InputMode {
    match (has_gamepad, has_touch) {
        (true, true) => InputMode::Hybrid,
        (true, false) => InputMode::Gamepad,
        _ => InputMode::Touch,
    }
}

/// Sensor orientation when meaningful, screen aspect otherwise
pub fn resolve_orientation(native: Option<NativeOrientation>, screen: &ScreenMetrics) -> Orientation {
    match native {
        Some(NativeOrientation::LandscapeLeft) | Some(NativeOrientation::LandscapeRight) => {
            Orientation::Landscape
        }
        Some(NativeOrientation::Portrait) | Some(NativeOrientation::PortraitUpsideDown) => {
            Orientation::Portrait
        }
        _ => {
            if screen.width > screen.height {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            }
        }
    }
}

/// Builds device profiles from a [`DeviceSource`]
///
/// Stateless apart from its handles; safe to call concurrently with itself.
pub struct DeviceProfileDetector<S: DeviceSource> {
    source: Arc<S>,
    ui: UiExecutor,
}

impl<S: DeviceSource> Clone for DeviceProfileDetector<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            ui: self.ui.clone(),
        }
    }
}

impl<S: DeviceSource> DeviceProfileDetector<S> {
    pub fn new(source: Arc<S>, ui: UiExecutor) -> Self {
        Self { source, ui }
    }

    /// Reads the key window insets on the UI thread, zeros if there is no window
    pub fn safe_area_insets(&self) -> Result<SafeAreaInsets> {
        let source = self.source.clone();
        let insets = self.ui.run_sync(move || source.key_window_insets())??;
        Ok(insets.map(SafeAreaInsets::sanitized).unwrap_or_default())
    }

    pub fn input_mode(&self) -> Result<InputMode> {
        let signals = self.source.signals()?;
        Ok(self.input_mode_for(&signals))
    }

    fn input_mode_for(&self, signals: &DeviceSignals) -> InputMode {
        self.source
            .classify_input_mode(signals)
            .unwrap_or_else(|| classify_input_mode(signals.has_gamepad, signals.has_touch))
    }

    pub fn detect(&self) -> Result<DeviceProfile> {
        let signals = self.source.signals()?;
        let safe_area_insets = self.safe_area_insets()?;

        let device_type = classify_device_type(signals.idiom, &signals.manufacturer, &signals.model);
        let input_mode = self.input_mode_for(&signals);
        let orientation = resolve_orientation(signals.orientation, &signals.screen);

        let profile = DeviceProfile {
            device_type,
            platform: self.source.platform(),
            input_mode,
            orientation,
            has_touch: signals.has_touch,
            has_pointer: signals.has_pointer,
            has_gamepad: signals.has_gamepad,
            is_mobile: device_type == DeviceType::Mobile,
            is_tablet: device_type == DeviceType::Tablet,
            is_foldable: device_type == DeviceType::Foldable,
            is_desktop: device_type == DeviceType::Desktop,
            screen_width: signals.screen.width.max(0.0),
            screen_height: signals.screen.height.max(0.0),
            pixel_ratio: signals.screen.pixel_ratio.max(1.0),
            safe_area_insets,
        };

        debug!(
            "Detected profile: {:?}/{:?} input={:?} orientation={:?} {}x{}@{}",
            profile.device_type,
            profile.platform,
            profile.input_mode,
            profile.orientation,
            profile.screen_width,
            profile.screen_height,
            profile.pixel_ratio
        );
        Ok(profile)
    }

    pub fn performance_mode(&self) -> Result<PerformanceMode> {
        let power_save = self.source.power_save_mode()?;
        Ok(PerformanceMode {
            enabled: !power_save,
        })
    }

    /// Queues the lock on the UI thread and returns without waiting for it
    pub fn lock_orientation(&self, lock: OrientationLock) -> Result<()> {
        debug!("Requesting orientation lock {:?}", lock);
        let source = self.source.clone();
        self.ui.dispatch(move || {
            if let Err(e) = source.lock_orientation(lock) {
                warn!("Orientation lock {:?} failed: {}", lock, e);
            }
        })
    }

    pub fn device_info(&self) -> Result<DeviceInfo> {
        let signals = self.source.signals()?;
        let device_type = classify_device_type(signals.idiom, &signals.manufacturer, &signals.model);
        let optional = |s: String| if s.is_empty() { None } else { Some(s) };

        Ok(DeviceInfo {
            is_mobile: device_type != DeviceType::Desktop,
            platform: self.source.platform(),
            model: optional(signals.model),
            os_version: optional(signals.os_version),
        })
    }
}
