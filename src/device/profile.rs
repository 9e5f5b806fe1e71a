//! Canonical device profile types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Foldable,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Windows,
    Macos,
    Linux,
    Web,
}

impl Platform {
    /// Platform the binary was compiled for, `Linux` for anything unlisted
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_family = "wasm") {
            Platform::Web
        } else {
            Platform::Linux
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Touch,
    Keyboard,
    Gamepad,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Requested screen orientation lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationLock {
    Any,
    Portrait,
    Landscape,
}

impl OrientationLock {
    /// Reads a lock request such as `"portrait-primary"` or `"landscape"`
    ///
    /// Only the portrait or landscape family matters, so the `-primary` and
    /// `-secondary` suffixes collapse into it. `None` for anything else.
    pub fn from_request(orientation: &str) -> Option<Self> {
        if orientation.contains("portrait") {
            Some(OrientationLock::Portrait)
        } else if orientation.contains("landscape") {
            Some(OrientationLock::Landscape)
        } else if orientation == "any" {
            Some(OrientationLock::Any)
        } else {
            None
        }
    }
}

/// Distances from each display edge that are free of notches and system bars
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SafeAreaInsets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl SafeAreaInsets {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
        .sanitized()
    }

    /// Negative or NaN edges become 0
    pub fn sanitized(self) -> Self {
        let fix = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Self {
            top: fix(self.top),
            right: fix(self.right),
            bottom: fix(self.bottom),
            left: fix(self.left),
        }
    }
}

/// Snapshot of what the current device is and how the user drives it
///
/// Always built in one piece by
/// [`DeviceProfileDetector::detect`](super::DeviceProfileDetector::detect);
/// the `is_*` classifiers are derived from `device_type` alone, so exactly one
/// of them is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub device_type: DeviceType,
    pub platform: Platform,
    pub input_mode: InputMode,
    pub orientation: Orientation,
    pub has_touch: bool,
    pub has_pointer: bool,
    pub has_gamepad: bool,
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_foldable: bool,
    pub is_desktop: bool,
    pub screen_width: f64,
    pub screen_height: f64,
    pub pixel_ratio: f64,
    pub safe_area_insets: SafeAreaInsets,
}

/// Coarse device description for hosts that only need the basics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub is_mobile: bool,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

/// Whether the OS lets the app run at full performance
///
/// `enabled` is false while the system power saver is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMode {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insets_are_never_negative() {
        let insets = SafeAreaInsets::new(-4.0, 12.0, f64::NAN, 0.0);
        assert_eq!(insets, SafeAreaInsets::new(0.0, 12.0, 0.0, 0.0));
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = DeviceProfile {
            device_type: DeviceType::Tablet,
            platform: Platform::Ios,
            input_mode: InputMode::Hybrid,
            orientation: Orientation::Landscape,
            has_touch: true,
            has_pointer: true,
            has_gamepad: true,
            is_mobile: false,
            is_tablet: true,
            is_foldable: false,
            is_desktop: false,
            screen_width: 2048.0,
            screen_height: 1536.0,
            pixel_ratio: 2.0,
            safe_area_insets: SafeAreaInsets::default(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["deviceType"], "tablet");
        assert_eq!(json["inputMode"], "hybrid");
        assert_eq!(json["safeAreaInsets"]["top"], 0.0);
        assert_eq!(json["isTablet"], true);
    }

    #[test]
    fn test_orientation_lock_requests() {
        assert_eq!(OrientationLock::from_request("portrait"), Some(OrientationLock::Portrait));
        assert_eq!(
            OrientationLock::from_request("portrait-secondary"),
            Some(OrientationLock::Portrait)
        );
        assert_eq!(
            OrientationLock::from_request("landscape-primary"),
            Some(OrientationLock::Landscape)
        );
        assert_eq!(OrientationLock::from_request("any"), Some(OrientationLock::Any));
        assert_eq!(OrientationLock::from_request("anything"), None);
        assert_eq!(OrientationLock::from_request(""), None);
    }

    #[test]
    fn test_performance_mode_wire_shape() {
        let json = serde_json::to_string(&PerformanceMode { enabled: false }).unwrap();
        assert_eq!(json, r#"{"enabled":false}"#);
    }
}
