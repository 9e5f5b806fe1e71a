//! Desktop backend
//!
//! Controllers come from the gilrs [`CollectorHandle`] through the shared pad
//! cache. A desktop has no orientation sensor and no touch screen; window
//! metrics are whatever the host last told us.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::DisplayConfig;
use crate::controller::{
    CollectorHandle, CollectorSettings, ControllerChange, ControllerSource, NativeController,
    RumbleCommand, SharedPads,
};
use crate::device::{
    DeviceIdiom, DeviceSignals, DeviceSource, InputMode, OrientationLock, Platform,
    SafeAreaInsets, ScreenMetrics,
};
use crate::error::{Result, StrataError};
use crate::haptics::{HapticCapabilities, HapticEffect, HapticsSink};
use crate::input::RawGamepadState;

#[derive(Debug, Clone, Copy, PartialEq)]
struct DisplayState {
    screen: ScreenMetrics,
    safe_area: SafeAreaInsets,
}

pub struct DesktopPlatform {
    platform: Platform,
    pads: SharedPads,
    display: RwLock<DisplayState>,
    rumble_sender: mpsc::UnboundedSender<RumbleCommand>,
    // Stops the gilrs thread when the platform is dropped
    _collector: Option<CollectorHandle>,
}

impl DesktopPlatform {
    /// Starts the gilrs collector; hot-plug changes arrive on the returned receiver
    pub fn start(
        display: &DisplayConfig,
        settings: CollectorSettings,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ControllerChange>)> {
        let pads: SharedPads = Arc::default();
        let (change_sender, change_receiver) = mpsc::unbounded_channel();
        let (rumble_sender, rumble_receiver) = mpsc::unbounded_channel();

        let collector = CollectorHandle::spawn(settings, pads.clone(), change_sender, rumble_receiver)
            .map_err(|e| StrataError::Platform(e.to_string()))?;
        info!("Desktop platform started");

        let platform = Self::from_parts(display, pads, rumble_sender, Some(collector));
        Ok((platform, change_receiver))
    }

    /// Backend over an externally fed pad cache and rumble channel
    pub fn from_parts(
        display: &DisplayConfig,
        pads: SharedPads,
        rumble_sender: mpsc::UnboundedSender<RumbleCommand>,
        collector: Option<CollectorHandle>,
    ) -> Self {
        Self {
            platform: Platform::current(),
            pads,
            display: RwLock::new(DisplayState {
                screen: ScreenMetrics {
                    width: display.width,
                    height: display.height,
                    pixel_ratio: display.pixel_ratio,
                },
                safe_area: display.safe_area,
            }),
            rumble_sender,
            _collector: collector,
        }
    }

    /// Records new window metrics, e.g. after a resize or a monitor change
    pub fn set_display(&self, screen: ScreenMetrics, safe_area: SafeAreaInsets) {
        debug!("Display set to {}x{}@{}", screen.width, screen.height, screen.pixel_ratio);
        *self.display.write() = DisplayState { screen, safe_area };
    }

    fn has_controllers(&self) -> bool {
        !self.pads.read().is_empty()
    }
}

impl DeviceSource for DesktopPlatform {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn signals(&self) -> Result<DeviceSignals> {
        let display = *self.display.read();
        Ok(DeviceSignals {
            idiom: DeviceIdiom::Desktop,
            manufacturer: String::new(),
            model: String::new(),
            os_version: String::new(),
            has_touch: false,
            has_pointer: true,
            has_gamepad: self.has_controllers(),
            screen: display.screen,
            orientation: None,
        })
    }

    fn key_window_insets(&self) -> Result<Option<SafeAreaInsets>> {
        Ok(Some(self.display.read().safe_area))
    }

    fn classify_input_mode(&self, signals: &DeviceSignals) -> Option<InputMode> {
        Some(if signals.has_gamepad {
            InputMode::Gamepad
        } else {
            InputMode::Keyboard
        })
    }

    // Windows follow the window manager, not the device
    fn lock_orientation(&self, lock: OrientationLock) -> Result<()> {
        debug!("Orientation lock {:?} has no effect on desktop", lock);
        Ok(())
    }
}

impl ControllerSource for DesktopPlatform {
    fn controllers(&self) -> Result<Vec<NativeController>> {
        Ok(self
            .pads
            .read()
            .iter()
            .map(|p| p.controller.clone())
            .collect())
    }

    fn gamepad_state(&self, index: usize) -> Result<Option<RawGamepadState>> {
        Ok(self.pads.read().get(index).map(|p| p.state.clone()))
    }
}

/// Rumble command for an effect; the strong motor takes the full amplitude range
fn rumble_command(effect: &HapticEffect) -> Option<RumbleCommand> {
    let (duration_ms, amplitude) = match effect {
        HapticEffect::OneShot {
            duration_ms,
            amplitude,
        } => (*duration_ms, *amplitude),
        HapticEffect::Impact(intensity) => (25, intensity.amplitude()),
        HapticEffect::Waveform(pattern) => (*pattern.first()?, 150),
    };
    if duration_ms == 0 {
        return None;
    }
    Some(RumbleCommand {
        duration_ms,
        magnitude: amplitude as u16 * 257,
    })
}

impl HapticsSink for DesktopPlatform {
    fn capabilities(&self) -> HapticCapabilities {
        if self.pads.read().iter().any(|p| p.ff_supported) {
            HapticCapabilities::TIMED
        } else {
            HapticCapabilities::NONE
        }
    }

    fn play(&self, effect: HapticEffect) -> Result<()> {
        let Some(command) = rumble_command(&effect) else {
            debug!("Nothing to play for {:?}", effect);
            return Ok(());
        };
        self.rumble_sender.send(command).map_err(|_| {
            warn!("Rumble dropped, collector is not running");
            StrataError::Platform("Controller collector is not running".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::PadRecord;
    use crate::haptics::{resolve, HapticIntensity, HapticsRequest};

    fn pad(uid: u64, ff_supported: bool) -> PadRecord {
        PadRecord {
            controller: NativeController {
                uid,
                name: Some(format!("Pad {}", uid)),
                player_slot: Some(0),
                has_extended_gamepad: true,
                has_micro_gamepad: false,
            },
            state: RawGamepadState::default(),
            ff_supported,
        }
    }

    fn desktop() -> (DesktopPlatform, mpsc::UnboundedReceiver<RumbleCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let platform = DesktopPlatform::from_parts(&DisplayConfig::default(), Arc::default(), tx, None);
        (platform, rx)
    }

    #[test]
    fn test_keyboard_until_a_controller_appears() {
        let (platform, _rx) = desktop();
        let signals = platform.signals().unwrap();
        assert_eq!(platform.classify_input_mode(&signals), Some(InputMode::Keyboard));
        assert!(signals.has_pointer);
        assert!(!signals.has_touch);

        platform.pads.write().push(pad(1, false));
        let signals = platform.signals().unwrap();
        assert!(signals.has_gamepad);
        assert_eq!(platform.classify_input_mode(&signals), Some(InputMode::Gamepad));
    }

    #[test]
    fn test_set_display() {
        let (platform, _rx) = desktop();
        platform.set_display(
            ScreenMetrics {
                width: 800.0,
                height: 600.0,
                pixel_ratio: 2.0,
            },
            SafeAreaInsets::new(0.0, 0.0, 30.0, 0.0),
        );
        assert_eq!(platform.signals().unwrap().screen.width, 800.0);
        assert_eq!(platform.key_window_insets().unwrap().unwrap().bottom, 30.0);
    }

    #[test]
    fn test_no_force_feedback_means_no_haptics() {
        let (platform, _rx) = desktop();
        platform.pads.write().push(pad(1, false));
        assert_eq!(platform.capabilities(), HapticCapabilities::NONE);
        platform.pads.write().push(pad(2, true));
        assert_eq!(platform.capabilities(), HapticCapabilities::TIMED);
    }

    #[test]
    fn test_rumble_commands() {
        let (platform, mut rx) = desktop();
        let effect = resolve(
            &HapticsRequest::preset(HapticIntensity::Heavy),
            HapticCapabilities::TIMED,
        )
        .unwrap();
        platform.play(effect).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            RumbleCommand {
                duration_ms: 50,
                magnitude: u16::MAX
            }
        );

        platform
            .play(HapticEffect::OneShot {
                duration_ms: 0,
                amplitude: 200,
            })
            .unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_rumble_without_collector_is_a_platform_error() {
        let (platform, rx) = desktop();
        drop(rx);
        assert!(matches!(
            platform.play(HapticEffect::Impact(HapticIntensity::Light)),
            Err(StrataError::Platform(_))
        ));
    }

    #[test]
    fn test_desktop_ignores_orientation_locks() {
        let (platform, _rx) = desktop();
        assert!(platform.lock_orientation(OrientationLock::Portrait).is_ok());
        assert!(!platform.power_save_mode().unwrap());
    }
}
