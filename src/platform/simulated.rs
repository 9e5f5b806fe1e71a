//! In-memory backend
//!
//! Every signal a real handheld would report can be scripted from the outside.
//! Haptic effects are recorded instead of played.

use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::controller::{ControllerSource, NativeController};
use crate::device::{
    DeviceIdiom, DeviceSignals, DeviceSource, NativeOrientation, OrientationLock, Platform,
    SafeAreaInsets, ScreenMetrics,
};
use crate::error::{Result, StrataError};
use crate::haptics::{HapticCapabilities, HapticEffect, HapticsSink};
use crate::input::RawGamepadState;

#[derive(Debug, Clone)]
struct SimulatedPad {
    controller: NativeController,
    state: RawGamepadState,
}

#[derive(Debug)]
struct SimulatedDevice {
    signals: DeviceSignals,
    insets: Option<SafeAreaInsets>,
    pads: Vec<SimulatedPad>,
    haptics: HapticCapabilities,
}

pub struct SimulatedPlatform {
    platform: Platform,
    device: RwLock<SimulatedDevice>,
    played: Mutex<Vec<HapticEffect>>,
    played_signal: Condvar,
    locks: Mutex<Vec<OrientationLock>>,
    locks_signal: Condvar,
    power_save: AtomicBool,
    next_uid: AtomicU64,
    failing: AtomicBool,
}

impl SimulatedPlatform {
    pub fn new(platform: Platform, signals: DeviceSignals, haptics: HapticCapabilities) -> Self {
        Self {
            platform,
            device: RwLock::new(SimulatedDevice {
                signals,
                insets: None,
                pads: Vec::new(),
                haptics,
            }),
            played: Mutex::new(Vec::new()),
            played_signal: Condvar::new(),
            locks: Mutex::new(Vec::new()),
            locks_signal: Condvar::new(),
            power_save: AtomicBool::new(false),
            next_uid: AtomicU64::new(1),
            failing: AtomicBool::new(false),
        }
    }

    /// Portrait Android phone with a status bar inset and a vibration motor
    pub fn handheld() -> Self {
        let sim = Self::new(
            Platform::Android,
            DeviceSignals {
                idiom: DeviceIdiom::Phone,
                manufacturer: "Google".to_string(),
                model: "Pixel 8".to_string(),
                os_version: "14".to_string(),
                has_touch: true,
                has_pointer: false,
                has_gamepad: false,
                screen: ScreenMetrics {
                    width: 1080.0,
                    height: 2400.0,
                    pixel_ratio: 2.625,
                },
                orientation: Some(NativeOrientation::Portrait),
            },
            HapticCapabilities::TIMED_WITH_PATTERN,
        );
        sim.set_safe_area(Some(SafeAreaInsets::new(24.0, 0.0, 16.0, 0.0)));
        sim
    }

    /// iPad-style tablet with discrete haptic styles only
    pub fn tablet() -> Self {
        Self::new(
            Platform::Ios,
            DeviceSignals {
                idiom: DeviceIdiom::Pad,
                manufacturer: "Apple".to_string(),
                model: "iPad".to_string(),
                os_version: "17.4".to_string(),
                has_touch: true,
                has_pointer: true,
                has_gamepad: false,
                screen: ScreenMetrics {
                    width: 2048.0,
                    height: 2732.0,
                    pixel_ratio: 2.0,
                },
                orientation: Some(NativeOrientation::FaceUp),
            },
            HapticCapabilities::DISCRETE,
        )
    }

    pub fn update_signals<F: FnOnce(&mut DeviceSignals)>(&self, update: F) {
        update(&mut self.device.write().signals);
    }

    pub fn set_orientation(&self, orientation: Option<NativeOrientation>) {
        self.update_signals(|s| s.orientation = orientation);
    }

    pub fn set_screen(&self, width: f64, height: f64) {
        self.update_signals(|s| {
            s.screen.width = width;
            s.screen.height = height;
        });
    }

    /// `None` simulates having no resolvable key window
    pub fn set_safe_area(&self, insets: Option<SafeAreaInsets>) {
        self.device.write().insets = insets;
    }

    pub fn set_haptic_capabilities(&self, caps: HapticCapabilities) {
        self.device.write().haptics = caps;
    }

    /// Makes every signal read fail until switched off again
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Appends a controller to the live list and returns its record
    pub fn connect_controller(&self, name: &str, extended: bool) -> NativeController {
        let mut device = self.device.write();
        let controller = NativeController {
            uid: self.next_uid.fetch_add(1, Ordering::Relaxed),
            name: if name.is_empty() { None } else { Some(name.to_string()) },
            player_slot: Some(device.pads.len() as u32),
            has_extended_gamepad: extended,
            has_micro_gamepad: !extended,
        };
        device.pads.push(SimulatedPad {
            controller: controller.clone(),
            state: RawGamepadState::default(),
        });
        debug!("Simulated controller {} connected", controller.uid);
        controller
    }

    /// Removes a controller from the live list, returning its last record
    pub fn disconnect_controller(&self, uid: u64) -> Option<NativeController> {
        let mut device = self.device.write();
        let position = device.pads.iter().position(|p| p.controller.uid == uid)?;
        Some(device.pads.remove(position).controller)
    }

    pub fn set_gamepad_state(&self, uid: u64, state: RawGamepadState) -> bool {
        let mut device = self.device.write();
        match device.pads.iter_mut().find(|p| p.controller.uid == uid) {
            Some(pad) => {
                pad.state = state;
                true
            }
            None => false,
        }
    }

    pub fn played_haptics(&self) -> Vec<HapticEffect> {
        self.played.lock().clone()
    }

    /// Blocks until at least `count` effects were played or `timeout` passes
    pub fn wait_for_haptics(&self, count: usize, timeout: Duration) -> Vec<HapticEffect> {
        let deadline = Instant::now() + timeout;
        let mut played = self.played.lock();
        while played.len() < count {
            if self.played_signal.wait_until(&mut played, deadline).timed_out() {
                break;
            }
        }
        played.clone()
    }

    pub fn set_power_save(&self, enabled: bool) {
        self.power_save.store(enabled, Ordering::Release);
    }

    /// Every orientation lock applied so far, oldest first
    pub fn orientation_locks(&self) -> Vec<OrientationLock> {
        self.locks.lock().clone()
    }

    /// Blocks until at least `count` locks were applied or `timeout` passes
    pub fn wait_for_orientation_locks(&self, count: usize, timeout: Duration) -> Vec<OrientationLock> {
        let deadline = Instant::now() + timeout;
        let mut locks = self.locks.lock();
        while locks.len() < count {
            if self.locks_signal.wait_until(&mut locks, deadline).timed_out() {
                break;
            }
        }
        locks.clone()
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::Acquire) {
            return Err(StrataError::Platform("simulated read failure".to_string()));
        }
        Ok(())
    }
}

impl DeviceSource for SimulatedPlatform {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn signals(&self) -> Result<DeviceSignals> {
        self.check_failing()?;
        let device = self.device.read();
        let mut signals = device.signals.clone();
        signals.has_gamepad = !device.pads.is_empty();
        Ok(signals)
    }

    fn key_window_insets(&self) -> Result<Option<SafeAreaInsets>> {
        self.check_failing()?;
        Ok(self.device.read().insets)
    }

    fn power_save_mode(&self) -> Result<bool> {
        self.check_failing()?;
        Ok(self.power_save.load(Ordering::Acquire))
    }

    fn lock_orientation(&self, lock: OrientationLock) -> Result<()> {
        self.check_failing()?;
        debug!("Simulated orientation lock: {:?}", lock);
        self.locks.lock().push(lock);
        self.locks_signal.notify_all();
        Ok(())
    }
}

impl ControllerSource for SimulatedPlatform {
    fn controllers(&self) -> Result<Vec<NativeController>> {
        self.check_failing()?;
        Ok(self
            .device
            .read()
            .pads
            .iter()
            .map(|p| p.controller.clone())
            .collect())
    }

    fn gamepad_state(&self, index: usize) -> Result<Option<RawGamepadState>> {
        self.check_failing()?;
        Ok(self.device.read().pads.get(index).map(|p| p.state.clone()))
    }
}

impl HapticsSink for SimulatedPlatform {
    fn capabilities(&self) -> HapticCapabilities {
        self.device.read().haptics
    }

    fn play(&self, effect: HapticEffect) -> Result<()> {
        debug!("Simulated haptic effect: {:?}", effect);
        self.played.lock().push(effect);
        self.played_signal.notify_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamepad_flag_follows_controllers() {
        let sim = SimulatedPlatform::handheld();
        assert!(!sim.signals().unwrap().has_gamepad);
        let pad = sim.connect_controller("Pad", true);
        assert!(sim.signals().unwrap().has_gamepad);
        assert_eq!(sim.disconnect_controller(pad.uid), Some(pad));
        assert!(!sim.signals().unwrap().has_gamepad);
    }

    #[test]
    fn test_player_slots_and_uids() {
        let sim = SimulatedPlatform::tablet();
        let first = sim.connect_controller("A", true);
        let second = sim.connect_controller("", false);
        assert_ne!(first.uid, second.uid);
        assert_eq!(second.player_slot, Some(1));
        assert_eq!(second.name, None);
        assert!(second.has_micro_gamepad);
    }

    #[test]
    fn test_failing_reads() {
        let sim = SimulatedPlatform::handheld();
        sim.set_failing(true);
        assert!(matches!(sim.signals(), Err(StrataError::Platform(_))));
        assert!(sim.controllers().is_err());
        sim.set_failing(false);
        assert!(sim.controllers().unwrap().is_empty());
    }

    #[test]
    fn test_wait_for_haptics_times_out() {
        let sim = SimulatedPlatform::handheld();
        let played = sim.wait_for_haptics(1, Duration::from_millis(10));
        assert!(played.is_empty());
    }
}
