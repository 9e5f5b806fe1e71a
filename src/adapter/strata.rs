use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ControlHints, EventCallback, PlatformAdapter};
use crate::controller::{
    ConnectedControllers, ControllerChange, ControllerRegistry, NativeController, SelectionOutcome,
};
use crate::device::{
    DeviceInfo, DeviceProfile, DeviceProfileDetector, OrientationLock, PerformanceMode,
    SafeAreaInsets,
};
use crate::error::Result;
use crate::events::{EventChannel, EventKind, ListenerHandle, StrataEvent};
use crate::executor::UiExecutor;
use crate::haptics::{HapticsRequest, HapticsResolver};
use crate::input::{InputMapping, InputMappingUpdate, InputNormalizer, InputSnapshot, Vector2};
use crate::platform::PlatformBackend;
use crate::touch::TouchTracker;

/// Shared adapter core, one per backend instance
///
/// The `handle_*` methods are the backend's entry points for native
/// notifications. Listeners run on the thread that calls them.
pub struct Strata<P: PlatformBackend> {
    backend: Arc<P>,
    detector: DeviceProfileDetector<P>,
    normalizer: InputNormalizer,
    registry: ControllerRegistry<P>,
    touches: TouchTracker,
    haptics: HapticsResolver<P>,
    events: EventChannel,
}

impl<P: PlatformBackend> Strata<P> {
    pub fn new(backend: Arc<P>, ui: UiExecutor) -> Self {
        info!("Creating Strata core for {:?}", backend.platform());
        Self {
            detector: DeviceProfileDetector::new(backend.clone(), ui.clone()),
            normalizer: InputNormalizer::default(),
            registry: ControllerRegistry::new(backend.clone()),
            touches: TouchTracker::new(),
            haptics: HapticsResolver::new(backend.clone(), ui),
            events: EventChannel::new(),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<P> {
        &self.backend
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    pub fn touches(&self) -> &TouchTracker {
        &self.touches
    }

    fn publish_device_change(&self) -> Result<()> {
        let profile = self.detector.detect()?;
        self.events.emit(StrataEvent::DeviceChange(profile));
        Ok(())
    }

    /// Publishes a fresh snapshot to `inputChange` listeners, if there are any
    pub fn publish_input(&self) -> Result<()> {
        if !self.events.has_listeners(EventKind::InputChange) {
            return Ok(());
        }
        let snapshot = self.get_input_snapshot()?;
        self.events.emit(StrataEvent::InputChange(snapshot));
        Ok(())
    }

    pub fn handle_controller_connected(&self, uid: u64) -> Result<()> {
        let payload = self.registry.connected_event(uid)?;
        info!("Gamepad connected at index {}: {}", payload.index, payload.id);
        self.events.emit(StrataEvent::GamepadConnected(payload));
        self.publish_device_change()
    }

    pub fn handle_controller_disconnected(&self, controller: &NativeController) -> Result<()> {
        let payload = self.registry.disconnected_event(controller);
        info!("Gamepad disconnected from slot {}", payload.index);
        self.events.emit(StrataEvent::GamepadDisconnected(payload));
        self.publish_device_change()
    }

    pub fn handle_controller_change(&self, change: ControllerChange) -> Result<()> {
        match change {
            ControllerChange::Connected(uid) => self.handle_controller_connected(uid),
            ControllerChange::Disconnected(controller) => {
                self.handle_controller_disconnected(&controller)
            }
        }
    }

    pub fn handle_orientation_changed(&self) -> Result<()> {
        debug!("Orientation changed");
        self.publish_device_change()
    }

    // Tracker lock is released before anything is published

    pub fn handle_touch_began(&self, id: i64, position: Vector2) -> Result<()> {
        self.touches.begin(id, position);
        self.publish_input()
    }

    pub fn handle_touch_moved(&self, id: i64, position: Vector2) -> Result<()> {
        if self.touches.move_to(id, position) {
            self.publish_input()?;
        }
        Ok(())
    }

    pub fn handle_touch_ended(&self, id: i64) -> Result<()> {
        self.touches.end(id);
        self.publish_input()
    }

    pub fn handle_touch_cancelled(&self, id: i64) -> Result<()> {
        self.touches.cancel(id);
        self.publish_input()
    }

    pub fn handle_touches_cancelled(&self) -> Result<()> {
        self.touches.cancel_all();
        self.publish_input()
    }
}

impl<P: PlatformBackend> PlatformAdapter for Strata<P> {
    fn get_device_profile(&self) -> Result<DeviceProfile> {
        self.detector.detect()
    }

    fn get_input_snapshot(&self) -> Result<InputSnapshot> {
        let raw = self.registry.selected_state()?;
        let touches = self.touches.snapshot();
        Ok(self.normalizer.normalize(raw.as_ref(), touches))
    }

    fn set_input_mapping(&self, update: InputMappingUpdate) {
        self.normalizer.set_mapping(update);
    }

    fn get_input_mapping(&self) -> InputMapping {
        self.normalizer.mapping()
    }

    fn get_control_hints(&self) -> Result<ControlHints> {
        Ok(ControlHints::for_mode(self.detector.input_mode()?))
    }

    fn trigger_haptics(&self, request: &HapticsRequest) -> Result<()> {
        self.haptics.trigger(request)
    }

    fn vibrate(&self, duration_ms: Option<u64>) -> Result<()> {
        self.haptics.vibrate(duration_ms)
    }

    fn select_controller(&self, index: i64) -> Result<SelectionOutcome> {
        self.registry.select(index)
    }

    fn get_connected_controllers(&self) -> Result<ConnectedControllers> {
        self.registry.connected()
    }

    fn add_listener(&self, kind: EventKind, callback: EventCallback) -> ListenerHandle {
        self.events.add_listener(kind, callback)
    }

    fn remove_all_listeners(&self) {
        self.events.clear();
    }

    fn get_safe_area_insets(&self) -> Result<SafeAreaInsets> {
        self.detector.safe_area_insets()
    }

    fn get_device_info(&self) -> Result<DeviceInfo> {
        self.detector.device_info()
    }

    fn set_screen_orientation(&self, orientation: &str) -> Result<()> {
        match OrientationLock::from_request(orientation) {
            Some(lock) => self.detector.lock_orientation(lock),
            None => {
                warn!("Ignoring unknown orientation '{}'", orientation);
                Ok(())
            }
        }
    }

    fn get_performance_mode(&self) -> Result<PerformanceMode> {
        self.detector.performance_mode()
    }
}
