//! Adapter contract
//!
//! [`PlatformAdapter`] is the whole surface application code sees. Every
//! backend gets the same implementation, [`Strata`], which is generic over a
//! [`PlatformBackend`](crate::platform::PlatformBackend); push events and pull
//! queries go through the same detector, normalizer and registry, so the two
//! paths never disagree.

pub mod hints;
pub mod strata;

pub use hints::ControlHints;
pub use strata::Strata;

use crate::controller::{ConnectedControllers, SelectionOutcome};
use crate::device::{DeviceInfo, DeviceProfile, PerformanceMode, SafeAreaInsets};
use crate::error::Result;
use crate::events::{EventKind, ListenerHandle, StrataEvent};
use crate::haptics::HapticsRequest;
use crate::input::{InputMapping, InputMappingUpdate, InputSnapshot};

pub type EventCallback = Box<dyn Fn(&StrataEvent) + Send + Sync + 'static>;

pub trait PlatformAdapter: Send + Sync {
    /// Fresh profile built from a full read of the platform signals
    fn get_device_profile(&self) -> Result<DeviceProfile>;

    fn get_input_snapshot(&self) -> Result<InputSnapshot>;

    /// Merges `update` into the current mapping
    fn set_input_mapping(&self, update: InputMappingUpdate);

    fn get_input_mapping(&self) -> InputMapping;

    fn get_control_hints(&self) -> Result<ControlHints>;

    /// Returns once the effect is submitted to the UI thread
    fn trigger_haptics(&self, request: &HapticsRequest) -> Result<()>;

    /// Older name for [`trigger_haptics`](Self::trigger_haptics)
    fn haptics(&self, request: &HapticsRequest) -> Result<()> {
        self.trigger_haptics(request)
    }

    fn vibrate(&self, duration_ms: Option<u64>) -> Result<()>;

    /// An invalid index is a rejected outcome, never an `Err`
    fn select_controller(&self, index: i64) -> Result<SelectionOutcome>;

    fn get_connected_controllers(&self) -> Result<ConnectedControllers>;

    fn add_listener(&self, kind: EventKind, callback: EventCallback) -> ListenerHandle;

    fn remove_all_listeners(&self);

    fn get_safe_area_insets(&self) -> Result<SafeAreaInsets>;

    fn get_device_info(&self) -> Result<DeviceInfo>;

    /// Locks to `"portrait"`, `"landscape"` (suffixes allowed) or unlocks with
    /// `"any"`. Unrecognised values are ignored. Returns once the lock is
    /// queued on the UI thread.
    fn set_screen_orientation(&self, orientation: &str) -> Result<()>;

    fn get_performance_mode(&self) -> Result<PerformanceMode>;
}
