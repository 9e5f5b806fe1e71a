//! Event channel
//!
//! Producers (profile detection, controller registry, touch tracking) publish
//! [`StrataEvent`]s; consumers subscribe per [`EventKind`]. Delivery is
//! synchronous on the publishing thread, in registration order, with no
//! buffering: a listener added after an event fired never sees it.
//!
//! The listener list is copied out before callbacks run, so a callback may
//! add or remove listeners (including itself) without deadlocking. A listener
//! removed mid-delivery is skipped for the rest of that event.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::device::DeviceProfile;
use crate::input::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DeviceChange,
    InputChange,
    GamepadConnected,
    GamepadDisconnected,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::DeviceChange,
        EventKind::InputChange,
        EventKind::GamepadConnected,
        EventKind::GamepadDisconnected,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::DeviceChange => "deviceChange",
            EventKind::InputChange => "inputChange",
            EventKind::GamepadConnected => "gamepadConnected",
            EventKind::GamepadDisconnected => "gamepadDisconnected",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event name: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventKind {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadConnected {
    pub index: usize,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadDisconnected {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrataEvent {
    DeviceChange(DeviceProfile),
    InputChange(InputSnapshot),
    GamepadConnected(GamepadConnected),
    GamepadDisconnected(GamepadDisconnected),
}

impl StrataEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StrataEvent::DeviceChange(_) => EventKind::DeviceChange,
            StrataEvent::InputChange(_) => EventKind::InputChange,
            StrataEvent::GamepadConnected(_) => EventKind::GamepadConnected,
            StrataEvent::GamepadDisconnected(_) => EventKind::GamepadDisconnected,
        }
    }
}

type Listener = Arc<dyn Fn(&StrataEvent) + Send + Sync>;

struct Entry {
    id: u64,
    kind: EventKind,
    // Cleared on removal, checked right before each call
    alive: Arc<AtomicBool>,
    callback: Listener,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    listeners: Vec<Entry>,
}

/// Cloneable publish/subscribe hub for the four event kinds
#[derive(Clone, Default)]
pub struct EventChannel {
    table: Arc<Mutex<ListenerTable>>,
}

/// Disposer returned by [`EventChannel::add_listener`]
///
/// Dropping the handle keeps the listener registered; call
/// [`remove`](ListenerHandle::remove) to unsubscribe.
pub struct ListenerHandle {
    id: u64,
    kind: EventKind,
    table: Weak<Mutex<ListenerTable>>,
    alive: Arc<AtomicBool>,
}

impl ListenerHandle {
    /// Unregisters exactly this listener; later calls do nothing
    pub fn remove(&self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(table) = self.table.upgrade() {
            table.lock().listeners.retain(|entry| entry.id != self.id);
            debug!("Removed {} listener #{}", self.kind, self.id);
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("removed", &!self.alive.load(Ordering::Relaxed))
            .finish()
    }
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<F>(&self, kind: EventKind, callback: F) -> ListenerHandle
    where
        F: Fn(&StrataEvent) + Send + Sync + 'static,
    {
        let mut table = self.table.lock();
        let id = table.next_id;
        table.next_id += 1;
        let alive = Arc::new(AtomicBool::new(true));
        table.listeners.push(Entry {
            id,
            kind,
            alive: alive.clone(),
            callback: Arc::new(callback),
        });
        debug!("Registered {} listener #{}", kind, id);

        ListenerHandle {
            id,
            kind,
            table: Arc::downgrade(&self.table),
            alive,
        }
    }

    pub fn on_device_change<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&DeviceProfile) + Send + Sync + 'static,
    {
        self.add_listener(EventKind::DeviceChange, move |event| {
            if let StrataEvent::DeviceChange(profile) = event {
                callback(profile);
            }
        })
    }

    pub fn on_input_change<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&InputSnapshot) + Send + Sync + 'static,
    {
        self.add_listener(EventKind::InputChange, move |event| {
            if let StrataEvent::InputChange(snapshot) = event {
                callback(snapshot);
            }
        })
    }

    pub fn on_gamepad_connected<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&GamepadConnected) + Send + Sync + 'static,
    {
        self.add_listener(EventKind::GamepadConnected, move |event| {
            if let StrataEvent::GamepadConnected(info) = event {
                callback(info);
            }
        })
    }

    pub fn on_gamepad_disconnected<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&GamepadDisconnected) + Send + Sync + 'static,
    {
        self.add_listener(EventKind::GamepadDisconnected, move |event| {
            if let StrataEvent::GamepadDisconnected(info) = event {
                callback(info);
            }
        })
    }

    /// Delivers `event` to every current listener of its kind, returns how many ran
    pub fn emit(&self, event: StrataEvent) -> usize {
        let kind = event.kind();
        let targets: Vec<(Arc<AtomicBool>, Listener)> = self
            .table
            .lock()
            .listeners
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| (entry.alive.clone(), entry.callback.clone()))
            .collect();

        let mut delivered = 0;
        for (alive, listener) in &targets {
            if alive.load(Ordering::Acquire) {
                listener(&event);
                delivered += 1;
            }
        }
        debug!("Delivered {} to {} listeners", kind, delivered);
        delivered
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.table
            .lock()
            .listeners
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.listener_count(kind) > 0
    }

    /// Drops every listener of every kind; outstanding handles become no-ops
    pub fn clear(&self) {
        let removed = {
            let mut table = self.table.lock();
            for entry in &table.listeners {
                entry.alive.store(false, Ordering::Release);
            }
            let count = table.listeners.len();
            table.listeners.clear();
            count
        };
        debug!("Removed all {} listeners", removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(index: usize) -> StrataEvent {
        StrataEvent::GamepadConnected(GamepadConnected {
            index,
            id: "Pad".to_string(),
        })
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let channel = EventChannel::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let log = log.clone();
            channel.add_listener(EventKind::GamepadConnected, move |_| log.lock().push(n));
        }
        assert_eq!(channel.emit(connected(0)), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_kinds_are_independent() {
        let channel = EventChannel::new();
        let hits = Arc::new(Mutex::new(0));
        let h = hits.clone();
        channel.on_gamepad_disconnected(move |info| *h.lock() += info.index + 1);
        assert_eq!(channel.emit(connected(0)), 0);
        channel.emit(StrataEvent::GamepadDisconnected(GamepadDisconnected { index: 4 }));
        assert_eq!(*hits.lock(), 5);
    }

    #[test]
    fn test_remove_is_exact_and_idempotent() {
        let channel = EventChannel::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let l1 = log.clone();
        let first = channel.add_listener(EventKind::GamepadConnected, move |_| l1.lock().push("first"));
        let l2 = log.clone();
        let _second = channel.add_listener(EventKind::GamepadConnected, move |_| l2.lock().push("second"));

        first.remove();
        first.remove();
        assert_eq!(channel.listener_count(EventKind::GamepadConnected), 1);

        channel.emit(connected(0));
        assert_eq!(*log.lock(), vec!["second"]);
    }

    #[test]
    fn test_no_retroactive_delivery() {
        let channel = EventChannel::new();
        channel.emit(connected(0));
        let hits = Arc::new(Mutex::new(0));
        let h = hits.clone();
        channel.on_gamepad_connected(move |_| *h.lock() += 1);
        assert_eq!(*hits.lock(), 0);
        channel.emit(connected(1));
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_listener_can_remove_itself() {
        let channel = EventChannel::new();
        let slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));
        let s = slot.clone();
        let handle = channel.add_listener(EventKind::GamepadConnected, move |_| {
            if let Some(handle) = s.lock().as_ref() {
                handle.remove();
            }
        });
        *slot.lock() = Some(handle);

        channel.emit(connected(0));
        assert_eq!(channel.listener_count(EventKind::GamepadConnected), 0);
    }

    #[test]
    fn test_listener_removed_mid_delivery_is_skipped() {
        let channel = EventChannel::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let later: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));

        let (c, l) = (calls.clone(), later.clone());
        channel.add_listener(EventKind::GamepadConnected, move |_| {
            c.lock().push("first");
            if let Some(handle) = l.lock().as_ref() {
                handle.remove();
            }
        });
        let c = calls.clone();
        let handle = channel.add_listener(EventKind::GamepadConnected, move |_| c.lock().push("second"));
        *later.lock() = Some(handle);

        assert_eq!(channel.emit(connected(0)), 1);
        assert_eq!(*calls.lock(), vec!["first"]);
        assert_eq!(channel.listener_count(EventKind::GamepadConnected), 1);
    }

    #[test]
    fn test_clear_during_delivery_stops_it() {
        let channel = EventChannel::new();
        let calls = Arc::new(Mutex::new(0));
        let inner = channel.clone();
        channel.on_gamepad_connected(move |_| inner.clear());
        let c = calls.clone();
        channel.on_gamepad_connected(move |_| *c.lock() += 1);

        assert_eq!(channel.emit(connected(0)), 1);
        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn test_remove_after_channel_dropped() {
        let channel = EventChannel::new();
        let handle = channel.on_input_change(|_| {});
        drop(channel);
        handle.remove();
    }

    #[test]
    fn test_clear_then_stale_remove() {
        let channel = EventChannel::new();
        let handle = channel.on_device_change(|_| {});
        channel.on_input_change(|_| {});
        channel.clear();
        assert!(!channel.has_listeners(EventKind::DeviceChange));
        assert!(!channel.has_listeners(EventKind::InputChange));
        handle.remove();
        let _kept = channel.on_device_change(|_| {});
        assert_eq!(channel.listener_count(EventKind::DeviceChange), 1);
    }

    #[test]
    fn test_event_names() {
        for kind in EventKind::ALL {
            assert_eq!(kind.name().parse::<EventKind>().unwrap(), kind);
        }
        assert!("inputchange".parse::<EventKind>().is_err());
    }
}
