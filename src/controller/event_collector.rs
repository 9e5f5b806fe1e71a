use chrono::{DateTime, Local};
use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Repeat, Replay, Ticks};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use parking_lot::RwLock;
use statum::{machine, state};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::registry::NativeController;
use crate::input::{GamepadButton, RawGamepadState, Vector2};

// Cached view of one connected gamepad
#[derive(Debug, Clone, PartialEq)]
pub struct PadRecord {
    pub controller: NativeController,
    pub state: RawGamepadState,
    pub ff_supported: bool,
}

// Live controller list in gilrs enumeration order, written by the collector only
pub type SharedPads = Arc<RwLock<Vec<PadRecord>>>;

// Hot-plug notification forwarded to the core
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerChange {
    Connected(u64),
    Disconnected(NativeController),
}

// Rumble request for every force-feedback capable pad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RumbleCommand {
    pub duration_ms: u64,
    pub magnitude: u16,
}

// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    pub idle_sleep: Duration,
    pub stats_interval_secs: i64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            idle_sleep: Duration::from_micros(500),
            stats_interval_secs: 30,
        }
    }
}

impl CollectorSettings {
    /// Stats period, at least one second; huge values saturate
    pub fn stats_interval(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.stats_interval_secs.max(1)).unwrap_or(chrono::Duration::MAX)
    }
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to spawn collector thread: {0}")]
    SpawnError(String),

    #[error("Failed to send controller change: {0}")]
    ChangeSendError(String),
}

// Collector lifecycle states
#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context, only touched from the collector thread
    gilrs: Gilrs,

    settings: CollectorSettings,

    // Shared pad cache read by the desktop backend
    pads: SharedPads,

    // Connect / disconnect notifications for the core
    change_sender: mpsc::UnboundedSender<ControllerChange>,

    // Rumble requests from the haptics sink
    rumble_receiver: mpsc::UnboundedReceiver<RumbleCommand>,

    // Effects stop when dropped, so they are held until their end time
    active_effects: Vec<(Effect, Instant)>,

    shutdown: Arc<AtomicBool>,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    // Rebuild the shared cache from gilrs' own state tracking
    fn refresh_pads(&self) {
        let records: Vec<PadRecord> = self
            .gilrs
            .gamepads()
            .enumerate()
            .map(|(slot, (id, gamepad))| pad_record(slot, id, &gamepad))
            .collect();
        *self.pads.write() = records;
    }
}

// Implementation for Initializing state
impl EventCollector<Initializing> {
    pub fn create(
        settings: CollectorSettings,
        pads: SharedPads,
        change_sender: mpsc::UnboundedSender<ControllerChange>,
        rumble_receiver: mpsc::UnboundedReceiver<RumbleCommand>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, CollectorError> {
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(
            gilrs,
            settings,
            pads,
            change_sender,
            rumble_receiver,
            Vec::new(),
            shutdown,
        ))
    }

    // Populate the cache with already connected pads and start collecting
    pub fn initialize(self) -> EventCollector<Collecting> {
        let count = self.gilrs.gamepads().count();
        if count == 0 {
            warn!("No gamepad connected, continuing in idle mode");
        } else {
            info!("Found {} gamepads:", count);
            for (idx, (id, gamepad)) in self.gilrs.gamepads().enumerate() {
                info!(
                    "  [{}] ID: {}, Name: {}, FF: {}",
                    idx,
                    id,
                    gamepad.name(),
                    gamepad.is_ff_supported()
                );
            }
        }
        self.refresh_pads();

        info!("Event Collector initialized, transitioning to Collecting state");
        self.transition()
    }
}

impl EventCollector<Collecting> {
    // Drain pending gilrs events, returns how many were handled
    pub fn collect_pending_events(&mut self) -> Result<usize, CollectorError> {
        let mut handled = 0;

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            handled += 1;
            match event {
                EventType::Connected => {
                    self.refresh_pads();
                    let uid = gamepad_uid(id);
                    info!("Controller connected: {} ({})", self.gilrs.gamepad(id).name(), uid);
                    self.send_change(ControllerChange::Connected(uid))?;
                }
                EventType::Disconnected => {
                    let uid = gamepad_uid(id);
                    // Last cached record still carries the slot it occupied
                    let last_known = self
                        .pads
                        .read()
                        .iter()
                        .find(|p| p.controller.uid == uid)
                        .map(|p| p.controller.clone());
                    self.refresh_pads();

                    let controller = last_known.unwrap_or(NativeController {
                        uid,
                        name: None,
                        player_slot: None,
                        has_extended_gamepad: false,
                        has_micro_gamepad: false,
                    });
                    warn!("Controller disconnected: {}", controller.display_id());
                    self.send_change(ControllerChange::Disconnected(controller))?;
                }
                EventType::ButtonPressed(button, _) | EventType::ButtonReleased(button, _) => {
                    debug!("Button {:?} on {}", button, id);
                }
                _ => {}
            }
        }

        if handled > 0 {
            self.refresh_pads();
        }
        Ok(handled)
    }

    fn send_change(&self, change: ControllerChange) -> Result<(), CollectorError> {
        self.change_sender
            .send(change)
            .map_err(|e| CollectorError::ChangeSendError(e.to_string()))
    }

    // Start queued rumble effects and release the finished ones
    fn service_rumble(&mut self) {
        let now = Instant::now();
        self.active_effects.retain(|(_, until)| *until > now);

        while let Ok(command) = self.rumble_receiver.try_recv() {
            let targets: Vec<GamepadId> = self
                .gilrs
                .gamepads()
                .filter(|(_, g)| g.is_ff_supported())
                .map(|(id, _)| id)
                .collect();
            if targets.is_empty() {
                debug!("Rumble requested but no force feedback pad connected");
                continue;
            }

            let play_for = Ticks::from_ms(command.duration_ms.min(u32::MAX as u64) as u32);
            let effect = EffectBuilder::new()
                .add_effect(BaseEffect {
                    kind: BaseEffectType::Strong {
                        magnitude: command.magnitude,
                    },
                    scheduling: Replay {
                        play_for,
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .repeat(Repeat::For(play_for))
                .gamepads(&targets)
                .finish(&mut self.gilrs);

            match effect.and_then(|effect| effect.play().map(|_| effect)) {
                Ok(effect) => {
                    debug!(
                        "Rumble {}ms at {} on {} pads",
                        command.duration_ms,
                        command.magnitude,
                        targets.len()
                    );
                    let until = now + Duration::from_millis(command.duration_ms);
                    self.active_effects.push((effect, until));
                }
                Err(e) => warn!("Failed to play rumble effect: {}", e),
            }
        }
    }

    // Run until the shutdown flag is raised or the core stops listening
    pub fn run_collection_loop(&mut self) -> Result<(), CollectorError> {
        info!("Starting Event Collector loop");

        let mut event_count = 0;
        let mut last_log_time: DateTime<Local> = Local::now();
        let log_interval = self.settings.stats_interval();

        while !self.shutdown.load(Ordering::Acquire) {
            let handled = self.collect_pending_events()?;
            event_count += handled;
            self.service_rumble();

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Event Collector stats: processed {} events in last {} seconds (avg {:.2}/sec)",
                    event_count,
                    log_interval.num_seconds(),
                    event_count as f64 / log_interval.num_seconds() as f64
                );
                event_count = 0;
                last_log_time = now;
            }

            if handled == 0 {
                thread::sleep(self.settings.idle_sleep);
            }
        }

        info!("Event Collector loop stopped");
        Ok(())
    }
}

// Owns the collector thread; dropping it stops the loop
pub struct CollectorHandle {
    shutdown: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl CollectorHandle {
    // Gilrs is created on the collector thread itself; this waits for that to succeed
    pub fn spawn(
        settings: CollectorSettings,
        pads: SharedPads,
        change_sender: mpsc::UnboundedSender<ControllerChange>,
        rumble_receiver: mpsc::UnboundedReceiver<RumbleCommand>,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = shutdown.clone();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<(), CollectorError>>(1);

        let thread = thread::Builder::new()
            .name("strata-gilrs".to_string())
            .spawn(move || {
                let collector = match EventCollector::create(
                    settings,
                    pads,
                    change_sender,
                    rumble_receiver,
                    thread_shutdown,
                ) {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let mut collecting = collector.initialize();
                let _ = ready_tx.send(Ok(()));
                if let Err(e) = collecting.run_collection_loop() {
                    error!("Collector thread terminated with error: {}", e);
                }
            })
            .map_err(|e| CollectorError::SpawnError(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(CollectorError::InitializationError(
                    "Collector thread exited during startup".to_string(),
                ))
            }
        }

        info!("Event Collector successfully started");
        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for CollectorHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Collector thread panicked");
            }
        }
    }
}

fn gamepad_uid(id: GamepadId) -> u64 {
    usize::from(id) as u64
}

fn pad_record(slot: usize, id: GamepadId, gamepad: &Gamepad<'_>) -> PadRecord {
    let has_right_stick = gamepad.axis_code(Axis::RightStickX).is_some();
    let name = gamepad.name();

    PadRecord {
        controller: NativeController {
            uid: gamepad_uid(id),
            name: if name.is_empty() { None } else { Some(name.to_string()) },
            player_slot: Some(slot as u32),
            has_extended_gamepad: has_right_stick,
            has_micro_gamepad: !has_right_stick,
        },
        state: read_state(gamepad),
        ff_supported: gamepad.is_ff_supported(),
    }
}

// Raw state, vertical axes up-positive as gilrs reports them
fn read_state(gamepad: &Gamepad<'_>) -> RawGamepadState {
    let pressed = PHYSICAL_BUTTONS
        .iter()
        .filter(|(button, _)| gamepad.is_pressed(*button))
        .map(|(_, mapped)| *mapped)
        .collect();

    RawGamepadState {
        left_stick: Vector2::new(gamepad.value(Axis::LeftStickX), gamepad.value(Axis::LeftStickY)),
        right_stick: Vector2::new(gamepad.value(Axis::RightStickX), gamepad.value(Axis::RightStickY)),
        left_trigger: trigger_value(gamepad, Button::LeftTrigger2, Axis::LeftZ),
        right_trigger: trigger_value(gamepad, Button::RightTrigger2, Axis::RightZ),
        pressed,
    }
}

// Analog trigger travel in [0, 1]; some drivers only expose it as a Z axis
fn trigger_value(gamepad: &Gamepad<'_>, button: Button, axis: Axis) -> f32 {
    match gamepad.button_data(button) {
        Some(data) => data.value().clamp(0.0, 1.0),
        None => gamepad.value(axis).clamp(0.0, 1.0),
    }
}

// gilrs uses positional names; the core uses the Xbox-style labels
const PHYSICAL_BUTTONS: [(Button, GamepadButton); 14] = [
    (Button::South, GamepadButton::ButtonA),
    (Button::East, GamepadButton::ButtonB),
    (Button::West, GamepadButton::ButtonX),
    (Button::North, GamepadButton::ButtonY),
    (Button::LeftTrigger, GamepadButton::LeftShoulder),
    (Button::RightTrigger, GamepadButton::RightShoulder),
    (Button::DPadUp, GamepadButton::DpadUp),
    (Button::DPadDown, GamepadButton::DpadDown),
    (Button::DPadLeft, GamepadButton::DpadLeft),
    (Button::DPadRight, GamepadButton::DpadRight),
    (Button::LeftThumb, GamepadButton::LeftThumbstickButton),
    (Button::RightThumb, GamepadButton::RightThumbstickButton),
    (Button::Start, GamepadButton::ButtonMenu),
    (Button::Select, GamepadButton::ButtonOptions),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_physical_buttons_are_unique() {
        let gilrs_side: HashSet<_> = PHYSICAL_BUTTONS.iter().map(|(b, _)| *b).collect();
        let core_side: HashSet<_> = PHYSICAL_BUTTONS.iter().map(|(_, m)| *m).collect();
        assert_eq!(gilrs_side.len(), PHYSICAL_BUTTONS.len());
        assert_eq!(core_side.len(), PHYSICAL_BUTTONS.len());
        assert!(!core_side.contains(&GamepadButton::Unknown));
        // Analog triggers are read as values, not as pressed buttons
        assert!(!core_side.contains(&GamepadButton::LeftTrigger));
        assert!(!core_side.contains(&GamepadButton::RightTrigger));
    }

    #[test]
    fn test_default_settings() {
        let settings = CollectorSettings::default();
        assert!(settings.idle_sleep > Duration::ZERO);
        assert!(settings.stats_interval_secs > 0);
    }

    #[test]
    fn test_stats_interval_bounds() {
        let settings = |secs| CollectorSettings {
            stats_interval_secs: secs,
            ..Default::default()
        };
        assert_eq!(settings(30).stats_interval().num_seconds(), 30);
        assert_eq!(settings(0).stats_interval().num_seconds(), 1);
        assert_eq!(settings(-5).stats_interval().num_seconds(), 1);
        assert_eq!(settings(i64::MAX).stats_interval(), chrono::Duration::MAX);
    }
}
