//! Haptics resolution
//!
//! A [`HapticsRequest`] is resolved against the [`HapticCapabilities`] of the
//! current backend into at most one [`HapticEffect`], which is then played on
//! the UI thread without the caller waiting for it.
//!
//! Resolution order: `customIntensity`, then `pattern`, then the preset
//! (`intensity`, legacy `style`/`type`, default medium). Platforms that can't
//! do what was asked get the nearest thing they can do, or nothing at all.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::executor::UiExecutor;

/// Longest single timed vibration accepted, in milliseconds
pub const MAX_DURATION_MS: i64 = 10_000;
/// Pulse length of `vibrate` when no duration is given
pub const DEFAULT_VIBRATE_MS: u64 = 100;

const LIGHT_CUTOFF: f64 = 0.33;
const MEDIUM_CUTOFF: f64 = 0.66;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticIntensity {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl HapticIntensity {
    /// Quantizes a continuous 0-1 intensity onto the three presets
    pub fn from_custom(value: f64) -> Self {
        let value = clamp_unit(value);
        if value < LIGHT_CUTOFF {
            HapticIntensity::Light
        } else if value < MEDIUM_CUTOFF {
            HapticIntensity::Medium
        } else {
            HapticIntensity::Heavy
        }
    }

    /// Vibration motor amplitude on timed-vibration platforms
    pub fn amplitude(self) -> u8 {
        match self {
            HapticIntensity::Light => 50,
            HapticIntensity::Medium => 150,
            HapticIntensity::Heavy => 255,
        }
    }
}

/// Pre-unified request fields still accepted from older callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyHapticType {
    Impact,
    Notification,
    Selection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HapticsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<HapticIntensity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_intensity: Option<f64>,
    /// Milliseconds, only used by timed-vibration platforms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    /// Alternating vibrate/pause durations in milliseconds, starting with a pulse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Vec<u64>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<LegacyHapticType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<HapticIntensity>,
}

impl HapticsRequest {
    pub fn preset(intensity: HapticIntensity) -> Self {
        Self {
            intensity: Some(intensity),
            ..Default::default()
        }
    }

    pub fn custom(value: f64) -> Self {
        Self {
            custom_intensity: Some(value),
            ..Default::default()
        }
    }

    pub fn pattern(pattern: Vec<u64>) -> Self {
        Self {
            pattern: Some(pattern),
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    fn active_pattern(&self) -> Option<&[u64]> {
        self.pattern.as_deref().filter(|p| !p.is_empty())
    }

    /// Intensity preset this request asks for, ignoring any pattern
    pub fn effective_intensity(&self) -> HapticIntensity {
        if let Some(value) = self.custom_intensity {
            return HapticIntensity::from_custom(value);
        }
        self.intensity
            .or(self.style)
            .or(match self.kind {
                Some(LegacyHapticType::Selection) => Some(HapticIntensity::Light),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// How a platform expresses haptic feedback natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapticPrimitive {
    /// A handful of predefined feedback styles, no duration control
    DiscreteStyles,
    /// A vibration motor driven for a duration at an amplitude
    TimedVibration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HapticCapabilities {
    pub primitive: HapticPrimitive,
    pub supports_pattern: bool,
    /// `false` when the device has no haptic hardware at all
    pub available: bool,
}

impl HapticCapabilities {
    pub const DISCRETE: Self = Self {
        primitive: HapticPrimitive::DiscreteStyles,
        supports_pattern: false,
        available: true,
    };

    pub const TIMED: Self = Self {
        primitive: HapticPrimitive::TimedVibration,
        supports_pattern: false,
        available: true,
    };

    pub const TIMED_WITH_PATTERN: Self = Self {
        primitive: HapticPrimitive::TimedVibration,
        supports_pattern: true,
        available: true,
    };

    pub const NONE: Self = Self {
        primitive: HapticPrimitive::DiscreteStyles,
        supports_pattern: false,
        available: false,
    };
}

/// What a backend is actually asked to play
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HapticEffect {
    Impact(HapticIntensity),
    OneShot { duration_ms: u64, amplitude: u8 },
    Waveform(Vec<u64>),
}

/// Backend side of haptics
pub trait HapticsSink: Send + Sync + 'static {
    fn capabilities(&self) -> HapticCapabilities;

    /// Plays `effect`; always called on the UI-affinity thread
    fn play(&self, effect: HapticEffect) -> Result<()>;
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn amplitude_for_custom(value: f64) -> u8 {
    (clamp_unit(value) * 255.0).clamp(1.0, 255.0) as u8
}

fn default_duration_ms(amplitude: u8) -> u64 {
    match amplitude {
        0..=50 => 10,
        200..=255 => 50,
        _ => 25,
    }
}

fn clamp_duration(duration: i64) -> u64 {
    duration.clamp(0, MAX_DURATION_MS) as u64
}

fn one_shot(amplitude: u8, duration: Option<i64>) -> HapticEffect {
    HapticEffect::OneShot {
        duration_ms: duration
            .map(clamp_duration)
            .unwrap_or_else(|| default_duration_ms(amplitude)),
        amplitude,
    }
}

/// Maps `request` onto what `caps` can play, `None` if nothing can be played
pub fn resolve(request: &HapticsRequest, caps: HapticCapabilities) -> Option<HapticEffect> {
    if !caps.available {
        return None;
    }

    if let Some(value) = request.custom_intensity {
        return Some(match caps.primitive {
            HapticPrimitive::DiscreteStyles => HapticEffect::Impact(HapticIntensity::from_custom(value)),
            HapticPrimitive::TimedVibration => one_shot(amplitude_for_custom(value), request.duration),
        });
    }

    let preset = request.effective_intensity();

    if let Some(pattern) = request.active_pattern() {
        if caps.supports_pattern {
            return Some(HapticEffect::Waveform(pattern.to_vec()));
        }
        debug!("Pattern playback unsupported, playing first pulse only");
        return Some(match caps.primitive {
            HapticPrimitive::DiscreteStyles => HapticEffect::Impact(preset),
            HapticPrimitive::TimedVibration => HapticEffect::OneShot {
                duration_ms: pattern[0].min(MAX_DURATION_MS as u64),
                amplitude: preset.amplitude(),
            },
        });
    }

    Some(match caps.primitive {
        HapticPrimitive::DiscreteStyles => HapticEffect::Impact(preset),
        HapticPrimitive::TimedVibration => one_shot(preset.amplitude(), request.duration),
    })
}

/// Plain timed pulse; discrete platforms play a medium impact instead
pub fn resolve_vibrate(duration_ms: Option<u64>, caps: HapticCapabilities) -> Option<HapticEffect> {
    if !caps.available {
        return None;
    }
    Some(match caps.primitive {
        HapticPrimitive::DiscreteStyles => HapticEffect::Impact(HapticIntensity::Medium),
        HapticPrimitive::TimedVibration => HapticEffect::OneShot {
            duration_ms: duration_ms
                .unwrap_or(DEFAULT_VIBRATE_MS)
                .min(MAX_DURATION_MS as u64),
            amplitude: HapticIntensity::Medium.amplitude(),
        },
    })
}

/// Resolves requests and hands the resulting effect to the UI thread
pub struct HapticsResolver<S: HapticsSink> {
    sink: Arc<S>,
    ui: UiExecutor,
}

impl<S: HapticsSink> HapticsResolver<S> {
    pub fn new(sink: Arc<S>, ui: UiExecutor) -> Self {
        Self { sink, ui }
    }

    /// Returns once the effect is queued, not once it has played
    pub fn trigger(&self, request: &HapticsRequest) -> Result<()> {
        let effect = resolve(request, self.sink.capabilities());
        self.submit(effect)
    }

    pub fn vibrate(&self, duration_ms: Option<u64>) -> Result<()> {
        let effect = resolve_vibrate(duration_ms, self.sink.capabilities());
        self.submit(effect)
    }

    fn submit(&self, effect: Option<HapticEffect>) -> Result<()> {
        let Some(effect) = effect else {
            debug!("No haptic hardware, request dropped");
            return Ok(());
        };

        debug!("Submitting haptic effect {:?}", effect);
        let sink = self.sink.clone();
        self.ui.dispatch(move || {
            if let Err(e) = sink.play(effect) {
                warn!("Haptic playback failed: {}", e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_custom_intensity_beats_preset() {
        let request = HapticsRequest {
            intensity: Some(HapticIntensity::Light),
            custom_intensity: Some(0.9),
            ..Default::default()
        };
        assert_eq!(request.effective_intensity(), HapticIntensity::Heavy);
        assert_eq!(
            resolve(&request, HapticCapabilities::DISCRETE),
            Some(HapticEffect::Impact(HapticIntensity::Heavy))
        );
        assert_eq!(HapticsRequest::custom(0.5).effective_intensity(), HapticIntensity::Medium);
        assert_eq!(HapticsRequest::custom(0.1).effective_intensity(), HapticIntensity::Light);
    }

    #[test]
    fn test_quantization_cut_points() {
        assert_eq!(HapticIntensity::from_custom(0.329), HapticIntensity::Light);
        assert_eq!(HapticIntensity::from_custom(0.33), HapticIntensity::Medium);
        assert_eq!(HapticIntensity::from_custom(0.659), HapticIntensity::Medium);
        assert_eq!(HapticIntensity::from_custom(0.66), HapticIntensity::Heavy);
        assert_eq!(HapticIntensity::from_custom(-3.0), HapticIntensity::Light);
        assert_eq!(HapticIntensity::from_custom(7.0), HapticIntensity::Heavy);
        assert_eq!(HapticIntensity::from_custom(f64::NAN), HapticIntensity::Light);
    }

    #[test]
    fn test_default_is_medium() {
        let request = HapticsRequest::default();
        assert_eq!(
            resolve(&request, HapticCapabilities::DISCRETE),
            Some(HapticEffect::Impact(HapticIntensity::Medium))
        );
        assert_eq!(
            resolve(&request, HapticCapabilities::TIMED),
            Some(HapticEffect::OneShot {
                duration_ms: 25,
                amplitude: 150
            })
        );
    }

    #[test]
    fn test_legacy_fields() {
        let request: HapticsRequest = serde_json::from_str(r#"{"type":"impact","style":"heavy"}"#).unwrap();
        assert_eq!(request.effective_intensity(), HapticIntensity::Heavy);
        let request: HapticsRequest = serde_json::from_str(r#"{"type":"selection"}"#).unwrap();
        assert_eq!(request.effective_intensity(), HapticIntensity::Light);
    }

    #[test]
    fn test_timed_envelope() {
        let caps = HapticCapabilities::TIMED;
        assert_eq!(
            resolve(&HapticsRequest::preset(HapticIntensity::Light), caps),
            Some(HapticEffect::OneShot {
                duration_ms: 10,
                amplitude: 50
            })
        );
        assert_eq!(
            resolve(&HapticsRequest::preset(HapticIntensity::Heavy), caps),
            Some(HapticEffect::OneShot {
                duration_ms: 50,
                amplitude: 255
            })
        );
        assert_eq!(
            resolve(&HapticsRequest::custom(0.0), caps),
            Some(HapticEffect::OneShot {
                duration_ms: 10,
                amplitude: 1
            })
        );
        assert_eq!(
            resolve(&HapticsRequest::custom(0.5).with_duration(99_999), caps),
            Some(HapticEffect::OneShot {
                duration_ms: 10_000,
                amplitude: 127
            })
        );
        assert_eq!(
            resolve(&HapticsRequest::preset(HapticIntensity::Medium).with_duration(-5), caps),
            Some(HapticEffect::OneShot {
                duration_ms: 0,
                amplitude: 150
            })
        );
    }

    #[test]
    fn test_duration_ignored_on_discrete_platforms() {
        let request = HapticsRequest::preset(HapticIntensity::Light).with_duration(400);
        assert_eq!(
            resolve(&request, HapticCapabilities::DISCRETE),
            Some(HapticEffect::Impact(HapticIntensity::Light))
        );
    }

    #[test]
    fn test_pattern_degradation() {
        let request = HapticsRequest::pattern(vec![80, 40, 80]);
        assert_eq!(
            resolve(&request, HapticCapabilities::TIMED_WITH_PATTERN),
            Some(HapticEffect::Waveform(vec![80, 40, 80]))
        );
        assert_eq!(
            resolve(&request, HapticCapabilities::TIMED),
            Some(HapticEffect::OneShot {
                duration_ms: 80,
                amplitude: 150
            })
        );
        assert_eq!(
            resolve(&request, HapticCapabilities::DISCRETE),
            Some(HapticEffect::Impact(HapticIntensity::Medium))
        );
        assert_eq!(resolve(&request, HapticCapabilities::NONE), None);
    }

    #[test]
    fn test_custom_intensity_beats_pattern() {
        let request = HapticsRequest {
            custom_intensity: Some(0.2),
            pattern: Some(vec![100, 100]),
            ..Default::default()
        };
        assert_eq!(
            resolve(&request, HapticCapabilities::TIMED_WITH_PATTERN),
            Some(HapticEffect::OneShot {
                duration_ms: 10,
                amplitude: 51
            })
        );
    }

    #[test]
    fn test_empty_pattern_is_ignored() {
        let request = HapticsRequest::pattern(Vec::new());
        assert_eq!(
            resolve(&request, HapticCapabilities::TIMED_WITH_PATTERN),
            Some(HapticEffect::OneShot {
                duration_ms: 25,
                amplitude: 150
            })
        );
    }

    #[test]
    fn test_vibrate() {
        assert_eq!(
            resolve_vibrate(None, HapticCapabilities::TIMED),
            Some(HapticEffect::OneShot {
                duration_ms: 100,
                amplitude: 150
            })
        );
        assert_eq!(
            resolve_vibrate(Some(300), HapticCapabilities::DISCRETE),
            Some(HapticEffect::Impact(HapticIntensity::Medium))
        );
        assert_eq!(resolve_vibrate(Some(300), HapticCapabilities::NONE), None);
    }

    struct RecordingSink {
        played: Mutex<Vec<HapticEffect>>,
        done: Mutex<mpsc::Sender<()>>,
    }

    impl HapticsSink for RecordingSink {
        fn capabilities(&self) -> HapticCapabilities {
            HapticCapabilities::DISCRETE
        }

        fn play(&self, effect: HapticEffect) -> Result<()> {
            self.played.lock().push(effect);
            let _ = self.done.lock().send(());
            Ok(())
        }
    }

    #[test]
    fn test_resolver_plays_on_ui_thread() {
        let (tx, rx) = mpsc::channel();
        let sink = Arc::new(RecordingSink {
            played: Mutex::new(Vec::new()),
            done: Mutex::new(tx),
        });
        let resolver = HapticsResolver::new(sink.clone(), UiExecutor::spawn("haptics-ui").unwrap());

        resolver.trigger(&HapticsRequest::custom(0.9)).unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(*sink.played.lock(), vec![HapticEffect::Impact(HapticIntensity::Heavy)]);
    }
}
