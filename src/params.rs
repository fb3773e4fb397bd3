//! Parameter Store
//!
//! Holds the two control values (gain, EQ boost) shared between the control
//! surface and the audio callback. Each value is an `f32` stored as bits in an
//! `AtomicU32`, so a read never tears and never blocks.
//!
//! Values are NOT validated here. The control surface is expected to clamp to
//! [`ParameterSpec::min`]..[`ParameterSpec::max`] before calling a setter;
//! anything else is stored as given so the audio path can never fail on it.

use std::sync::atomic::{AtomicU32, Ordering};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{GainKnobError, Result};

// ============================================================================
// Parameter Metadata
// ============================================================================

/// Identifies one of the two control parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    /// Linear gain multiplier
    Gain,
    /// EQ boost, treated as decibels by the filter
    EqBoost,
}

impl ParameterId {
    /// All parameters in declaration order
    pub const ALL: [ParameterId; 2] = [ParameterId::Gain, ParameterId::EqBoost];

    /// Static metadata for this parameter
    pub fn spec(&self) -> &'static ParameterSpec {
        match self {
            ParameterId::Gain => &GAIN_SPEC,
            ParameterId::EqBoost => &EQ_BOOST_SPEC,
        }
    }

    /// Look up a parameter by its persisted identifier
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.spec().key == key)
    }
}

/// Range, default and display name of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    /// Identifier used in persisted state
    pub key: &'static str,
    /// Human-readable label
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// Knob resolution
    pub step: f32,
}

impl ParameterSpec {
    /// Clamp a value into this parameter's documented range
    ///
    /// Callers on the control surface use this; the store itself never clamps.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Whether `value` lies inside the documented range
    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub const GAIN_SPEC: ParameterSpec = ParameterSpec {
    key: "gain",
    name: "Gain",
    min: 0.0,
    max: 10.0,
    default: 1.0,
    step: 0.1,
};

pub const EQ_BOOST_SPEC: ParameterSpec = ParameterSpec {
    key: "eqBoost",
    name: "EQ Boost",
    min: 0.0,
    max: 10.0,
    default: 0.0,
    step: 0.1,
};

/// Map a knob position expressed in dB to a linear multiplier
#[inline]
pub fn knob_db_to_linear(db: f32) -> f32 {
    crate::dsp::biquad::db_to_linear(db)
}

// ============================================================================
// Atomic Parameter
// ============================================================================

/// Lock-free `f32` cell
#[derive(Debug)]
pub struct AtomicParam {
    bits: AtomicU32,
}

impl AtomicParam {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    /// Publish a new value (control thread)
    #[inline]
    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Read the last published value (audio thread)
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for AtomicParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ============================================================================
// Parameter Store
// ============================================================================

/// Gain and EQ boost values shared between threads
///
/// Wrap in an `Arc` and hand one clone to the processor and one to the
/// control surface.
#[derive(Debug)]
pub struct ParameterStore {
    gain: AtomicParam,
    eq_boost: AtomicParam,
}

impl ParameterStore {
    /// Create a store holding the default values
    pub fn new() -> Self {
        Self::with_values(GAIN_SPEC.default, EQ_BOOST_SPEC.default)
    }

    /// Create a store with explicit initial values
    pub fn with_values(gain: f32, eq_boost: f32) -> Self {
        Self {
            gain: AtomicParam::new(gain),
            eq_boost: AtomicParam::new(eq_boost),
        }
    }

    #[inline]
    pub fn set_gain(&self, value: f32) {
        self.gain.set(value);
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain.get()
    }

    #[inline]
    pub fn set_eq_boost(&self, value: f32) {
        self.eq_boost.set(value);
    }

    #[inline]
    pub fn eq_boost(&self) -> f32 {
        self.eq_boost.get()
    }

    /// Set a parameter by id
    pub fn set(&self, id: ParameterId, value: f32) {
        match id {
            ParameterId::Gain => self.set_gain(value),
            ParameterId::EqBoost => self.set_eq_boost(value),
        }
    }

    /// Get a parameter by id
    pub fn get(&self, id: ParameterId) -> f32 {
        match id {
            ParameterId::Gain => self.gain(),
            ParameterId::EqBoost => self.eq_boost(),
        }
    }

    /// Capture the current values for persistence
    pub fn snapshot(&self) -> PluginState {
        PluginState {
            gain: self.gain(),
            eq_boost: self.eq_boost(),
        }
    }

    /// Publish previously saved values
    pub fn restore(&self, state: &PluginState) {
        debug!(
            "Restoring parameters: gain={} eqBoost={}",
            state.gain, state.eq_boost
        );
        for id in ParameterId::ALL {
            let value = state.get(id);
            if !id.spec().contains(value) {
                warn!(
                    "Restored {} value {} is outside [{}, {}]; keeping it as-is",
                    id.spec().key,
                    value,
                    id.spec().min,
                    id.spec().max
                );
            }
        }
        self.set_gain(state.gain);
        self.set_eq_boost(state.eq_boost);
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Persisted State
// ============================================================================

/// Flat key-value form of the parameters, as saved by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PluginState {
    #[serde(default = "default_gain")]
    pub gain: f32,
    #[serde(rename = "eqBoost", default = "default_eq_boost")]
    pub eq_boost: f32,
}

fn default_gain() -> f32 {
    GAIN_SPEC.default
}

fn default_eq_boost() -> f32 {
    EQ_BOOST_SPEC.default
}

impl Default for PluginState {
    fn default() -> Self {
        Self {
            gain: default_gain(),
            eq_boost: default_eq_boost(),
        }
    }
}

impl PluginState {
    pub fn get(&self, id: ParameterId) -> f32 {
        match id {
            ParameterId::Gain => self.gain,
            ParameterId::EqBoost => self.eq_boost,
        }
    }

    /// Serialize to the JSON blob handed to the host
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse a JSON blob produced by [`PluginState::to_json_bytes`]
    ///
    /// Missing keys fall back to defaults. Non-finite values are rejected.
    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(GainKnobError::InvalidState {
                reason: "state blob is empty".to_string(),
            });
        }
        let state: PluginState = serde_json::from_slice(data)?;
        for id in ParameterId::ALL {
            if !state.get(id).is_finite() {
                return Err(GainKnobError::InvalidState {
                    reason: format!("{} is not a finite number", id.spec().key),
                });
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_defaults() {
        let store = ParameterStore::new();
        assert_eq!(store.gain(), 1.0);
        assert_eq!(store.eq_boost(), 0.0);
    }

    #[test]
    fn test_out_of_range_values_are_accepted() {
        let store = ParameterStore::new();
        store.set_gain(42.0);
        store.set_eq_boost(-3.5);
        assert_eq!(store.gain(), 42.0);
        assert_eq!(store.eq_boost(), -3.5);
    }

    #[test]
    fn test_set_get_by_id() {
        let store = ParameterStore::new();
        store.set(ParameterId::EqBoost, 6.0);
        assert_eq!(store.get(ParameterId::EqBoost), 6.0);
        assert_eq!(ParameterId::from_key("eqBoost"), Some(ParameterId::EqBoost));
        assert_eq!(ParameterId::from_key("gain"), Some(ParameterId::Gain));
        assert_eq!(ParameterId::from_key("volume"), None);
    }

    #[test]
    fn test_spec_clamp() {
        assert_eq!(GAIN_SPEC.clamp(12.0), 10.0);
        assert_eq!(EQ_BOOST_SPEC.clamp(-1.0), 0.0);
        assert!(GAIN_SPEC.contains(GAIN_SPEC.default));
    }

    #[test]
    fn test_knob_db_to_linear() {
        assert!((knob_db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((knob_db_to_linear(6.0) - 1.995_262).abs() < 1e-4);
        assert!((knob_db_to_linear(10.0) - 3.162_278).abs() < 1e-4);
    }

    #[test]
    fn test_concurrent_publish() {
        let store = Arc::new(ParameterStore::new());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..1000 {
                    store.set_gain(i as f32 * 0.01);
                }
            })
        };
        for _ in 0..1000 {
            let g = store.gain();
            assert!(g.is_finite());
        }
        writer.join().unwrap();
        assert!((store.gain() - 9.99).abs() < 1e-4);
    }

    #[test]
    fn test_state_roundtrip_through_store() {
        let store = ParameterStore::with_values(2.5, 4.0);
        let bytes = store.snapshot().to_json_bytes().unwrap();

        let restored = ParameterStore::new();
        restored.restore(&PluginState::from_json_bytes(&bytes).unwrap());
        assert_eq!(restored.gain(), 2.5);
        assert_eq!(restored.eq_boost(), 4.0);
    }

    #[test]
    fn test_state_uses_flat_keys() {
        let json = serde_json::to_value(PluginState {
            gain: 3.0,
            eq_boost: 1.5,
        })
        .unwrap();
        assert_eq!(json["gain"], 3.0);
        assert_eq!(json["eqBoost"], 1.5);
    }

    #[test]
    fn test_state_missing_key_defaults() {
        let state = PluginState::from_json_bytes(br#"{"gain": 2.0}"#).unwrap();
        assert_eq!(state.gain, 2.0);
        assert_eq!(state.eq_boost, EQ_BOOST_SPEC.default);
    }

    #[test]
    fn test_state_rejects_garbage() {
        assert!(PluginState::from_json_bytes(b"").is_err());
        assert!(PluginState::from_json_bytes(b"<xml/>").is_err());
        assert!(PluginState::from_json_bytes(br#"{"gain": "loud"}"#).is_err());
    }
}
