//! User settings persistence
//!
//! Holds the small preference record that gates the feedback channels
//! (speech rate, vibration, auto-speak). The record is read once at
//! startup and written back in full on every mutation.
//!
//! Loading never fails: a missing record, or one that does not
//! deserialise, yields the full default record.

use crate::storage::{KeyValueStore, StorageError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fixed storage key for the settings record
pub const SETTINGS_KEY: &str = "visionAssistantSettings";

/// Slowest supported speech rate
pub const MIN_VOICE_SPEED: f64 = 0.5;

/// Fastest supported speech rate
pub const MAX_VOICE_SPEED: f64 = 2.0;

/// Default speech rate
pub const DEFAULT_VOICE_SPEED: f64 = 1.0;

/// User preference record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Speech rate multiplier, within [MIN_VOICE_SPEED, MAX_VOICE_SPEED]
    pub voice_speed: f64,
    /// Whether haptic patterns are played
    #[serde(alias = "vibration")]
    pub vibration_enabled: bool,
    /// Whether analysis results are spoken automatically
    #[serde(alias = "autoSpeak")]
    pub auto_speak_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice_speed: DEFAULT_VOICE_SPEED,
            vibration_enabled: true,
            auto_speak_enabled: true,
        }
    }
}

impl Settings {
    /// Clamp out-of-range values into their documented bounds
    pub fn normalized(mut self) -> Self {
        self.voice_speed = clamp_voice_speed(self.voice_speed);
        self
    }
}

/// Clamp a speech rate into the supported range; non-finite values fall back to the default
pub fn clamp_voice_speed(speed: f64) -> f64 {
    if !speed.is_finite() {
        return DEFAULT_VOICE_SPEED;
    }
    speed.clamp(MIN_VOICE_SPEED, MAX_VOICE_SPEED)
}

/// Read the settings record from storage, falling back to defaults
pub fn load_settings(storage: &dyn KeyValueStore) -> Settings {
    let raw = match storage.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::info!("No stored settings, using defaults");
            return Settings::default();
        }
        Err(e) => {
            tracing::warn!("Failed to read settings, using defaults: {}", e);
            return Settings::default();
        }
    };

    match serde_json::from_str::<Settings>(&raw) {
        Ok(settings) => settings.normalized(),
        Err(e) => {
            tracing::warn!("Stored settings are malformed, discarding: {}", e);
            Settings::default()
        }
    }
}

/// Write the full settings record to storage
pub fn save_settings(storage: &dyn KeyValueStore, settings: &Settings) -> Result<(), StorageError> {
    let json = serde_json::to_string(settings)?;
    storage.set(SETTINGS_KEY, &json)
}

/// Process-wide settings holder
///
/// Owned by the host and injected into the feedback subsystem and the
/// session controller. Every mutation is persisted before it becomes
/// visible to readers.
pub struct SettingsStore {
    storage: Arc<dyn KeyValueStore>,
    data: RwLock<Settings>,
}

impl SettingsStore {
    /// Load the stored record (or defaults) and keep `storage` for later writes
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let settings = load_settings(storage.as_ref());
        tracing::info!(
            "Settings loaded: voice_speed={:.1}, vibration={}, auto_speak={}",
            settings.voice_speed,
            settings.vibration_enabled,
            settings.auto_speak_enabled
        );
        Self {
            storage,
            data: RwLock::new(settings),
        }
    }

    /// Current settings snapshot
    pub fn get(&self) -> Settings {
        *self.data.read()
    }

    pub fn voice_speed(&self) -> f64 {
        self.data.read().voice_speed
    }

    pub fn vibration_enabled(&self) -> bool {
        self.data.read().vibration_enabled
    }

    pub fn auto_speak_enabled(&self) -> bool {
        self.data.read().auto_speak_enabled
    }

    /// Set the speech rate (clamped) and persist
    pub fn set_voice_speed(&self, speed: f64) -> Result<Settings, StorageError> {
        self.update(|s| s.voice_speed = clamp_voice_speed(speed))
    }

    /// Enable or disable haptic feedback and persist
    pub fn set_vibration_enabled(&self, enabled: bool) -> Result<Settings, StorageError> {
        self.update(|s| s.vibration_enabled = enabled)
    }

    /// Enable or disable automatic result playback and persist
    pub fn set_auto_speak_enabled(&self, enabled: bool) -> Result<Settings, StorageError> {
        self.update(|s| s.auto_speak_enabled = enabled)
    }

    /// Apply `change`, persist the whole record, then publish it
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<Settings, StorageError> {
        let mut guard = self.data.write();
        let mut next = *guard;
        change(&mut next);
        let next = next.normalized();

        save_settings(self.storage.as_ref(), &next)?;
        *guard = next;

        tracing::debug!("Settings saved: {:?}", next);
        Ok(next)
    }
}
