//! Haptic feedback channel
//!
//! Named vibration waveforms let a non-visual user tell outcome classes
//! apart: a short pulse for navigation, a medium pulse for commit actions,
//! and distinct multi-beat shapes for success and error.

use crate::settings::SettingsStore;
use std::sync::Arc;

/// Haptic pattern types for different application events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPattern {
    /// Navigation or confirmation (~30ms)
    Pulse,
    /// Capture or other commit action (~50ms)
    Medium,
    /// Analysis succeeded (three beats)
    Success,
    /// Analysis or capture failed (five beats)
    Error,
}

impl HapticPattern {
    /// Alternating on/off durations in milliseconds, starting with "on"
    pub fn durations(&self) -> &'static [u32] {
        match self {
            HapticPattern::Pulse => &[30],
            HapticPattern::Medium => &[50],
            HapticPattern::Success => &[50, 100, 50],
            HapticPattern::Error => &[100, 50, 100, 50, 100],
        }
    }
}

/// Device vibration capability
pub trait Vibrator: Send + Sync {
    /// Play a single duration or an alternating on/off sequence
    fn vibrate(&self, pattern: &[u32]);
}

/// Vibrator for environments without vibration hardware
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVibrator;

impl Vibrator for NoopVibrator {
    fn vibrate(&self, _pattern: &[u32]) {}
}

/// Plays haptic patterns when the user has vibration enabled
#[derive(Clone)]
pub struct Haptics {
    vibrator: Arc<dyn Vibrator>,
    settings: Arc<SettingsStore>,
}

impl Haptics {
    pub fn new(vibrator: Arc<dyn Vibrator>, settings: Arc<SettingsStore>) -> Self {
        Self { vibrator, settings }
    }

    /// Play `pattern` if vibration is enabled in settings
    pub fn play(&self, pattern: HapticPattern) {
        if !self.settings.vibration_enabled() {
            tracing::debug!("Vibration disabled, skipping {:?}", pattern);
            return;
        }
        self.vibrator.vibrate(pattern.durations());
    }
}
