//! Multi-channel user feedback
//!
//! Three independent side-effecting channels reinforce every state
//! change for a user who may not see the screen:
//!
//! - **Speech** - preemptive, single utterance ([`speech`])
//! - **Haptics** - named vibration patterns ([`haptics`])
//! - **Notifications** - best-effort system notifications ([`notify`])
//!
//! Each channel wraps an injected capability. Missing platform support is
//! expressed by the no-op implementations, so callers never branch on
//! capability presence.

pub mod haptics;
pub mod messages;
pub mod notify;
pub mod speech;

pub use haptics::{HapticPattern, Haptics, NoopVibrator, Vibrator};
pub use notify::{NoopNotifier, NotificationPermission, Notifications, Notifier};
pub use speech::{NoopSpeech, Speaker, SpeechEngine, Utterance};

use crate::config::SpeechConfig;
use crate::settings::SettingsStore;
use std::sync::Arc;
use std::time::Duration;

/// Facade over the three feedback channels
#[derive(Clone)]
pub struct Feedback {
    speaker: Speaker,
    haptics: Haptics,
    notifications: Notifications,
    restart_delay: Duration,
}

impl Feedback {
    pub fn new(
        speech: Arc<dyn SpeechEngine>,
        vibrator: Arc<dyn Vibrator>,
        notifier: Arc<dyn Notifier>,
        settings: Arc<SettingsStore>,
        speech_config: &SpeechConfig,
    ) -> Self {
        Self {
            speaker: Speaker::new(speech, settings.clone(), &speech_config.locale),
            haptics: Haptics::new(vibrator, settings),
            notifications: Notifications::new(notifier),
            restart_delay: speech_config.restart_delay(),
        }
    }

    /// Speak `text`, cancelling anything in progress
    pub fn speak(&self, text: &str) {
        self.speaker.speak(text);
    }

    pub fn cancel_speech(&self) {
        self.speaker.cancel();
    }

    pub fn vibrate(&self, pattern: HapticPattern) {
        self.haptics.play(pattern);
    }

    pub fn notify(&self, title: &str, body: &str) {
        self.notifications.notify(title, body);
    }

    /// Ask for notification permission; only the first call prompts
    pub fn request_notification_permission(&self) {
        self.notifications.request_permission_once();
    }

    /// Report a failure on every channel: spoken message, notification and haptic pattern
    pub fn report_failure(&self, spoken: &str, title: &str, body: &str, pattern: HapticPattern) {
        self.speak(spoken);
        self.notify(title, body);
        self.vibrate(pattern);
    }

    /// Replay a displayed result: pulse, cancel, short pause, then speak.
    ///
    /// The pause keeps the result from racing a screen-transition
    /// announcement. Returns whether the utterance was issued.
    pub async fn speak_result(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.vibrate(HapticPattern::Pulse);
        self.speaker.cancel();
        self.speaker.speak_after(self.restart_delay, text).await
    }
}
