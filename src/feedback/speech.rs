//! Speech channel
//!
//! Speech is preemptive: every new utterance cancels whatever is playing
//! or queued, so the engine is only ever "idle" or "speaking one thing".
//! Delayed utterances carry the generation they were scheduled in and are
//! dropped if any speak or cancel happened while they waited.

use crate::settings::SettingsStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One utterance handed to the speech engine
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// BCP 47 language tag
    pub lang: String,
    /// Rate multiplier (1.0 = normal)
    pub rate: f64,
    pub pitch: f64,
    pub volume: f64,
}

/// Speech synthesis capability
pub trait SpeechEngine: Send + Sync {
    /// Start speaking `utterance`
    fn speak(&self, utterance: Utterance);

    /// Stop the current utterance and drop anything queued
    fn cancel(&self);
}

/// Speech engine for environments without speech synthesis
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpeech;

impl SpeechEngine for NoopSpeech {
    fn speak(&self, _utterance: Utterance) {}

    fn cancel(&self) {}
}

/// Preemptive speaker on top of a [`SpeechEngine`]
#[derive(Clone)]
pub struct Speaker {
    engine: Arc<dyn SpeechEngine>,
    settings: Arc<SettingsStore>,
    locale: Arc<str>,
    generation: Arc<AtomicU64>,
}

impl Speaker {
    pub fn new(engine: Arc<dyn SpeechEngine>, settings: Arc<SettingsStore>, locale: &str) -> Self {
        Self {
            engine,
            settings,
            locale: Arc::from(locale),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cancel anything in progress and speak `text`
    pub fn speak(&self, text: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.engine.cancel();
        self.engine.speak(self.utterance(text));
    }

    /// Cancel anything in progress
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.engine.cancel();
    }

    /// Counter bumped on every speak and cancel
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Speak `text` after `delay` unless speech was touched in the meantime.
    ///
    /// Returns whether the utterance was issued.
    pub async fn speak_after(&self, delay: Duration, text: &str) -> bool {
        let scheduled = self.generation();
        tokio::time::sleep(delay).await;

        if self.generation() != scheduled {
            tracing::debug!("Delayed utterance superseded, dropping");
            return false;
        }
        self.speak(text);
        true
    }

    fn utterance(&self, text: &str) -> Utterance {
        Utterance {
            text: text.to_string(),
            lang: self.locale.to_string(),
            rate: self.settings.voice_speed(),
            pitch: 1.0,
            volume: 1.0,
        }
    }
}
