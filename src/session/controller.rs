//! Session controller
//!
//! The single entry point for user actions. Each action runs the pure
//! state machine first and, if the transition is accepted, drives the
//! camera, the analysis orchestrator and the feedback channels.
//!
//! Every visit to the camera screen gets its own [`CancellationToken`].
//! Going home cancels it, so a camera grant, an analysis response or a
//! delayed utterance that arrives afterwards is discarded instead of
//! being applied to a session that has moved on.

use super::keys::{action_for_key, Key, KeyAction};
use super::state::{Screen, Session, SessionEvent};
use super::view::{render, View};
use super::Mode;
use crate::analysis::{AnalysisClient, AnalysisError, AnalysisOrchestrator};
use crate::camera::{CameraDevice, CameraManager, StreamConstraints, UnavailableCamera};
use crate::capture::{self, Capture};
use crate::config::AppConfig;
use crate::feedback::{
    messages, Feedback, HapticPattern, NoopNotifier, NoopSpeech, NoopVibrator, Notifier,
    SpeechEngine, Vibrator,
};
use crate::settings::{Settings, SettingsStore};
use crate::storage::StorageError;
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Platform capabilities injected into the controller
#[derive(Clone)]
pub struct Capabilities {
    pub camera: Arc<dyn CameraDevice>,
    pub speech: Arc<dyn SpeechEngine>,
    pub vibrator: Arc<dyn Vibrator>,
    pub notifier: Arc<dyn Notifier>,
}

impl Capabilities {
    /// No camera, no speech, no vibration, no notifications
    pub fn noop() -> Self {
        Self {
            camera: Arc::new(UnavailableCamera),
            speech: Arc::new(NoopSpeech),
            vibrator: Arc::new(NoopVibrator),
            notifier: Arc::new(NoopNotifier),
        }
    }
}

/// Outcome of an analyze action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// Result shown on the Result screen
    Completed { text: String },
    /// Request failed; the preview and capture are kept
    Failed(AnalysisError),
    /// Nothing captured yet; a reminder was spoken
    NoCapture,
    /// The session moved on before the response arrived
    Discarded,
    /// Not valid in the current state
    Ignored,
}

/// Top-level controller for one user session
#[derive(Clone)]
pub struct SessionController {
    session: Arc<Mutex<Session>>,
    camera: Arc<tokio::sync::Mutex<CameraManager>>,
    orchestrator: AnalysisOrchestrator,
    feedback: Feedback,
    settings: Arc<SettingsStore>,
    visit: Arc<Mutex<CancellationToken>>,
    result_delay: Duration,
    jpeg_quality: u8,
}

impl SessionController {
    /// Wire a controller from configuration, settings and platform capabilities
    pub fn new(
        config: &AppConfig,
        settings: Arc<SettingsStore>,
        capabilities: Capabilities,
    ) -> Result<Self> {
        let client = AnalysisClient::new(&config.service)?;
        let feedback = Feedback::new(
            capabilities.speech,
            capabilities.vibrator,
            capabilities.notifier,
            settings.clone(),
            &config.speech,
        );
        let camera = CameraManager::new(
            capabilities.camera,
            StreamConstraints::from(&config.camera),
        );

        tracing::info!("Session controller ready (service: {})", client.api_base());

        Ok(Self {
            session: Arc::new(Mutex::new(Session::new())),
            camera: Arc::new(tokio::sync::Mutex::new(camera)),
            orchestrator: AnalysisOrchestrator::new(client),
            feedback,
            settings,
            visit: Arc::new(Mutex::new(CancellationToken::new())),
            result_delay: config.speech.result_delay(),
            jpeg_quality: config.camera.jpeg_quality,
        })
    }

    /// One-time startup work: ask for notification permission
    pub fn startup(&self) {
        self.feedback.request_notification_permission();
    }

    /// Check that the analysis service answers its health probe
    pub async fn service_available(&self) -> bool {
        self.orchestrator.client().is_available().await
    }

    /// Home -> Camera for `mode`, then acquire the camera
    pub async fn select_mode(&self, mode: Mode) -> bool {
        if self
            .session
            .lock()
            .process_event(SessionEvent::SelectMode(mode))
            .is_none()
        {
            return false;
        }

        let visit = self.begin_visit();
        self.feedback.vibrate(HapticPattern::Pulse);
        self.start_camera(&visit).await;
        true
    }

    /// Snapshot the live stream into the held capture
    pub async fn capture(&self) -> bool {
        {
            let session = self.session.lock();
            if session.screen() != Screen::Camera
                || session.has_capture()
                || session.analysis_pending()
            {
                tracing::debug!("Capture ignored in current state");
                return false;
            }
        }

        if !self.camera.lock().await.is_held() {
            tracing::debug!("Capture requested without a live stream");
            self.feedback.speak(messages::CAMERA_ACCESS_FAILED);
            return false;
        }

        self.feedback.vibrate(HapticPattern::Medium);
        let visit = self.current_visit();
        match capture::capture_from_stream(&self.camera, self.jpeg_quality, &visit).await {
            Ok(Some(capture)) => self.accept_capture(capture, messages::PHOTO_CAPTURED),
            Ok(None) => false,
            Err(e) => {
                tracing::error!("Snapshot failed: {}", e);
                self.feedback.report_failure(
                    messages::SNAPSHOT_FAILED,
                    messages::SNAPSHOT_ERROR_TITLE,
                    messages::SNAPSHOT_ERROR_BODY,
                    HapticPattern::Error,
                );
                false
            }
        }
    }

    /// Use a user-selected file as the capture. An empty selection is a no-op.
    pub async fn capture_file(&self, bytes: Vec<u8>, declared_type: Option<&str>) -> bool {
        let Some(capture) = Capture::from_file(bytes, declared_type) else {
            tracing::debug!("Empty file selection ignored");
            return false;
        };

        {
            let session = self.session.lock();
            if session.screen() != Screen::Camera || session.analysis_pending() {
                tracing::debug!("File capture ignored in current state");
                return false;
            }
        }

        self.feedback.vibrate(HapticPattern::Medium);
        self.camera.lock().await.release();
        self.accept_capture(capture, messages::PHOTO_SELECTED)
    }

    /// Camera(preview) -> Camera(live): drop the capture and reopen the camera
    pub async fn retake(&self) -> bool {
        if self
            .session
            .lock()
            .process_event(SessionEvent::Retake)
            .is_none()
        {
            return false;
        }

        self.feedback.vibrate(HapticPattern::Pulse);
        let visit = self.current_visit();
        self.start_camera(&visit).await;
        true
    }

    /// Upload the held capture and show the result
    pub async fn analyze(&self) -> AnalyzeOutcome {
        let (mode, capture) = {
            let mut session = self.session.lock();
            let (Some(mode), Some(capture)) = (session.mode(), session.capture().cloned()) else {
                drop(session);
                tracing::debug!("Analyze requested without a capture");
                self.feedback.speak(messages::NO_PHOTO_YET);
                return AnalyzeOutcome::NoCapture;
            };
            if session
                .process_event(SessionEvent::AnalysisStarted)
                .is_none()
            {
                return AnalyzeOutcome::Ignored;
            }
            (mode, capture)
        };
        let visit = self.current_visit();

        self.feedback.cancel_speech();
        self.feedback.vibrate(HapticPattern::Pulse);

        let result = tokio::select! {
            _ = visit.cancelled() => {
                tracing::info!("Analysis abandoned: session left the camera screen");
                return AnalyzeOutcome::Discarded;
            }
            result = self.orchestrator.analyze(mode, &capture) => result,
        };

        if visit.is_cancelled() {
            return AnalyzeOutcome::Discarded;
        }

        match result {
            Ok(text) => {
                let applied = self
                    .session
                    .lock()
                    .process_event(SessionEvent::AnalysisSucceeded { text: text.clone() });
                if applied.is_none() {
                    return AnalyzeOutcome::Discarded;
                }

                self.feedback.vibrate(HapticPattern::Success);
                if self.settings.auto_speak_enabled() {
                    self.schedule_result_speech(visit);
                }
                AnalyzeOutcome::Completed { text }
            }
            Err(e) => {
                let applied = self
                    .session
                    .lock()
                    .process_event(SessionEvent::AnalysisFailed {
                        error: e.to_string(),
                    });
                if applied.is_none() {
                    return AnalyzeOutcome::Discarded;
                }

                self.feedback.report_failure(
                    messages::ANALYSIS_FAILED,
                    messages::ANALYSIS_ERROR_TITLE,
                    messages::ANALYSIS_ERROR_BODY,
                    HapticPattern::Error,
                );
                AnalyzeOutcome::Failed(e)
            }
        }
    }

    /// Speak the displayed result again
    pub async fn speak_result(&self) -> bool {
        let text = {
            let session = self.session.lock();
            if session.screen() != Screen::Result {
                return false;
            }
            session.result_text().map(str::to_string)
        };

        match text {
            Some(text) => self.feedback.speak_result(&text).await,
            None => false,
        }
    }

    /// Return to mode selection from any screen
    pub async fn go_home(&self) {
        self.feedback.vibrate(HapticPattern::Pulse);
        self.feedback.cancel_speech();
        self.visit.lock().cancel();
        self.camera.lock().await.release();
        self.session.lock().process_event(SessionEvent::GoHome);
    }

    /// Open or close the settings overlay. Returns whether it is now open.
    pub fn toggle_settings_panel(&self) -> bool {
        self.feedback.vibrate(HapticPattern::Pulse);
        self.feedback.cancel_speech();

        let mut session = self.session.lock();
        session.process_event(SessionEvent::ToggleSettings);
        session.settings_open()
    }

    /// Action bound to `key` in the current state
    pub fn key_action(&self, key: Key) -> Option<KeyAction> {
        let session = self.session.lock();
        action_for_key(key, session.screen(), session.has_capture())
    }

    /// Run the action bound to `key`
    pub async fn handle_key(&self, key: Key) -> Option<KeyAction> {
        let action = self.key_action(key)?;
        match action {
            KeyAction::Capture => {
                self.capture().await;
            }
            KeyAction::Analyze => {
                self.analyze().await;
            }
            KeyAction::GoHome => self.go_home().await,
        }
        Some(action)
    }

    pub fn settings(&self) -> Settings {
        self.settings.get()
    }

    pub fn set_voice_speed(&self, speed: f64) -> Result<Settings, StorageError> {
        self.settings.set_voice_speed(speed)
    }

    /// Enabling vibration confirms with a medium pulse
    pub fn set_vibration_enabled(&self, enabled: bool) -> Result<Settings, StorageError> {
        let settings = self.settings.set_vibration_enabled(enabled)?;
        if enabled {
            self.feedback.vibrate(HapticPattern::Medium);
        }
        Ok(settings)
    }

    pub fn set_auto_speak_enabled(&self, enabled: bool) -> Result<Settings, StorageError> {
        self.settings.set_auto_speak_enabled(enabled)
    }

    /// Copy of the current session record
    pub fn snapshot(&self) -> Session {
        self.session.lock().clone()
    }

    pub fn view(&self) -> View {
        render(&self.session.lock())
    }

    pub fn should_warn_before_unload(&self) -> bool {
        self.session.lock().should_warn_before_unload()
    }

    pub fn is_analysis_pending(&self) -> bool {
        self.orchestrator.is_busy()
    }

    pub async fn camera_held(&self) -> bool {
        self.camera.lock().await.is_held()
    }

    fn begin_visit(&self) -> CancellationToken {
        let mut visit = self.visit.lock();
        visit.cancel();
        *visit = CancellationToken::new();
        visit.clone()
    }

    fn current_visit(&self) -> CancellationToken {
        self.visit.lock().clone()
    }

    async fn start_camera(&self, visit: &CancellationToken) {
        let acquired = {
            let mut camera = self.camera.lock().await;
            let acquired = camera.acquire().await;
            if visit.is_cancelled() {
                camera.release();
                tracing::debug!("Camera granted after leaving the screen, released");
                return;
            }
            acquired
        };

        match acquired {
            Ok(()) => {
                self.session.lock().process_event(SessionEvent::CameraStarted);
            }
            Err(e) => {
                tracing::warn!("Camera unavailable: {}", e);
                self.session.lock().process_event(SessionEvent::CameraFailed);
                self.feedback.report_failure(
                    messages::CAMERA_ACCESS_FAILED,
                    messages::CAMERA_ERROR_TITLE,
                    messages::CAMERA_ERROR_BODY,
                    HapticPattern::Error,
                );
            }
        }
    }

    fn accept_capture(&self, capture: Capture, confirmation: &str) -> bool {
        if self
            .session
            .lock()
            .process_event(SessionEvent::Captured(capture))
            .is_none()
        {
            return false;
        }
        self.feedback.speak(confirmation);
        true
    }

    fn schedule_result_speech(&self, visit: CancellationToken) {
        let controller = self.clone();
        let delay = self.result_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = visit.cancelled() => {
                    tracing::debug!("Result speech cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    controller.speak_result().await;
                }
            }
        });
    }
}
