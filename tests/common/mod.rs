//! Shared fakes for integration tests: recording capabilities and an
//! in-process analysis service.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use image::RgbImage;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use vision_assistant::camera::{CameraDevice, CameraError, StreamConstraints, VideoStream};
use vision_assistant::config::AppConfig;
use vision_assistant::feedback::{NotificationPermission, Notifier, SpeechEngine, Utterance, Vibrator};
use vision_assistant::storage::MemoryKeyValueStore;
use vision_assistant::{Capabilities, SessionController, SettingsStore};

// =============================================================================
// Recording capabilities
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechCall {
    Speak(Utterance),
    Cancel,
}

#[derive(Default)]
pub struct RecordingSpeech {
    pub calls: Mutex<Vec<SpeechCall>>,
}

impl RecordingSpeech {
    /// Texts passed to `speak`, in order
    pub fn spoken(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SpeechCall::Speak(u) => Some(u.text.clone()),
                SpeechCall::Cancel => None,
            })
            .collect()
    }

    pub fn last_utterance(&self) -> Option<Utterance> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            SpeechCall::Speak(u) => Some(u.clone()),
            SpeechCall::Cancel => None,
        })
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl SpeechEngine for RecordingSpeech {
    fn speak(&self, utterance: Utterance) {
        self.calls.lock().push(SpeechCall::Speak(utterance));
    }

    fn cancel(&self) {
        self.calls.lock().push(SpeechCall::Cancel);
    }
}

#[derive(Default)]
pub struct RecordingVibrator {
    pub patterns: Mutex<Vec<Vec<u32>>>,
}

impl RecordingVibrator {
    pub fn played(&self, pattern: &[u32]) -> bool {
        self.patterns.lock().iter().any(|p| p == pattern)
    }

    pub fn count(&self) -> usize {
        self.patterns.lock().len()
    }
}

impl Vibrator for RecordingVibrator {
    fn vibrate(&self, pattern: &[u32]) {
        self.patterns.lock().push(pattern.to_vec());
    }
}

pub struct RecordingNotifier {
    permission: Mutex<NotificationPermission>,
    pub requests: Mutex<u32>,
    pub shown: Mutex<Vec<(String, String)>>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self {
            permission: Mutex::new(NotificationPermission::Default),
            requests: Mutex::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> NotificationPermission {
        *self.permission.lock()
    }

    fn request_permission(&self) -> NotificationPermission {
        *self.requests.lock() += 1;
        *self.permission.lock() = NotificationPermission::Granted;
        NotificationPermission::Granted
    }

    fn show(&self, title: &str, body: &str) {
        self.shown.lock().push((title.to_string(), body.to_string()));
    }
}

/// Camera that counts stream acquisitions and releases
#[derive(Default)]
pub struct FakeCamera {
    pub deny: bool,
    pub broken_frames: bool,
    pub open_delay: Duration,
    pub acquires: Mutex<u32>,
    pub releases: Arc<Mutex<u32>>,
    pub held: Arc<Mutex<u32>>,
    pub max_held: Arc<Mutex<u32>>,
}

impl FakeCamera {
    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    /// Opens fine but every frame read fails
    pub fn broken_frames() -> Self {
        Self {
            broken_frames: true,
            ..Self::default()
        }
    }

    pub fn acquires(&self) -> u32 {
        *self.acquires.lock()
    }

    pub fn releases(&self) -> u32 {
        *self.releases.lock()
    }

    pub fn held(&self) -> u32 {
        *self.held.lock()
    }

    pub fn max_held(&self) -> u32 {
        *self.max_held.lock()
    }
}

struct FakeStream {
    broken: bool,
    releases: Arc<Mutex<u32>>,
    held: Arc<Mutex<u32>>,
}

impl VideoStream for FakeStream {
    fn current_frame(&mut self) -> Result<RgbImage, CameraError> {
        if self.broken {
            return Err(CameraError::Frame("sensor returned no data".to_string()));
        }
        Ok(RgbImage::from_pixel(16, 16, image::Rgb([200, 180, 40])))
    }

    fn stop(&mut self) {
        *self.releases.lock() += 1;
        *self.held.lock() -= 1;
    }
}

#[async_trait]
impl CameraDevice for FakeCamera {
    async fn open(
        &self,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        if self.deny {
            return Err(CameraError::PermissionDenied);
        }

        *self.acquires.lock() += 1;
        let held = {
            let mut held = self.held.lock();
            *held += 1;
            *held
        };
        let mut max = self.max_held.lock();
        *max = (*max).max(held);

        Ok(Box::new(FakeStream {
            broken: self.broken_frames,
            releases: self.releases.clone(),
            held: self.held.clone(),
        }))
    }
}

// =============================================================================
// Mock analysis service
// =============================================================================

/// How the mock service answers analysis requests
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
    Raw(&'static str),
}

/// One received upload
#[derive(Debug, Clone)]
pub struct Upload {
    pub endpoint: String,
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct MockState {
    reply: Mutex<Reply>,
    delay: Mutex<Duration>,
    pub uploads: Mutex<Vec<Upload>>,
}

pub struct MockService {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockService {
    pub async fn start(reply: Reply) -> Self {
        let state = Arc::new(MockState {
            reply: Mutex::new(reply),
            delay: Mutex::new(Duration::ZERO),
            uploads: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/health", get(|| async { Json(serde_json::json!({"status": "ok"})) }))
            .route("/api/:endpoint", post(analyze))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock service");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock service failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.state.reply.lock() = reply;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = delay;
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.uploads.lock().clone()
    }
}

async fn analyze(
    State(state): State<Arc<MockState>>,
    Path(endpoint): Path<String>,
    mut multipart: Multipart,
) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        state.uploads.lock().push(Upload {
            endpoint: endpoint.clone(),
            field: name,
            file_name,
            content_type,
            bytes,
        });
    }

    let delay = *state.delay.lock();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reply = state.reply.lock().clone();
    match reply {
        Reply::Json(body) => Json(body).into_response(),
        Reply::Status(code) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(serde_json::json!({"detail": "mock failure"})),
        )
            .into_response(),
        Reply::Raw(body) => body.into_response(),
    }
}

// =============================================================================
// Controller harness
// =============================================================================

pub struct Harness {
    pub controller: SessionController,
    pub speech: Arc<RecordingSpeech>,
    pub vibrator: Arc<RecordingVibrator>,
    pub notifier: Arc<RecordingNotifier>,
    pub camera: Arc<FakeCamera>,
    pub settings: Arc<SettingsStore>,
}

/// Short delays so scenarios run quickly
pub const RESULT_DELAY: Duration = Duration::from_millis(50);
pub const RESTART_DELAY: Duration = Duration::from_millis(10);

/// Time after a result within which auto-speak has happened
pub const SPEECH_SETTLE: Duration = Duration::from_millis(250);

pub fn test_config(base_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.service.base_url = base_url.to_string();
    config.service.timeout_secs = 5;
    config.speech.result_delay_ms = RESULT_DELAY.as_millis() as u64;
    config.speech.restart_delay_ms = RESTART_DELAY.as_millis() as u64;
    config
}

impl Harness {
    pub fn new(base_url: &str) -> Self {
        Self::with_camera(base_url, FakeCamera::default())
    }

    pub fn with_camera(base_url: &str, camera: FakeCamera) -> Self {
        let speech = Arc::new(RecordingSpeech::default());
        let vibrator = Arc::new(RecordingVibrator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let camera = Arc::new(camera);
        let settings = Arc::new(SettingsStore::load(Arc::new(MemoryKeyValueStore::new())));

        let capabilities = Capabilities {
            camera: camera.clone(),
            speech: speech.clone(),
            vibrator: vibrator.clone(),
            notifier: notifier.clone(),
        };
        let controller =
            SessionController::new(&test_config(base_url), settings.clone(), capabilities)
                .expect("Failed to build controller");
        controller.startup();

        Self {
            controller,
            speech,
            vibrator,
            notifier,
            camera,
            settings,
        }
    }
}
