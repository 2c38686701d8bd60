//! Console implementations of the platform capabilities
//!
//! Used by the terminal host. Speech and notifications are written as
//! tagged lines, vibration patterns are written and logged, and the
//! camera is backed by a still image file.

use crate::camera::{CameraDevice, CameraError, StreamConstraints, VideoStream};
use crate::feedback::{NotificationPermission, Notifier, SpeechEngine, Utterance, Vibrator};
use async_trait::async_trait;
use image::RgbImage;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared line writer for console output
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Write one line; console write failures are logged and otherwise ignored
    pub fn line(&self, args: fmt::Arguments<'_>) {
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{}", args).and_then(|_| out.flush()) {
            tracing::warn!("Console write failed: {}", e);
        }
    }
}

/// Speech engine that prints utterances
pub struct ConsoleSpeech {
    console: Console,
}

impl ConsoleSpeech {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl SpeechEngine for ConsoleSpeech {
    fn speak(&self, utterance: Utterance) {
        self.console.line(format_args!(
            "[speech {} x{:.1}] {}",
            utterance.lang, utterance.rate, utterance.text
        ));
    }

    fn cancel(&self) {
        tracing::trace!("Console speech cancelled");
    }
}

/// Vibrator that prints the pattern
pub struct ConsoleVibrator {
    console: Console,
}

impl ConsoleVibrator {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl Vibrator for ConsoleVibrator {
    fn vibrate(&self, pattern: &[u32]) {
        let shape = pattern
            .iter()
            .map(|ms| ms.to_string())
            .collect::<Vec<_>>()
            .join("-");
        tracing::debug!("Vibrate {:?}", pattern);
        self.console.line(format_args!("[vibrate {}ms]", shape));
    }
}

/// Notifier that prints notifications; the console always grants permission
pub struct ConsoleNotifier {
    console: Console,
}

impl ConsoleNotifier {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl Notifier for ConsoleNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn show(&self, title: &str, body: &str) {
        self.console
            .line(format_args!("[notification] {}: {}", title, body));
    }
}

/// Camera whose "live stream" is a still image loaded from disk
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct StillImageStream {
    frame: RgbImage,
}

impl VideoStream for StillImageStream {
    fn current_frame(&mut self) -> Result<RgbImage, CameraError> {
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {}
}

#[async_trait]
impl CameraDevice for StillImageCamera {
    async fn open(
        &self,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        let path = self.path.clone();
        let decoded = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|e| CameraError::Unavailable(format!("camera task failed: {}", e)))?;

        match decoded {
            Ok(img) => Ok(Box::new(StillImageStream {
                frame: img.to_rgb8(),
            })),
            Err(image::ImageError::IoError(e)) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(CameraError::PermissionDenied)
            }
            Err(e) => Err(CameraError::Unavailable(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
