//! Capture pipeline
//!
//! Produces the single in-memory image payload that gets uploaded for
//! analysis, either by snapshotting the live stream or by accepting a
//! file the user picked. Both paths yield the same [`Capture`] value.

use crate::camera::{CameraError, CameraManager};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::fmt;
use std::path::Path;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Content type of stream snapshots
pub const SNAPSHOT_CONTENT_TYPE: &str = "image/jpeg";

/// Content type used when a file carries no usable type
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Capture error types
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Snapshot encoder task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Image payload held for analysis
#[derive(Clone, PartialEq, Eq)]
pub struct Capture {
    bytes: Vec<u8>,
    content_type: String,
}

impl Capture {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Accept a user-selected file as-is.
    ///
    /// Returns `None` for an empty selection. The bytes are not decoded or
    /// validated.
    pub fn from_file(bytes: Vec<u8>, declared_type: Option<&str>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let content_type = declared_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE);
        Some(Self::new(bytes, content_type))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Encode a frame as JPEG at `quality` (1-100)
pub fn encode_snapshot(frame: &RgbImage, quality: u8) -> Result<Capture, CaptureError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.encode_image(frame)?;

    tracing::debug!(
        "Snapshot encoded: {}x{} -> {} bytes",
        frame.width(),
        frame.height(),
        buf.len()
    );
    Ok(Capture::new(buf, SNAPSHOT_CONTENT_TYPE))
}

/// Snapshot the held stream and release the camera.
///
/// The camera lock is only held while grabbing the frame; encoding runs on
/// the blocking pool. The camera is released once the snapshot has been
/// encoded. On failure the stream stays live so the user can try again.
///
/// Returns `Ok(None)` when `cancel` fires during the encode. The camera is
/// then left alone, since it may already belong to a later visit.
pub async fn capture_from_stream(
    camera: &Mutex<CameraManager>,
    quality: u8,
    cancel: &CancellationToken,
) -> Result<Option<Capture>, CaptureError> {
    let frame = camera.lock().await.current_frame()?;
    let capture = tokio::task::spawn_blocking(move || encode_snapshot(&frame, quality)).await??;

    let mut camera = camera.lock().await;
    if cancel.is_cancelled() {
        tracing::debug!("Snapshot discarded: session moved on during encode");
        return Ok(None);
    }
    camera.release();
    Ok(Some(capture))
}

/// Guess an image content type from a file extension
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// Content type for a picked file: the extension first, then the file's
/// magic bytes, then [`FALLBACK_CONTENT_TYPE`]
pub fn content_type_for_file(path: &Path, bytes: &[u8]) -> &'static str {
    let by_extension = content_type_for_path(path);
    if by_extension != FALLBACK_CONTENT_TYPE {
        return by_extension;
    }
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraDevice, StreamConstraints, VideoStream};
    use crate::config::CameraConfig;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct GradientCamera;

    struct GradientStream;

    impl VideoStream for GradientStream {
        fn current_frame(&mut self) -> Result<RgbImage, CameraError> {
            Ok(RgbImage::from_fn(32, 24, |x, y| {
                image::Rgb([(x * 8) as u8, (y * 10) as u8, 128])
            }))
        }

        fn stop(&mut self) {}
    }

    #[async_trait]
    impl CameraDevice for GradientCamera {
        async fn open(
            &self,
            _constraints: &StreamConstraints,
        ) -> Result<Box<dyn VideoStream>, CameraError> {
            Ok(Box::new(GradientStream))
        }
    }

    #[test]
    fn test_empty_file_selection_is_ignored() {
        assert!(Capture::from_file(Vec::new(), Some("image/png")).is_none());
    }

    #[test]
    fn test_file_capture_keeps_declared_type() {
        let capture = Capture::from_file(vec![1, 2, 3], Some("image/png")).unwrap();
        assert_eq!(capture.content_type(), "image/png");
        assert_eq!(capture.bytes(), &[1, 2, 3]);

        let untyped = Capture::from_file(vec![1], Some("  ")).unwrap();
        assert_eq!(untyped.content_type(), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_snapshot_is_jpeg() {
        let frame = RgbImage::new(16, 16);
        let capture = encode_snapshot(&frame, 90).unwrap();

        assert_eq!(capture.content_type(), SNAPSHOT_CONTENT_TYPE);
        // SOI marker
        assert_eq!(&capture.bytes()[..2], &[0xFF, 0xD8]);
    }

    fn gradient_camera() -> Mutex<CameraManager> {
        Mutex::new(CameraManager::new(
            Arc::new(GradientCamera),
            StreamConstraints::from(&CameraConfig::default()),
        ))
    }

    #[tokio::test]
    async fn test_capture_from_stream_releases_camera() {
        let camera = gradient_camera();
        camera.lock().await.acquire().await.unwrap();

        let capture = capture_from_stream(&camera, 90, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert!(!capture.is_empty());
        assert_eq!(capture.content_type(), SNAPSHOT_CONTENT_TYPE);
        assert!(!camera.lock().await.is_held());
    }

    #[tokio::test]
    async fn test_capture_without_stream_fails() {
        let camera = gradient_camera();
        assert!(matches!(
            capture_from_stream(&camera, 90, &CancellationToken::new()).await,
            Err(CaptureError::Camera(CameraError::NotAcquired))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_capture_leaves_camera_held() {
        let camera = gradient_camera();
        camera.lock().await.acquire().await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let capture = capture_from_stream(&camera, 90, &cancel).await.unwrap();
        assert!(capture.is_none());
        assert!(camera.lock().await.is_held());
    }

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(content_type_for_path(Path::new("a/shelf.JPG")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("sign.png")), "image/png");
        assert_eq!(content_type_for_path(Path::new("notes")), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_content_type_sniffed_when_extension_unknown() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

        assert_eq!(content_type_for_file(Path::new("IMG_0042"), png), "image/png");
        assert_eq!(content_type_for_file(Path::new("photo.upload"), &jpeg), "image/jpeg");
        // Extension wins over content
        assert_eq!(content_type_for_file(Path::new("shelf.jpg"), png), "image/jpeg");
        assert_eq!(
            content_type_for_file(Path::new("notes.txt"), b"plain text"),
            FALLBACK_CONTENT_TYPE
        );
    }
}
