//! Camera lifecycle management
//!
//! Owns the single live video stream. A stream must be released before
//! another one can be acquired, and release is idempotent. Acquisition
//! failures are returned to the caller, never retried here.

use crate::config::{CameraConfig, CameraFacing};
use async_trait::async_trait;
use image::RgbImage;
use std::sync::Arc;

/// Hints passed to the platform when opening a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: CameraFacing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl From<&CameraConfig> for StreamConstraints {
    fn from(config: &CameraConfig) -> Self {
        Self {
            facing: config.facing,
            ideal_width: config.ideal_width,
            ideal_height: config.ideal_height,
        }
    }
}

/// Camera error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("A camera stream is already held")]
    AlreadyAcquired,

    #[error("No camera stream is held")]
    NotAcquired,

    #[error("Failed to read camera frame: {0}")]
    Frame(String),
}

/// Live video acquisition capability
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Open an exclusive live stream, waiting for the platform to grant or deny access
    async fn open(&self, constraints: &StreamConstraints)
        -> Result<Box<dyn VideoStream>, CameraError>;
}

/// An open live stream
pub trait VideoStream: Send {
    /// The frame currently shown by the stream
    fn current_frame(&mut self) -> Result<RgbImage, CameraError>;

    /// Stop every underlying track
    fn stop(&mut self);
}

/// Camera device for environments without camera support
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCamera;

#[async_trait]
impl CameraDevice for UnavailableCamera {
    async fn open(
        &self,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        Err(CameraError::Unavailable("no camera device".to_string()))
    }
}

/// Holder of the single live stream
pub struct CameraManager {
    device: Arc<dyn CameraDevice>,
    constraints: StreamConstraints,
    stream: Option<Box<dyn VideoStream>>,
}

impl CameraManager {
    pub fn new(device: Arc<dyn CameraDevice>, constraints: StreamConstraints) -> Self {
        Self {
            device,
            constraints,
            stream: None,
        }
    }

    /// Whether a live stream is currently held
    pub fn is_held(&self) -> bool {
        self.stream.is_some()
    }

    /// Open a live stream and hold it
    ///
    /// Fails with [`CameraError::AlreadyAcquired`] if a stream is already
    /// held; callers must release first.
    pub async fn acquire(&mut self) -> Result<(), CameraError> {
        if self.stream.is_some() {
            tracing::warn!("Camera acquire requested while a stream is held");
            return Err(CameraError::AlreadyAcquired);
        }

        tracing::debug!(
            "Opening camera: facing={:?}, ideal={}x{}",
            self.constraints.facing,
            self.constraints.ideal_width,
            self.constraints.ideal_height
        );

        match self.device.open(&self.constraints).await {
            Ok(stream) => {
                self.stream = Some(stream);
                tracing::info!("Camera stream acquired");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Camera acquisition failed: {}", e);
                Err(e)
            }
        }
    }

    /// Stop and drop the held stream. Returns whether a stream was held.
    pub fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop();
                tracing::info!("Camera stream released");
                true
            }
            None => false,
        }
    }

    /// Read the current frame of the held stream
    pub fn current_frame(&mut self) -> Result<RgbImage, CameraError> {
        self.stream
            .as_mut()
            .ok_or(CameraError::NotAcquired)?
            .current_frame()
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Counters {
        opened: Mutex<u32>,
        stopped: Arc<Mutex<u32>>,
    }

    struct CountingCamera {
        counters: Arc<Counters>,
        deny: bool,
    }

    struct CountingStream {
        stopped: Arc<Mutex<u32>>,
    }

    impl VideoStream for CountingStream {
        fn current_frame(&mut self) -> Result<RgbImage, CameraError> {
            Ok(RgbImage::new(4, 4))
        }

        fn stop(&mut self) {
            *self.stopped.lock() += 1;
        }
    }

    #[async_trait]
    impl CameraDevice for CountingCamera {
        async fn open(
            &self,
            _constraints: &StreamConstraints,
        ) -> Result<Box<dyn VideoStream>, CameraError> {
            if self.deny {
                return Err(CameraError::PermissionDenied);
            }
            *self.counters.opened.lock() += 1;
            Ok(Box::new(CountingStream {
                stopped: self.counters.stopped.clone(),
            }))
        }
    }

    fn manager(deny: bool) -> (CameraManager, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let device = Arc::new(CountingCamera {
            counters: counters.clone(),
            deny,
        });
        let constraints = StreamConstraints::from(&CameraConfig::default());
        (CameraManager::new(device, constraints), counters)
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let (mut camera, counters) = manager(false);

        camera.acquire().await.unwrap();
        assert!(camera.is_held());
        assert!(camera.current_frame().is_ok());

        assert!(camera.release());
        assert!(!camera.is_held());
        assert_eq!(*counters.opened.lock(), 1);
        assert_eq!(*counters.stopped.lock(), 1);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let (mut camera, counters) = manager(false);
        camera.acquire().await.unwrap();

        assert!(camera.release());
        assert!(!camera.release());
        assert!(!camera.release());
        assert_eq!(*counters.stopped.lock(), 1);
    }

    #[tokio::test]
    async fn test_second_acquire_rejected() {
        let (mut camera, counters) = manager(false);
        camera.acquire().await.unwrap();

        assert_eq!(camera.acquire().await, Err(CameraError::AlreadyAcquired));
        assert_eq!(*counters.opened.lock(), 1);
    }

    #[tokio::test]
    async fn test_denied_acquire_holds_nothing() {
        let (mut camera, _) = manager(true);

        assert_eq!(camera.acquire().await, Err(CameraError::PermissionDenied));
        assert!(!camera.is_held());
        assert_eq!(camera.current_frame(), Err(CameraError::NotAcquired));
    }

    #[tokio::test]
    async fn test_unavailable_camera() {
        let mut camera = CameraManager::new(
            Arc::new(UnavailableCamera),
            StreamConstraints::from(&CameraConfig::default()),
        );
        assert!(matches!(
            camera.acquire().await,
            Err(CameraError::Unavailable(_))
        ));
    }
}
