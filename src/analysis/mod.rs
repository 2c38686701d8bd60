//! Analysis orchestration
//!
//! Sends the current capture to the endpoint of the active mode and
//! classifies the outcome. At most one request is in flight at a time;
//! a second call while one is pending is rejected with
//! [`AnalysisError::Busy`] rather than queued.

pub mod client;

pub use client::{AnalysisClient, AnalysisResponse};

use crate::capture::Capture;
use crate::session::Mode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Analysis error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Analysis request failed: {0}")]
    Transport(String),

    #[error("Analysis service returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Analysis failed: {0}")]
    Semantic(String),

    #[error("An analysis is already in progress")]
    Busy,
}

impl AnalysisError {
    /// Network failures and non-2xx statuses
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AnalysisError::Transport(_) | AnalysisError::HttpStatus { .. }
        )
    }
}

/// Resets the in-flight flag when the request completes or is dropped
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single-flight wrapper around [`AnalysisClient`]
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    client: AnalysisClient,
    in_flight: Arc<AtomicBool>,
}

impl AnalysisOrchestrator {
    pub fn new(client: AnalysisClient) -> Self {
        Self {
            client,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn client(&self) -> &AnalysisClient {
        &self.client
    }

    /// Whether a request is currently pending
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Analyse `capture` with the endpoint for `mode`.
    ///
    /// Never retries. Dropping the returned future aborts the request and
    /// frees the orchestrator.
    pub async fn analyze(&self, mode: Mode, capture: &Capture) -> Result<String, AnalysisError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::warn!("Analysis already in flight, rejecting request");
            return Err(AnalysisError::Busy);
        }
        let _guard = InFlightGuard(self.in_flight.clone());

        tracing::info!(
            "Analysis started: mode={}, {} bytes ({})",
            mode,
            capture.len(),
            capture.content_type()
        );
        let started = Instant::now();

        match self.client.analyze(mode, capture).await {
            Ok(text) => {
                tracing::info!(
                    "Analysis completed in {}ms ({} chars)",
                    started.elapsed().as_millis(),
                    text.chars().count()
                );
                Ok(text)
            }
            Err(e) => {
                tracing::error!(
                    "Analysis failed after {}ms: {}",
                    started.elapsed().as_millis(),
                    e
                );
                Err(e)
            }
        }
    }
}
