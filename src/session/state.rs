//! Session state machine
//!
//! Defines the screens, the events that move between them, and the
//! session record (mode, screen, capture) they act on. The machine is
//! pure: it never touches the camera, the network or the feedback
//! channels. [`super::SessionController`] sequences those around it.

use super::Mode;
use crate::capture::Capture;
use serde::{Deserialize, Serialize};

/// Currently visible screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Mode selection
    #[default]
    Home,
    /// Live view or captured preview
    Camera,
    /// Analysis result
    Result,
}

/// Visible sub-state of the camera screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraView {
    /// Live stream (or nothing, if acquisition failed)
    #[default]
    Live,
    /// Static preview of the held capture
    Preview,
}

/// Events that can trigger state transitions
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// User picked an analysis mode
    SelectMode(Mode),
    /// Live stream acquired for the camera screen
    CameraStarted,
    /// Live stream could not be acquired
    CameraFailed,
    /// A capture was produced from the stream or a file
    Captured(Capture),
    /// User discarded the capture
    Retake,
    /// Upload of the held capture started
    AnalysisStarted,
    /// Service returned a result
    AnalysisSucceeded { text: String },
    /// Upload or interpretation failed
    AnalysisFailed { error: String },
    /// User returned to mode selection
    GoHome,
    /// User opened or closed the settings overlay
    ToggleSettings,
}

/// Reason for a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    ModeSelected { mode: Mode },
    CameraStarted,
    CameraFailed,
    CaptureTaken,
    Retake,
    AnalysisStarted,
    AnalysisSucceeded,
    AnalysisFailed { message: String },
    NavigatedHome,
    SettingsToggled { open: bool },
}

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: Screen,
    pub to: Screen,
    pub camera_view: CameraView,
    pub reason: TransitionReason,
}

/// Top-level session record
///
/// Owned by the controller; all mutation goes through [`Session::process_event`].
#[derive(Debug, Clone)]
pub struct Session {
    mode: Option<Mode>,
    screen: Screen,
    camera_view: CameraView,
    camera_live: bool,
    capture: Option<Capture>,
    result_text: Option<String>,
    analysis_pending: bool,
    settings_open: bool,
}

impl Session {
    /// Creates a session on the Home screen
    pub fn new() -> Self {
        Self {
            mode: None,
            screen: Screen::Home,
            camera_view: CameraView::Live,
            camera_live: false,
            capture: None,
            result_text: None,
            analysis_pending: false,
            settings_open: false,
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn camera_view(&self) -> CameraView {
        self.camera_view
    }

    /// Whether the camera screen shows a live stream
    pub fn camera_live(&self) -> bool {
        self.camera_live
    }

    pub fn capture(&self) -> Option<&Capture> {
        self.capture.as_ref()
    }

    pub fn has_capture(&self) -> bool {
        self.capture.is_some()
    }

    /// Text of the displayed result
    pub fn result_text(&self) -> Option<&str> {
        self.result_text.as_deref()
    }

    pub fn analysis_pending(&self) -> bool {
        self.analysis_pending
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    /// Whether leaving now would discard a capture that has no result yet
    pub fn should_warn_before_unload(&self) -> bool {
        self.capture.is_some() && self.screen != Screen::Result
    }

    /// Process an event and return the transition if one occurred
    ///
    /// Returns `None` if the event is not valid for the current state.
    pub fn process_event(&mut self, event: SessionEvent) -> Option<Transition> {
        let from = self.screen;

        let reason = match (self.screen, self.camera_view, event) {
            // HOME
            (Screen::Home, _, SessionEvent::SelectMode(mode)) => {
                self.mode = Some(mode);
                self.capture = None;
                self.result_text = None;
                self.enter(Screen::Camera, CameraView::Live);
                TransitionReason::ModeSelected { mode }
            }

            // CAMERA
            (Screen::Camera, CameraView::Live, SessionEvent::CameraStarted) => {
                self.camera_live = true;
                TransitionReason::CameraStarted
            }
            (Screen::Camera, CameraView::Live, SessionEvent::CameraFailed) => {
                self.camera_live = false;
                TransitionReason::CameraFailed
            }
            (Screen::Camera, _, SessionEvent::Captured(capture)) if !self.analysis_pending => {
                self.capture = Some(capture);
                self.camera_live = false;
                self.camera_view = CameraView::Preview;
                TransitionReason::CaptureTaken
            }
            (Screen::Camera, CameraView::Preview, SessionEvent::Retake)
                if !self.analysis_pending =>
            {
                self.capture = None;
                self.camera_view = CameraView::Live;
                TransitionReason::Retake
            }
            (Screen::Camera, CameraView::Preview, SessionEvent::AnalysisStarted)
                if !self.analysis_pending && self.capture.is_some() =>
            {
                self.analysis_pending = true;
                TransitionReason::AnalysisStarted
            }
            (Screen::Camera, _, SessionEvent::AnalysisSucceeded { text })
                if self.analysis_pending =>
            {
                self.analysis_pending = false;
                self.result_text = Some(text);
                self.enter(Screen::Result, CameraView::Preview);
                TransitionReason::AnalysisSucceeded
            }
            (Screen::Camera, _, SessionEvent::AnalysisFailed { error }) if self.analysis_pending => {
                self.analysis_pending = false;
                TransitionReason::AnalysisFailed { message: error }
            }

            // ANY SCREEN
            (_, _, SessionEvent::GoHome) => {
                self.mode = None;
                self.capture = None;
                self.result_text = None;
                self.analysis_pending = false;
                self.camera_live = false;
                self.enter(Screen::Home, CameraView::Live);
                TransitionReason::NavigatedHome
            }
            (_, _, SessionEvent::ToggleSettings) => {
                self.settings_open = !self.settings_open;
                TransitionReason::SettingsToggled {
                    open: self.settings_open,
                }
            }

            // Invalid transitions
            (screen, view, event) => {
                tracing::debug!(
                    "Ignoring session event {:?} on {:?} ({:?}, pending={})",
                    event,
                    screen,
                    view,
                    self.analysis_pending
                );
                return None;
            }
        };

        let transition = Transition {
            from,
            to: self.screen,
            camera_view: self.camera_view,
            reason,
        };

        tracing::info!(
            "Session transition: {:?} -> {:?} (reason: {:?})",
            transition.from,
            transition.to,
            transition.reason
        );

        Some(transition)
    }

    fn enter(&mut self, screen: Screen, camera_view: CameraView) {
        self.screen = screen;
        self.camera_view = camera_view;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
