//! Rendering of the session into visible affordances
//!
//! A pure function of [`Session`]: which surfaces and controls are shown,
//! what the camera screen says, and whether the loading overlay is up.

use super::{CameraView, Screen, Session};
use serde::Serialize;

/// Visible state of the user-facing surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub screen: Screen,
    /// Mode title on the camera screen
    pub title: Option<&'static str>,
    /// Mode instruction on the camera screen
    pub instruction: Option<&'static str>,
    pub live_video_visible: bool,
    pub preview_visible: bool,
    pub capture_control_visible: bool,
    pub file_picker_visible: bool,
    pub retake_control_visible: bool,
    pub analyze_control_visible: bool,
    pub result_text: Option<String>,
    pub speak_control_visible: bool,
    pub loading: bool,
    pub settings_open: bool,
}

/// Render `session`
pub fn render(session: &Session) -> View {
    let screen = session.screen();
    let on_camera = screen == Screen::Camera;
    let live = on_camera && session.camera_view() == CameraView::Live;
    let preview = on_camera && session.camera_view() == CameraView::Preview;
    let pending = session.analysis_pending();
    let mode = session.mode().filter(|_| on_camera);

    View {
        screen,
        title: mode.map(|m| m.title()),
        instruction: mode.map(|m| m.instruction()),
        live_video_visible: live && session.camera_live(),
        preview_visible: preview,
        capture_control_visible: live && !pending,
        file_picker_visible: on_camera && !pending,
        retake_control_visible: preview && !pending,
        analyze_control_visible: preview && session.has_capture() && !pending,
        result_text: if screen == Screen::Result {
            session.result_text().map(str::to_string)
        } else {
            None
        },
        speak_control_visible: screen == Screen::Result,
        loading: pending,
        settings_open: session.settings_open(),
    }
}
