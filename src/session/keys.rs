//! Keyboard bindings
//!
//! Space and Enter on the camera screen capture when nothing is held and
//! analyse otherwise. Escape always goes home.

use super::Screen;
use std::str::FromStr;

/// Keys the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Enter,
    Escape,
    Other,
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "space" | " " => Key::Space,
            "enter" | "return" => Key::Enter,
            "esc" | "escape" => Key::Escape,
            _ => Key::Other,
        })
    }
}

/// Action bound to a key in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Capture,
    Analyze,
    GoHome,
}

/// Resolve `key` against the visible screen and whether a capture is held
pub fn action_for_key(key: Key, screen: Screen, has_capture: bool) -> Option<KeyAction> {
    match key {
        Key::Escape => Some(KeyAction::GoHome),
        Key::Space | Key::Enter if screen == Screen::Camera => Some(if has_capture {
            KeyAction::Analyze
        } else {
            KeyAction::Capture
        }),
        _ => None,
    }
}
