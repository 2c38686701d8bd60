//! Analysis modes
//!
//! A mode is the user's analysis intent. It decides the prompt shown on
//! the camera screen and the remote endpoint the capture is sent to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selected analysis intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Shelf occupancy and product analysis
    Shelf,
    /// In-store navigation guidance
    Navigation,
    /// Text extraction
    TextReading,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Shelf, Mode::Navigation, Mode::TextReading];

    /// Endpoint path segment under the service API base
    pub fn endpoint(self) -> &'static str {
        match self {
            Mode::Shelf => "analyze-shelf",
            Mode::Navigation => "analyze-navigation",
            Mode::TextReading => "extract-text",
        }
    }

    /// Camera screen title
    pub fn title(self) -> &'static str {
        match self {
            Mode::Shelf => "Raf Tarama",
            Mode::Navigation => "Mağaza Navigasyonu",
            Mode::TextReading => "Metin Okuma",
        }
    }

    /// Camera screen instruction
    pub fn instruction(self) -> &'static str {
        match self {
            Mode::Shelf => "Kamerayı rafa doğrultun ve fotoğraf çekin",
            Mode::Navigation => "Kamerayı mağaza içine doğrultun",
            Mode::TextReading => "Kamerayı metin içeren yüzeye doğrultun",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Shelf => "shelf",
            Mode::Navigation => "navigation",
            Mode::TextReading => "text_reading",
        };
        f.write_str(name)
    }
}

/// Error returned when a mode name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "shelf" => Ok(Mode::Shelf),
            "2" | "nav" | "navigation" => Ok(Mode::Navigation),
            "3" | "ocr" | "text" | "text_reading" => Ok(Mode::TextReading),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}
