//! User session
//!
//! Tracks which mode and screen the user is on and sequences every user
//! action through the camera, capture, analysis and feedback subsystems.
//!
//! ## Screens
//!
//! ```text
//! Home --select mode--> Camera(live) --capture--> Camera(preview)
//!                            ^                          |   |
//!                            +---------retake-----------+   |
//!                                                       analyze
//!                                                           v
//!                      Home <--------go home---------- Result
//! ```
//!
//! Escape (go home) is accepted from every screen.

pub mod controller;
pub mod keys;
pub mod mode;
pub mod state;
pub mod view;

pub use controller::{AnalyzeOutcome, Capabilities, SessionController};
pub use keys::{Key, KeyAction};
pub use mode::Mode;
pub use state::{CameraView, Screen, Session, SessionEvent, Transition, TransitionReason};
pub use view::View;
