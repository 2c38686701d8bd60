//! Vision Assistant - accessible capture-and-analyze client
//!
//! Guides a user who may not see the screen through picking an analysis
//! mode, capturing an image from a camera or a file, sending it to the
//! remote analysis service, and hearing the result.

pub mod analysis;
pub mod camera;
pub mod capture;
pub mod config;
pub mod feedback;
pub mod platform;
pub mod session;
pub mod settings;
pub mod storage;

pub use analysis::{AnalysisClient, AnalysisError, AnalysisOrchestrator};
pub use config::AppConfig;
pub use session::{AnalyzeOutcome, Capabilities, Mode, Screen, SessionController};
pub use settings::{Settings, SettingsStore};

use std::path::Path;

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "vision-assistant.log";

/// Install the global tracing subscriber
///
/// Logs go to stderr and, when `log_dir` is given and writable, are also
/// appended to `<log_dir>/vision-assistant.log`. The filter comes from
/// `RUST_LOG` and defaults to `info`.
pub fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<()> {
    use tracing_subscriber::prelude::*;

    /// Format timestamps using the system's local time via chrono
    struct LocalTimer;
    impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
        fn format_time(
            &self,
            w: &mut tracing_subscriber::fmt::format::Writer<'_>,
        ) -> std::fmt::Result {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        }
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTimer);

    let log_file = log_dir.and_then(|dir| {
        let _ = std::fs::create_dir_all(dir);
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE_NAME))
            .ok()
    });

    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_timer(LocalTimer)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(())
}
