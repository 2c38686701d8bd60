//! Vision Assistant terminal host
//!
//! Drives a session from line commands on stdin. Speech, vibration and
//! notifications are printed to the console; the camera is either
//! unavailable or backed by a still image given with `--camera-image`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use vision_assistant::camera::{CameraDevice, UnavailableCamera};
use vision_assistant::capture::content_type_for_file;
use vision_assistant::platform::{
    Console, ConsoleNotifier, ConsoleSpeech, ConsoleVibrator, StillImageCamera,
};
use vision_assistant::session::{Key, KeyAction, View};
use vision_assistant::storage::{self, FileKeyValueStore};
use vision_assistant::{config, AnalyzeOutcome, Capabilities, Mode, SessionController, SettingsStore};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "vision-assistant")]
#[command(about = "Accessible capture-and-analyze assistant")]
#[command(version)]
struct Args {
    /// Analysis service origin (overrides the config file)
    #[arg(long, env = "VISION_ASSISTANT_SERVICE_URL")]
    service_url: Option<String>,

    /// Directory holding the persisted settings record
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Image file standing in for the live camera
    #[arg(long)]
    camera_image: Option<PathBuf>,

    /// Directory for the log file
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// One line of user input
#[derive(Debug, Clone, PartialEq)]
enum Command {
    SelectMode(Mode),
    Key(Key),
    File(PathBuf),
    Retake,
    Analyze,
    Speak,
    Settings,
    Speed(f64),
    Vibration(bool),
    AutoSpeak(bool),
    Status,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  1 | shelf, 2 | nav, 3 | ocr   select a mode
  space | enter                 capture, or analyze once a photo is held
  esc                           go home
  file <path>                   use an image file as the photo
  retake | analyze | speak      camera and result actions
  settings                      open or close the settings panel
  speed <0.5-2.0>               speech rate
  vibration on|off, autospeak on|off
  status | help | quit";

fn parse_switch(value: Option<&str>) -> Result<bool> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("on" | "true" | "1") => Ok(true),
        Some("off" | "false" | "0") => Ok(false),
        _ => bail!("expected on or off"),
    }
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, Some(rest.trim())),
        None => (line, None),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "space" | "enter" | "esc" | "escape" => Command::Key(word.parse()?),
        "file" => match rest {
            Some(path) if !path.is_empty() => Command::File(PathBuf::from(path)),
            _ => bail!("usage: file <path>"),
        },
        "retake" => Command::Retake,
        "analyze" | "analyse" => Command::Analyze,
        "speak" => Command::Speak,
        "settings" => Command::Settings,
        "speed" => {
            let value = rest.context("usage: speed <value>")?;
            Command::Speed(value.parse::<f64>().context("speed must be a number")?)
        }
        "vibration" => Command::Vibration(parse_switch(rest)?),
        "autospeak" => Command::AutoSpeak(parse_switch(rest)?),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::SelectMode(
            other
                .parse()
                .with_context(|| format!("unknown command: {} (type help)", other))?,
        ),
    };
    Ok(Some(command))
}

fn print_view(console: &Console, controller: &SessionController) {
    let view: View = controller.view();

    match view.title {
        Some(title) => console.line(format_args!("== {:?} | {}", view.screen, title)),
        None => console.line(format_args!("== {:?}", view.screen)),
    }
    if let Some(instruction) = view.instruction {
        console.line(format_args!("   {}", instruction));
    }

    let mut controls = Vec::new();
    if view.live_video_visible {
        controls.push("live");
    }
    if view.preview_visible {
        controls.push("preview");
    }
    if view.capture_control_visible {
        controls.push("[capture]");
    }
    if view.file_picker_visible {
        controls.push("[file]");
    }
    if view.retake_control_visible {
        controls.push("[retake]");
    }
    if view.analyze_control_visible {
        controls.push("[analyze]");
    }
    if view.speak_control_visible {
        controls.push("[speak]");
    }
    if !controls.is_empty() {
        console.line(format_args!("   {}", controls.join(" ")));
    }

    if view.loading {
        console.line(format_args!("   analysing..."));
    }
    if let Some(text) = &view.result_text {
        console.line(format_args!("   result: {}", text));
    }
    if view.settings_open {
        let settings = controller.settings();
        console.line(format_args!(
            "   settings: speed {:.1}, vibration {}, autospeak {}",
            settings.voice_speed,
            on_off(settings.vibration_enabled),
            on_off(settings.auto_speak_enabled)
        ));
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Run the analysis in the background so input keeps flowing
async fn spawn_analysis(controller: &SessionController, console: &Console) {
    let controller = controller.clone();
    let console = console.clone();
    tokio::spawn(async move {
        match controller.analyze().await {
            AnalyzeOutcome::Completed { .. } | AnalyzeOutcome::Failed(_) => {
                print_view(&console, &controller);
            }
            AnalyzeOutcome::NoCapture | AnalyzeOutcome::Discarded | AnalyzeOutcome::Ignored => {}
        }
    });
    // Let the task mark the session pending before the view is printed
    tokio::task::yield_now().await;
}

async fn dispatch(controller: &SessionController, console: &Console, command: Command) {
    match command {
        Command::SelectMode(mode) => {
            controller.select_mode(mode).await;
        }
        Command::Key(key) => match controller.key_action(key) {
            Some(KeyAction::Analyze) => spawn_analysis(controller, console).await,
            Some(_) => {
                controller.handle_key(key).await;
            }
            None => {}
        },
        Command::File(path) => match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let content_type = content_type_for_file(&path, &bytes);
                controller.capture_file(bytes, Some(content_type)).await;
            }
            Err(e) => console.line(format_args!("cannot read {}: {}", path.display(), e)),
        },
        Command::Retake => {
            controller.retake().await;
        }
        Command::Analyze => spawn_analysis(controller, console).await,
        Command::Speak => {
            controller.speak_result().await;
        }
        Command::Settings => {
            controller.toggle_settings_panel();
        }
        Command::Speed(speed) => report_saved(console, controller.set_voice_speed(speed)),
        Command::Vibration(on) => report_saved(console, controller.set_vibration_enabled(on)),
        Command::AutoSpeak(on) => report_saved(console, controller.set_auto_speak_enabled(on)),
        Command::Status => {
            let session = controller.snapshot();
            console.line(format_args!(
                "mode={:?} screen={:?} view={:?} capture={:?} pending={}",
                session.mode(),
                session.screen(),
                session.camera_view(),
                session.capture(),
                session.analysis_pending()
            ));
        }
        Command::Help => console.line(format_args!("{}", HELP)),
        Command::Quit => {}
    }
}

fn report_saved<E: std::fmt::Display>(
    console: &Console,
    result: std::result::Result<vision_assistant::Settings, E>,
) {
    match result {
        Ok(settings) => tracing::debug!("Settings now {:?}", settings),
        Err(e) => console.line(format_args!("settings not saved: {}", e)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_dir = args.log_dir.clone().unwrap_or_else(storage::log_dir);
    vision_assistant::init_logging(Some(&log_dir))?;

    let config_path = args.config.clone().unwrap_or_else(config::get_config_path);
    let mut app_config = config::load_config(&config_path)?;
    if let Some(url) = args.service_url {
        app_config.service.base_url = url;
    }

    let store = match args.settings_dir {
        Some(dir) => FileKeyValueStore::new(dir),
        None => FileKeyValueStore::in_data_dir(),
    };
    let settings = Arc::new(SettingsStore::load(Arc::new(store)));

    let console = Console::stdout();
    let camera: Arc<dyn CameraDevice> = match args.camera_image {
        Some(path) => {
            tracing::info!("Using {} as the camera", path.display());
            Arc::new(StillImageCamera::new(path))
        }
        None => Arc::new(UnavailableCamera),
    };
    let capabilities = Capabilities {
        camera,
        speech: Arc::new(ConsoleSpeech::new(console.clone())),
        vibrator: Arc::new(ConsoleVibrator::new(console.clone())),
        notifier: Arc::new(ConsoleNotifier::new(console.clone())),
    };

    let controller = SessionController::new(&app_config, settings, capabilities)
        .context("Failed to start session")?;
    controller.startup();

    {
        let controller = controller.clone();
        tokio::spawn(async move {
            if controller.service_available().await {
                tracing::info!("Analysis service reachable");
            } else {
                tracing::warn!("Analysis service not reachable; analysis will fail until it is up");
            }
        });
    }

    console.line(format_args!("{}", HELP));
    print_view(&console, &controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut quit_armed = false;
    let mut quit_requested = false;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                console.line(format_args!("{}", e));
                continue;
            }
        };

        if command == Command::Quit {
            if controller.should_warn_before_unload() && !quit_armed {
                console.line(format_args!(
                    "A photo has not been analysed yet. Type quit again to leave."
                ));
                quit_armed = true;
                continue;
            }
            quit_requested = true;
            break;
        }
        quit_armed = false;

        dispatch(&controller, &console, command).await;
        print_view(&console, &controller);
    }

    if !quit_requested {
        if let Some(notice) = input_closed_notice(&controller) {
            tracing::warn!("Input closed with an unanalysed capture");
            console.line(format_args!("{}", notice));
        }
    }

    controller.go_home().await;
    tracing::info!("Session closed");
    Ok(())
}

/// Warning for input ending while a capture still awaits analysis
fn input_closed_notice(controller: &SessionController) -> Option<&'static str> {
    controller
        .should_warn_before_unload()
        .then_some("Input closed: discarding a photo that was not analysed.")
}
