use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, Sender};

use facecapture_core::camera::domain::camera_session::AuthorizationStatus;
use facecapture_core::camera::infrastructure::scripted_camera::ScriptedCamera;
use facecapture_core::capture::domain::quality_validator::{QualityValidator, QualityVerdict};
use facecapture_core::capture::domain::status_presenter::StatusPresenter;
use facecapture_core::detection::infrastructure::scripted_face_detector::{
    ScriptStep, ScriptedFaceDetector,
};
use facecapture_core::flow::begin_verification::{
    begin_verification, PresentationHost, PresentationStyle,
};
use facecapture_core::flow::capture_coordinator::CaptureDependencies;
use facecapture_core::flow::result_delegate::CaptureOutcome;
use facecapture_core::flow::ui_context::{UiHandle, UserAction};
use facecapture_core::shared::captured_image::CapturedImage;
use facecapture_core::shared::config::CaptureConfig;

const OPERATOR_TICK: Duration = Duration::from_millis(50);

/// Face-gated photo capture: quality checks and flow simulation.
#[derive(Parser)]
#[command(name = "facecapture")]
struct Cli {
    /// JSON config file (defaults to the user config, then built-in defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimum long-edge resolution in pixels.
    #[arg(long, global = true)]
    min_resolution: Option<u32>,

    /// Minimum encoded size in bytes at maximum JPEG quality.
    #[arg(long, global = true)]
    min_bytes: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a still image against the quality thresholds.
    Validate {
        /// Image file to check.
        image: PathBuf,
    },

    /// Run the capture flow against a scripted camera and detector.
    Simulate {
        /// Image returned by the scripted camera's shutter.
        still: Option<PathBuf>,

        /// Face count seen in each frame (`x` for a detection failure);
        /// the last entry repeats.
        #[arg(long, value_delimiter = ',', default_value = "0,0,1")]
        faces: Vec<String>,

        /// Camera permission: authorized, grant, deny, denied, restricted.
        #[arg(long, default_value = "authorized")]
        permission: String,

        /// Capture attempts before giving up on low-quality stills.
        #[arg(long, default_value = "1")]
        attempts: usize,

        /// Seconds to wait for the flow to settle.
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Validate { image } => run_validate(&image, &config),
        Command::Simulate {
            still,
            faces,
            permission,
            attempts,
            timeout,
        } => run_simulate(
            still.as_deref(),
            &faces,
            &permission,
            attempts,
            Duration::from_secs(timeout),
            config,
        ),
    }
}

fn load_config(cli: &Cli) -> Result<CaptureConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => CaptureConfig::load_from(path)?,
        None => CaptureConfig::load(),
    };
    if let Some(min_resolution) = cli.min_resolution {
        config.min_resolution = min_resolution;
    }
    if let Some(min_bytes) = cli.min_bytes {
        config.min_encoded_bytes = min_bytes;
    }
    Ok(config)
}

fn run_validate(image: &Path, config: &CaptureConfig) -> Result<(), Box<dyn std::error::Error>> {
    let still = CapturedImage::open(image)?;
    let validator = QualityValidator::from_config(config);

    match validator.validate(&still) {
        QualityVerdict::Accepted => {
            println!(
                "Accepted: {} ({}x{})",
                image.display(),
                still.width(),
                still.height()
            );
            Ok(())
        }
        QualityVerdict::Rejected(reason) => Err(format!("Rejected: {reason}").into()),
    }
}

fn run_simulate(
    still: Option<&Path>,
    faces: &[String],
    permission: &str,
    attempts: usize,
    timeout: Duration,
    config: CaptureConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let still = still.map(CapturedImage::open).transpose()?;
    let script = parse_script(faces)?;
    let camera = build_camera(still, permission)?;

    let (alert_tx, alert_rx) = crossbeam_channel::unbounded();
    let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded::<CaptureOutcome>();
    let deps = CaptureDependencies {
        camera: Box::new(camera),
        face_detector: Arc::new(ScriptedFaceDetector::new(script)),
        presenter: Arc::new(LogPresenter { alerts: alert_tx }),
        delegate: Box::new(outcome_tx),
    };

    let mut host = LogHost;
    let flow = begin_verification(&mut host, deps, config, PresentationStyle::Present, true)?;
    let outcome = operate(flow.ui(), &outcome_rx, &alert_rx, attempts, timeout);
    flow.wait();

    match outcome.or_else(|| outcome_rx.try_recv().ok()) {
        Some(CaptureOutcome::Accepted(image)) => {
            println!("Accepted {}x{} still", image.width(), image.height());
            Ok(())
        }
        Some(CaptureOutcome::Failed(e)) => Err(e.into()),
        None => Err("capture flow produced no outcome".into()),
    }
}

/// Plays the user: presses capture and approve until the flow settles,
/// acknowledging quality alerts and retrying up to `attempts` times.
fn operate(
    ui: &UiHandle,
    outcomes: &Receiver<CaptureOutcome>,
    alerts: &Receiver<String>,
    attempts: usize,
    timeout: Duration,
) -> Option<CaptureOutcome> {
    let deadline = Instant::now() + timeout;
    let mut rejected = 0;

    while Instant::now() < deadline {
        if let Ok(outcome) = outcomes.recv_timeout(OPERATOR_TICK) {
            return Some(outcome);
        }
        if let Ok(alert) = alerts.try_recv() {
            rejected += 1;
            eprintln!("Alert: {}", alert.replace('\n', " "));
            ui.send_action(UserAction::AcknowledgeAlert);
            if rejected >= attempts {
                ui.send_action(UserAction::Dismiss);
                return outcomes.recv_timeout(timeout).ok();
            }
            continue;
        }
        ui.send_action(UserAction::Capture);
        ui.send_action(UserAction::Approve);
    }

    log::warn!("Flow did not settle within {timeout:?}; dismissing");
    ui.send_action(UserAction::Dismiss);
    outcomes.recv_timeout(timeout).ok()
}

fn parse_script(faces: &[String]) -> Result<Vec<ScriptStep>, Box<dyn std::error::Error>> {
    faces
        .iter()
        .map(|entry| match entry.trim() {
            "x" | "X" => Ok(ScriptStep::Fail),
            n => n
                .parse::<usize>()
                .map(ScriptStep::Faces)
                .map_err(|_| -> Box<dyn std::error::Error> {
                    format!("invalid face count '{n}'").into()
                }),
        })
        .collect()
}

fn build_camera(
    still: Option<CapturedImage>,
    permission: &str,
) -> Result<ScriptedCamera, Box<dyn std::error::Error>> {
    let camera = ScriptedCamera::new(still);
    let camera = match permission {
        "authorized" => camera,
        "grant" => camera
            .with_authorization(AuthorizationStatus::NotDetermined)
            .granting_access(true),
        "deny" => camera
            .with_authorization(AuthorizationStatus::NotDetermined)
            .granting_access(false),
        "denied" => camera.with_authorization(AuthorizationStatus::Denied),
        "restricted" => camera.with_authorization(AuthorizationStatus::Restricted),
        other => return Err(format!("unknown permission '{other}'").into()),
    };
    Ok(camera)
}

struct LogHost;

impl PresentationHost for LogHost {
    fn show_capture_screen(&mut self, style: PresentationStyle, animated: bool, _ui: UiHandle) {
        log::info!("Showing capture screen ({style:?}, animated: {animated})");
    }
}

struct LogPresenter {
    alerts: Sender<String>,
}

impl StatusPresenter for LogPresenter {
    fn present(&self, message: &str, duration: Duration) {
        log::info!("[{:.1}s] {message}", duration.as_secs_f64());
    }

    fn present_alert(&self, title: &str, message: &str, action_title: &str) {
        log::info!("{title}: {message} [{action_title}]");
        let _ = self.alerts.send(message.to_string());
    }
}
