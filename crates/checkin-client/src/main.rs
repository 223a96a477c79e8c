use anyhow::{Context, Result};
use checkin_client::admin::Dialog;
use checkin_client::{
    AdminPanel, Backend, ClientConfig, EventSelector, HttpBackend, IdentifyOutcome,
    IdentifyWorkflow, RegisterWorkflow,
};
use checkin_core::EventId;
use checkin_hw::{Camera, CameraError, CameraState, StillSource, VideoSource};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "checkin", about = "Face check-in client", version)]
struct Cli {
    /// Backend base URL (overrides config and CHECKIN_SERVER_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage events
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },
    /// List registered faces
    Faces,
    /// Capture a face and look it up within an event
    Identify {
        /// Event to match against
        #[arg(short, long)]
        event: EventId,
        /// Use an image file instead of the camera
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Capture a face and register it for an event
    Register {
        #[arg(short, long)]
        event: EventId,
        /// Person's name
        #[arg(short, long)]
        name: String,
        /// Use an image file instead of the camera
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// List V4L2 capture devices
    Cameras,
}

#[derive(Subcommand)]
enum EventsAction {
    /// List all events
    List,
    /// Create an event
    Add { name: String },
    /// Rename an event; prompts when --name is absent
    Rename {
        id: EventId,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Delete an event and its faces
    Delete { id: EventId },
}

/// Alerts on stderr, prompts on stdin. A preset answer skips the prompt.
struct TerminalDialog {
    preset: Option<String>,
}

impl Dialog for TerminalDialog {
    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn prompt(&mut self, message: &str) -> Option<String> {
        if let Some(answer) = self.preset.take() {
            return Some(answer);
        }
        eprint!("{message} ");
        std::io::stderr().flush().ok()?;
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkin=warn,checkin_client=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::load().context("failed to load client config")?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    let backend = HttpBackend::new(&config.server_url)
        .with_context(|| format!("failed to create client for {}", config.server_url))?;
    tracing::debug!(server = %backend.base_url(), "using backend");

    match cli.command {
        Commands::Events { action } => run_events(backend, action).await,
        Commands::Faces => {
            let faces = backend.list_faces().await.context("failed to list faces")?;
            if faces.is_empty() {
                println!("No faces registered");
            }
            for face in faces {
                println!("{}\t{}\t{} ({})", face.id, face.name, face.event_name, face.event_id);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Identify { event, image } => match image {
            Some(path) => run_identify(backend, event, || StillSource::open(&path)).await,
            None => {
                run_identify(backend, event, || {
                    Camera::open(&config.camera_device, config.warmup_frames)
                })
                .await
            }
        },
        Commands::Register { event, name, image } => match image {
            Some(path) => run_register(backend, event, name, || StillSource::open(&path)).await,
            None => {
                run_register(backend, event, name, || {
                    Camera::open(&config.camera_device, config.warmup_frames)
                })
                .await
            }
        },
        Commands::Cameras => Ok(list_cameras()),
    }
}

async fn run_events(backend: HttpBackend, action: EventsAction) -> Result<ExitCode> {
    let mut panel = AdminPanel::new(backend);
    let mut dialog = TerminalDialog { preset: None };

    let result = match action {
        EventsAction::List => panel.load().await.map(|_| ()),
        EventsAction::Add { name } => panel.create(&name, &mut dialog).await,
        EventsAction::Rename { id, name } => {
            dialog.preset = name;
            panel.update(id, &mut dialog).await
        }
        EventsAction::Delete { id } => panel.delete(id).await,
    };

    for row in panel.rows() {
        println!("{}\t{}", row.id, row.label);
    }
    if let Some(banner) = panel.banner() {
        eprintln!("{banner}");
    }
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            tracing::debug!(error = %err, "event command failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run_identify<V, F>(backend: HttpBackend, event: EventId, open: F) -> Result<ExitCode>
where
    V: VideoSource,
    F: FnOnce() -> Result<V, CameraError>,
{
    let mut workflow: IdentifyWorkflow<_, V> = IdentifyWorkflow::new(backend);
    workflow.load_events().await.context("failed to load events")?;
    choose_event(workflow.events_mut(), event);

    let denied = matches!(workflow.init_camera(open), CameraState::Denied(_));
    if denied {
        eprintln!("{}", workflow.result());
        return Ok(ExitCode::FAILURE);
    }

    let outcome = workflow.capture_and_identify().await;
    println!("{}", workflow.result());
    Ok(match outcome {
        Ok(IdentifyOutcome::Matched(_)) => ExitCode::SUCCESS,
        Ok(IdentifyOutcome::NoMatch(_)) | Err(_) => ExitCode::FAILURE,
    })
}

async fn run_register<V, F>(
    backend: HttpBackend,
    event: EventId,
    name: String,
    open: F,
) -> Result<ExitCode>
where
    V: VideoSource,
    F: FnOnce() -> Result<V, CameraError>,
{
    let mut workflow: RegisterWorkflow<_, V> = RegisterWorkflow::new(backend);
    workflow.load_events().await.context("failed to load events")?;

    let state = workflow.init_camera(open).clone();
    eprintln!("{}", workflow.status());
    if let CameraState::Denied(reason) = state {
        tracing::debug!(%reason, "camera unavailable");
        return Ok(ExitCode::FAILURE);
    }

    let form = workflow.form_mut();
    form.name = name;
    choose_event(&mut form.events, event);

    workflow.capture();
    eprintln!("{}", workflow.status());

    let result = workflow.submit().await;
    println!("{}", workflow.status());
    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Select `event`, or list the events that could have been chosen. An
/// unlisted event leaves the placeholder selected for the workflow to refuse.
fn choose_event(selector: &mut EventSelector, event: EventId) -> bool {
    if selector.select(event) {
        if let Some(chosen) = selector.selected_event() {
            tracing::info!(event = %chosen.id, name = %chosen.name, "event selected");
        }
        return true;
    }
    tracing::warn!(%event, "event is not listed");
    eprintln!("Event {event} is not listed. Choose one of:");
    for (value, label) in selector.options() {
        if !value.is_empty() {
            eprintln!("  {value}\t{label}");
        }
    }
    false
}

fn list_cameras() -> ExitCode {
    let devices = Camera::list_devices();
    if devices.is_empty() {
        println!("No V4L2 capture devices found");
        return ExitCode::FAILURE;
    }
    for device in devices {
        println!("{}\t{} [{}] {}", device.path, device.name, device.driver, device.bus);
    }
    ExitCode::SUCCESS
}
