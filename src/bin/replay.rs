use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use finderid_notifier::bus::HubEvent;
use finderid_notifier::delivery::{
    AudioOutput, DeliveryError, SynthToneEmitter, ToneClip, TracingToastSink,
    UnsupportedPermissionBroker,
};
use finderid_notifier::directory::{Directory, InMemoryDirectory, RestDirectory};
use finderid_notifier::feed::{ChangeEvent, InMemoryChangeFeed};
use finderid_notifier::{
    init_tracing, DeliverySinks, NotificationHub, NotifierError, NotifierSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_SETTLE_MS: u64 = 200;

/// Logs rendered clips instead of playing them.
struct LoggedAudio;

impl AudioOutput for LoggedAudio {
    fn write(&self, clip: &ToneClip) -> Result<(), DeliveryError> {
        tracing::debug!(
            samples = clip.samples.len(),
            duration_secs = clip.duration_secs(),
            "tone rendered"
        );
        Ok(())
    }
}

struct ReplayOptions {
    user_id: String,
    mcard_id: Option<String>,
    settings_path: Option<PathBuf>,
    names: Vec<(String, String)>,
    settle: Duration,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(error) = run().await {
        eprintln!("replay failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), NotifierError> {
    let Some(options) = parse_args().map_err(NotifierError::Usage)? else {
        return Ok(());
    };

    let settings = match &options.settings_path {
        Some(path) => NotifierSettings::load(path)?,
        None => NotifierSettings::from_env()?,
    };

    let directory: Arc<dyn Directory> = match settings.directory() {
        Some(config) => Arc::new(RestDirectory::new(config)?),
        None => {
            let directory = InMemoryDirectory::new();
            for (user_id, name) in &options.names {
                directory.insert_user(user_id.clone(), name.clone());
            }
            Arc::new(directory)
        }
    };

    let feed = Arc::new(InMemoryChangeFeed::new());
    let sinks = DeliverySinks {
        tones: Arc::new(SynthToneEmitter::new(LoggedAudio)),
        toasts: Arc::new(TracingToastSink),
        permission: Arc::new(UnsupportedPermissionBroker),
    };
    let hub = NotificationHub::new(settings, feed.clone(), directory, sinks);

    let mut events = hub.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match event.event {
                    HubEvent::Delivered { notification } => {
                        match serde_json::to_string(&notification) {
                            Ok(line) => println!("{line}"),
                            Err(error) => {
                                tracing::warn!(error = %error, "failed to encode notification")
                            }
                        }
                    }
                    HubEvent::Toggled { enabled: false } => break,
                    _ => {}
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("printer lagged, dropped {n} hub events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    hub.set_identity(Some(options.user_id.clone()), options.mcard_id.clone())
        .await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<ChangeEvent>(trimmed) {
            Ok(event) => {
                feed.publish(event);
            }
            Err(error) => {
                tracing::warn!(line = line_no, error = %error, "skipping invalid change event")
            }
        }
    }

    tokio::time::sleep(options.settle).await;
    hub.toggle_notifications().await;
    printer
        .await
        .map_err(|e| NotifierError::Usage(format!("printer task failed: {e}")))?;

    tracing::info!(
        published = feed.published_count(),
        unread = hub.unread_count(),
        "replay finished"
    );
    Ok(())
}

fn parse_args() -> Result<Option<ReplayOptions>, String> {
    let mut user_id: Option<String> = None;
    let mut mcard_id: Option<String> = None;
    let mut settings_path: Option<PathBuf> = None;
    let mut names: Vec<(String, String)> = Vec::new();
    let mut settle = Duration::from_millis(DEFAULT_SETTLE_MS);

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            print_help();
            return Ok(None);
        }

        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => {
                (flag.to_string(), Some(value.to_string()))
            }
            _ => (arg.clone(), None),
        };
        let mut value = || {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| format!("{flag} requires a value"))
        };

        match flag.as_str() {
            "--user" => user_id = Some(value()?),
            "--card" => mcard_id = Some(value()?),
            "--settings" => settings_path = Some(PathBuf::from(value()?)),
            "--name" => {
                let raw = value()?;
                let (id, name) = raw.split_once(':').ok_or_else(|| {
                    format!("--name expects <user_id>:<display name>, got '{raw}'")
                })?;
                names.push((id.trim().to_string(), name.trim().to_string()));
            }
            "--settle-ms" => {
                let raw = value()?;
                let ms = raw
                    .parse::<u64>()
                    .map_err(|e| format!("invalid --settle-ms value '{raw}': {e}"))?;
                settle = Duration::from_millis(ms);
            }
            other => return Err(format!("unknown argument '{other}' (see --help)")),
        }
    }

    let user_id = user_id.ok_or_else(|| "--user is required".to_string())?;
    Ok(Some(ReplayOptions {
        user_id,
        mcard_id,
        settings_path,
        names,
        settle,
    }))
}

fn print_help() {
    println!("finderid-replay: replay JSON change events (one per line) through the hub");
    println!();
    println!("USAGE:");
    println!("    finderid-replay --user <id> [--card <id>] [--name <id>:<name>]...");
    println!("                    [--settings <file>] [--settle-ms <ms>]");
    println!();
    println!("Delivered notifications are printed to stdout as JSON, toasts are logged to stderr.");
}
