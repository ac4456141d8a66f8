//! Newbie Guard Bot - Main Entry Point
//!
//! Greets newcomers with a verification question and kicks those who do not
//! answer in time. This binary drives the bot from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use newbie_guard_bot::admission::{AdmissionController, EventRunner};
use newbie_guard_bot::commands::CommandHandler;
use newbie_guard_bot::config::{BotSettings, NotificationTemplates};
use newbie_guard_bot::greeting::{ChatId, NewbieRegistry, QuestionCatalog, UserId};
use newbie_guard_bot::notification::NotificationService;
use newbie_guard_bot::platform::{ChatEvent, ConsolePlatform};

/// Group chat guard for newcomer verification.
#[derive(Parser, Debug)]
#[command(name = "newbie_guard")]
#[command(about = "Verify newcomers and post moderation notices")]
#[command(version)]
struct Args {
    /// Path to the greeting questions YAML file (overrides QUESTIONS_PATH).
    #[arg(short, long)]
    questions: Option<PathBuf>,

    /// Path to the notification templates JSON file (overrides NOTIFICATIONS_PATH).
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Chat id used for console events.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    chat_id: i64,

    /// User ids treated as chat admins.
    #[arg(long = "admin", value_delimiter = ',')]
    admins: Vec<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables, so RUST_LOG from the .env file applies
    let env_loaded = dotenvy::from_filename(&args.env_file);

    // Initialize logging
    init_logging(&args.log_level);

    if let Err(e) = env_loaded {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let mut settings = BotSettings::from_env_with_defaults();
    if let Some(path) = args.questions {
        settings.questions_path = path;
    }
    if let Some(path) = args.templates {
        settings.templates_path = path;
    }

    // Load configurations
    let templates = NotificationTemplates::load_or_default(&settings.templates_path)
        .context("Failed to load notification templates")?;
    templates
        .validate()
        .context("Notification template validation failed")?;
    info!("Loaded {} notification templates", templates.len());

    let catalog = Arc::new(QuestionCatalog::open(&settings.questions_path));
    let registry = Arc::new(NewbieRegistry::new());
    let notifications = Arc::new(NotificationService::new(&templates));
    let platform = Arc::new(ConsolePlatform::new(
        ChatId(args.chat_id),
        args.admins.into_iter().map(UserId),
    ));

    let controller = AdmissionController::new(
        Arc::clone(&registry),
        Arc::clone(&catalog),
        Arc::clone(&notifications),
        Arc::clone(&platform),
    );
    let commands = CommandHandler::new(
        Arc::clone(&platform),
        notifications,
        registry,
        catalog,
        settings.default_restrict(),
        settings.punishment(),
    );
    let runner = EventRunner::new(controller, commands, Arc::clone(&platform));

    // Create event channel
    let (event_tx, event_rx) = mpsc::channel::<ChatEvent>(32);

    let reader_platform = Arc::clone(&platform);
    let reader_handle = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        reader_platform.read_events(stdin, event_tx).await;
    });

    info!("Starting newbie guard in chat {}...", platform.chat());
    info!("Type 'join <id> <name>', 'answer <id> <key>' or 'say <id> [@<id>] <text>'");

    tokio::select! {
        () = runner.run(event_rx) => {
            info!("Input closed, shutting down...");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    reader_handle.abort();
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
