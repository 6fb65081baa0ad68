//! Tokenwarden - Main Entry Point
//!
//! Loads the configuration, restores the saved session, runs one command
//! and prints whatever notices the session queued along the way.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use commands::Commands;
use tokenwarden_application::{SessionContext, SessionLifecycle};
use tokenwarden_domain::{Notice, NoticeLevel};
use tokenwarden_infrastructure::{
    FileSessionRepository, LogFormat, ReqwestTransport, SystemClock, init_logging, load_config,
    session_path,
};
use tracing::{debug, warn};

#[derive(Debug, Parser)]
#[command(name = "tokenwarden")]
#[command(about = "Session client for the account backend")]
#[command(version)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Backend API base URL, overriding the configuration
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).await?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
        config.validate()?;
    }

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(&config.log_level, format)?;

    let transport = Arc::new(ReqwestTransport::new(&config)?);
    let mut session = SessionLifecycle::new(
        SessionContext::shared(),
        transport,
        Arc::new(SystemClock::new()),
    );
    if let Some(path) = session_path(&config) {
        debug!(path = %path.display(), "Using session file");
        session = session.with_repository(Arc::new(FileSessionRepository::new(path)));
    }
    if let Err(error) = session.restore().await {
        warn!(%error, "Ignoring unreadable session file");
    }

    let result = cli.command.execute(&session).await;

    if session.context().is_logged_in().await {
        session.persist().await;
    }
    for notice in session.context().notices().drain().await {
        print_notice(&notice);
    }

    result?;
    Ok(())
}

fn print_notice(notice: &Notice) {
    let marker = match notice.level {
        NoticeLevel::Info => "i",
        NoticeLevel::Success => "+",
        NoticeLevel::Error => "!",
    };
    if notice.level == NoticeLevel::Error {
        eprintln!("[{marker}] {}: {}", notice.title, notice.content);
    } else {
        println!("[{marker}] {}: {}", notice.title, notice.content);
    }
}
