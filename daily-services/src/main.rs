mod archive;
mod config;
mod error;
mod google;
mod notion;
mod openai;
mod pipelines;
mod publisher;
mod retry;
mod sources;
mod synthesizer;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::google::{CalendarClient, TokenProvider, CALENDAR_READONLY_SCOPE};
use crate::notion::NotionClient;
use crate::openai::OpenAiClient;
use crate::pipelines::{ArtifactKind, Services};

#[derive(Parser)]
#[command(name = "daily-services")]
#[command(about = "Generate a daily artifact from calendar and Notion data and publish it to Notion")]
struct Cli {
    /// Print the generated content instead of writing it to Notion
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,

    /// Also save the generated content under this directory
    #[arg(long, value_name = "DIR", env = "LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Morning briefing from calendar, captures, goals and checklist
    Briefing,
    /// Daily inspirational quote
    Quote,
    /// Day-of-year wisdom, birthday reminders and a workday-aware insight
    Insight,
}

impl Commands {
    fn artifact(&self) -> ArtifactKind {
        match self {
            Commands::Briefing => ArtifactKind::Briefing,
            Commands::Quote => ArtifactKind::Quote,
            Commands::Insight => ArtifactKind::Insight,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daily_services=info,shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let kind = cli.command.artifact();

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let notion = NotionClient::new(http.clone(), &config.notion_api_key);
    let openai = OpenAiClient::new(http.clone(), &config.openai_api_key);
    let calendar = config.google_credentials.clone().map(|key| {
        let tokens = TokenProvider::new(http.clone(), key, CALENDAR_READONLY_SCOPE);
        CalendarClient::new(http.clone(), tokens, config.calendar_id.clone(), config.timezone)
    });

    let services = Services::new(&notion, calendar.as_ref(), &openai);
    let now = Utc::now().with_timezone(&config.timezone);

    let artifact = services.compose(kind, &config, &now).await?;
    tracing::info!("Generated {} ({} characters)", kind.name(), artifact.content.chars().count());

    if let Some(ref dir) = cli.log_dir {
        if let Err(e) = archive::save_to_log(dir, kind.name(), &now, &artifact.content) {
            tracing::warn!("Run log not saved: {:#}", e);
        }
    }

    if cli.dry_run {
        println!("{}", artifact.content);
        return Ok(());
    }

    match services.publish(&config, &artifact).await {
        Some(outcome) => tracing::info!("{} process completed ({})", kind.name(), outcome.as_str()),
        None => tracing::warn!("{} generated but not published", kind.name()),
    }

    Ok(())
}
