//! One entrypoint per published artifact.
//!
//! Every pipeline follows the same shape: fetch (each source fault tolerant),
//! assemble a prompt, synthesize with a fallback, then hand the finished
//! content to the publisher. Composition never fails on a service outage;
//! only missing configuration stops a run.

pub mod briefing;
pub mod insight;
pub mod quote;

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use shared::blocks::CalloutStyle;
use shared::{PublishOutcome, SourceReport};

use crate::config::AppConfig;
use crate::google::EventSource;
use crate::notion::WorkspaceApi;
use crate::openai::TextGenerator;
use crate::publisher::Publisher;
use crate::sources::Fetcher;
use crate::synthesizer::Synthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Briefing,
    Quote,
    Insight,
}

impl ArtifactKind {
    pub fn name(&self) -> &'static str {
        match self {
            ArtifactKind::Briefing => "briefing",
            ArtifactKind::Quote => "quote",
            ArtifactKind::Insight => "insight",
        }
    }
}

/// Finished content, ready to be published
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub style: CalloutStyle,
    pub content: String,
}

/// Borrowed handles to the external services a run talks to.
pub struct Services<'a, W, C, G> {
    pub workspace: &'a W,
    pub calendar: Option<&'a C>,
    pub generator: &'a G,
}

impl<'a, W, C, G> Services<'a, W, C, G>
where
    W: WorkspaceApi,
    C: EventSource,
    G: TextGenerator,
{
    pub fn new(workspace: &'a W, calendar: Option<&'a C>, generator: &'a G) -> Self {
        Self {
            workspace,
            calendar,
            generator,
        }
    }

    fn fetcher(&self, config: &AppConfig, now: &DateTime<Tz>) -> Fetcher<'a, W, C> {
        Fetcher::new(
            self.workspace,
            self.calendar,
            config.retry,
            config.timezone,
            now.date_naive(),
        )
    }

    fn synthesizer(&self) -> Synthesizer<'a, G> {
        Synthesizer::new(self.generator)
    }

    /// Build the artifact's content without touching the target page.
    pub async fn compose(
        &self,
        kind: ArtifactKind,
        config: &AppConfig,
        now: &DateTime<Tz>,
    ) -> Result<Artifact> {
        tracing::info!("Generating {} for {}", kind.name(), now.format("%Y-%m-%d %H:%M %Z"));
        match kind {
            ArtifactKind::Briefing => briefing::compose(self, config, now).await,
            ArtifactKind::Quote => Ok(quote::compose(self, config, now).await),
            ArtifactKind::Insight => Ok(insight::compose(self, config, now).await),
        }
    }

    /// Write the artifact to the configured page. Exhausted retries are
    /// logged and reported as `None`; the run still completes.
    pub async fn publish(&self, config: &AppConfig, artifact: &Artifact) -> Option<PublishOutcome> {
        let publisher = Publisher::new(self.workspace, config.retry);
        match publisher
            .publish(&config.notion_page_id, &artifact.style, &artifact.content)
            .await
        {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!("Failed to update Notion with {}: {}", artifact.kind.name(), e);
                None
            }
        }
    }
}

/// `"<emoji> <title> - <date>"`, the first line every callout starts with.
pub fn header_line(emoji: &str, title: &str, date: &str) -> String {
    format!("{} {} - {}", emoji, title, date)
}

/// Items as bullet lines for prompt embedding.
pub fn bullets(report: &SourceReport) -> String {
    report
        .items
        .iter()
        .map(|item| format!("• {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}
