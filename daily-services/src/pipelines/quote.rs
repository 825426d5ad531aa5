//! Daily quote. No sources: the date alone drives the prompt.

use chrono::DateTime;
use chrono_tz::Tz;
use shared::blocks::CalloutStyle;

use super::{header_line, Artifact, ArtifactKind, Services};
use crate::config::AppConfig;
use crate::google::EventSource;
use crate::notion::WorkspaceApi;
use crate::openai::{GenerationRequest, TextGenerator};
use crate::synthesizer::PostProcess;

pub const MARKER: &str = "Daily Quote";

pub const FALLBACK: &str = "\"Today is a new opportunity to grow and learn.\" - Daily Reflection";

const SYSTEM_PROMPT: &str =
    "You are a thoughtful quote curator who creates meaningful daily inspiration.";

pub fn style() -> CalloutStyle {
    CalloutStyle::new(MARKER, "✨", "blue_background")
}

pub fn build_prompt(date: &str) -> String {
    format!(
        "Generate an inspiring and thoughtful quote for {}.

Consider that this is for someone who is:
- Interested in AI development and technology
- Enjoys gaming and strategic thinking
- Values personal growth and productivity
- Appreciates travel and new experiences
- Focused on knowledge management and learning

The quote should be:
- Motivational but not cliché
- Relevant to personal development
- Either original or from a notable thinker/leader
- Include attribution if from someone else
- Max 2 sentences

Format: \"Quote text\" - Author (or \"Daily Reflection\" if original)",
        date
    )
}

pub async fn compose<W, C, G>(
    services: &Services<'_, W, C, G>,
    config: &AppConfig,
    now: &DateTime<Tz>,
) -> Artifact
where
    W: WorkspaceApi,
    C: EventSource,
    G: TextGenerator,
{
    let date = now.format("%B %d, %Y").to_string();
    let request = GenerationRequest::tuned(&config.openai_model, build_prompt(&date), 100, 0.8)
        .system(SYSTEM_PROMPT);

    let post = PostProcess {
        strip_markdown: true,
        max_chars: Some(400),
        reject_failure_phrases: true,
        ..PostProcess::none()
    };
    let quote = services
        .synthesizer()
        .synthesize_with(&request, FALLBACK, &post)
        .await;
    tracing::info!("Quote: {}", quote);

    Artifact {
        kind: ArtifactKind::Quote,
        style: style(),
        content: format!("{}\n\n{}", header_line("🌟", MARKER, &date), quote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::fixtures::{config, morning, PAGE};
    use crate::testing::{callout, paragraph, FakeCalendar, FakeGenerator, FakeWorkspace};

    #[tokio::test]
    async fn test_quote_kept_verbatim() {
        let workspace = FakeWorkspace::default();
        let generator = FakeGenerator::replying(&["\"Ship small, ship often.\" - Kent Beck"]);
        let services = Services::new(&workspace, None::<&FakeCalendar>, &generator);

        let artifact = compose(&services, &config(&[]), &morning()).await;
        assert_eq!(
            artifact.content,
            "🌟 Daily Quote - March 04, 2025\n\n\"Ship small, ship often.\" - Kent Beck"
        );

        let requests = generator.requests.lock().unwrap();
        assert!(requests[0].prompt.contains("March 04, 2025"));
        assert_eq!(requests[0].system.as_deref(), Some(SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_refusal_uses_fallback() {
        let workspace = FakeWorkspace::default();
        let generator = FakeGenerator::replying(&["As an AI, I don't have opinions on quotes."]);
        let services = Services::new(&workspace, None::<&FakeCalendar>, &generator);

        let artifact = compose(&services, &config(&[]), &morning()).await;
        assert!(artifact.content.ends_with(FALLBACK));
    }

    #[tokio::test]
    async fn test_rerun_updates_existing_quote_block() {
        let workspace = FakeWorkspace::default().with_children(
            PAGE,
            vec![
                paragraph("p1", "Dashboard"),
                callout("q1", "🌟 Daily Quote - March 03, 2025\n\nyesterday"),
            ],
        );
        let generator = FakeGenerator::failing();
        let services = Services::new(&workspace, None::<&FakeCalendar>, &generator);
        let config = config(&[]);

        let artifact = compose(&services, &config, &morning()).await;
        let outcome = services.publish(&config, &artifact).await;

        assert_eq!(
            outcome,
            Some(shared::PublishOutcome::Updated {
                block_id: "q1".to_string()
            })
        );
        assert_eq!(workspace.children_of(PAGE).len(), 2);
    }
}
