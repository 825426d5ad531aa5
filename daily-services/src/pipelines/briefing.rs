//! Morning briefing: calendar, unprocessed captures, active goals and the
//! optional checklist, turned into a prioritised plan for the day.

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use shared::blocks::CalloutStyle;
use shared::SourceReport;

use super::{bullets, header_line, Artifact, ArtifactKind, Services};
use crate::config::AppConfig;
use crate::google::EventSource;
use crate::notion::{
    DatabaseQuery, FieldKind, FieldSpec, PropertyFilter, Sort, SortDirection, WorkspaceApi,
};
use crate::openai::{GenerationRequest, TextGenerator};
use crate::sources::{CalendarSource, PageBlocksSource, SourceConfig};

pub const MARKER: &str = "AI-Generated Morning Insights";

const SYSTEM_PROMPT: &str =
    "You are a personal productivity coach who creates concise, actionable daily briefings.";

const FALLBACK_LEAD: &str = "Daily briefing generation temporarily unavailable. \
Focus on your calendar events and process your captures today!";

const INTRO: &str = "Based on your calendar, recent notes, and patterns, \
here's your personalized briefing for today.";

pub fn style() -> CalloutStyle {
    CalloutStyle::new(MARKER, "🤖", "blue_background")
}

pub fn captures_query(database_id: &str) -> DatabaseQuery {
    DatabaseQuery::new("Captures", database_id)
        .filter(PropertyFilter::select("Processing_Status", "📥 Captured"))
        .sort(Sort::CreatedTime(SortDirection::Descending))
        .page_size(5)
        .field(FieldSpec::new("title", "Title", FieldKind::Title, "Untitled"))
        .field(FieldSpec::new("type", "Type", FieldKind::Select, "Unknown"))
        .template("{type}: {title}")
        .empty_message("No unprocessed captures")
}

pub fn goals_query(database_id: &str) -> DatabaseQuery {
    DatabaseQuery::new("Goals", database_id)
        .filter(PropertyFilter::select("Status", "🔄 In Progress"))
        .page_size(3)
        .field(FieldSpec::new("title", "Goal", FieldKind::Title, "Untitled Goal"))
        .field(FieldSpec::new("progress", "Progress", FieldKind::Percent, "0%"))
        .field(FieldSpec::new("level", "Level", FieldKind::Select, "Goal"))
        .template("{level}: {title} ({progress} complete)")
        .empty_message("No active goals found")
}

pub fn sources(config: &AppConfig) -> Result<Vec<SourceConfig>> {
    let (captures, goals) = config.briefing_databases()?;

    let mut sources = vec![
        SourceConfig::Calendar(CalendarSource::new("Calendar")),
        SourceConfig::DatabaseQuery(captures_query(captures)),
        SourceConfig::DatabaseQuery(goals_query(goals)),
    ];
    if let Some(ref checklist) = config.checklist_page_id {
        sources.push(SourceConfig::PageBlocks(
            PageBlocksSource::new("Checklist", checklist.as_str())
                .unchecked_only()
                .limit(8),
        ));
    }
    Ok(sources)
}

fn section_title(report: &SourceReport) -> &str {
    match report.label.as_str() {
        "Calendar" => "CALENDAR EVENTS TODAY",
        "Captures" => "UNPROCESSED CAPTURES",
        "Goals" => "ACTIVE GOALS",
        "Checklist" => "OPEN CHECKLIST ITEMS",
        other => other,
    }
}

pub fn build_prompt(date: &str, reports: &[SourceReport]) -> String {
    let sections: Vec<String> = reports
        .iter()
        .map(|report| format!("{}:\n{}", section_title(report), bullets(report)))
        .collect();

    format!(
        "Generate a personalized daily briefing for {date}.

{sections}

Based on this data, create a briefing with exactly these sections:

**TODAY'S FOCUS:**
• Priority 1: [Most urgent from calendar/deadlines]
• Priority 2: [Important goal-aligned task]
• Priority 3: [Learning opportunity from captures]

**KNOWLEDGE OPPORTUNITIES:**
• To Process: [Mention 1-2 specific captures to review]
• To Connect: [Suggest connecting captures to goals]
• To Distill: [Recommend insight extraction from specific items]

**ENERGY OPTIMIZATION:**
• Peak Hours: [Best work times based on calendar gaps]
• Reflection Time: [When to journal based on schedule]
• Recovery Activities: [Break times and activities]

Keep each bullet point to one line. Be specific and actionable.",
        date = date,
        sections = sections.join("\n\n"),
    )
}

/// Canned briefing that still points at the first fetched item of each source.
pub fn fallback(reports: &[SourceReport]) -> String {
    let pointers: Vec<String> = reports
        .iter()
        .map(|report| format!("• {}: {}", report.label, report.first_item()))
        .collect();

    if pointers.is_empty() {
        FALLBACK_LEAD.to_string()
    } else {
        format!("{}\n\n{}", FALLBACK_LEAD, pointers.join("\n"))
    }
}

pub async fn compose<W, C, G>(
    services: &Services<'_, W, C, G>,
    config: &AppConfig,
    now: &DateTime<Tz>,
) -> Result<Artifact>
where
    W: WorkspaceApi,
    C: EventSource,
    G: TextGenerator,
{
    let sources = sources(config)?;
    let reports = services.fetcher(config, now).fetch_all(&sources).await;
    for report in &reports {
        tracing::info!("{}: {} items", report.label, report.items.len());
    }

    let date = now.format("%A, %B %d, %Y").to_string();
    let request = GenerationRequest::tuned(&config.openai_model, build_prompt(&date, &reports), 400, 0.7)
        .system(SYSTEM_PROMPT);
    let briefing = services
        .synthesizer()
        .synthesize(&request, &fallback(&reports))
        .await;

    Ok(Artifact {
        kind: ArtifactKind::Briefing,
        style: style(),
        content: format!(
            "{}\n\n{}\n\n{}",
            header_line("🤖", MARKER, &date),
            INTRO,
            briefing
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::fixtures::{config, morning, PAGE};
    use crate::sources::CALENDAR_ERROR;
    use crate::testing::{to_do, FakeCalendar, FakeGenerator, FakeWorkspace};
    use serde_json::json;
    use shared::models::SourceKind;

    fn briefing_config() -> AppConfig {
        config(&[
            ("CAPTURE_DATABASE_ID", "db-captures"),
            ("GOALS_DATABASE_ID", "db-goals"),
        ])
    }

    fn workspace() -> FakeWorkspace {
        FakeWorkspace::default()
            .with_rows(
                "db-captures",
                vec![json!({"id": "c1", "properties": {
                    "Title": {"type": "title", "title": [{"plain_text": "Tokio internals"}]},
                    "Type": {"type": "select", "select": {"name": "📚 Article"}}
                }})],
            )
            .with_rows("db-goals", vec![])
            .with_children(PAGE, vec![])
    }

    #[test]
    fn test_missing_databases_is_a_config_error() {
        let err = sources(&config(&[])).unwrap_err();
        assert!(err.to_string().contains("CAPTURE_DATABASE_ID"));
    }

    #[test]
    fn test_checklist_source_is_optional() {
        assert_eq!(sources(&briefing_config()).unwrap().len(), 3);

        let with_checklist = config(&[
            ("CAPTURE_DATABASE_ID", "db-captures"),
            ("GOALS_DATABASE_ID", "db-goals"),
            ("CHECKLIST_PAGE_ID", "checklist"),
        ]);
        let all = sources(&with_checklist).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].label(), "Checklist");
    }

    #[test]
    fn test_fallback_references_fetched_items() {
        let reports = vec![
            SourceReport::from_items("Calendar", SourceKind::Calendar, vec!["09:00: Standup".into()], ""),
            SourceReport::degraded("Goals", SourceKind::DatabaseQuery, "Error accessing goals"),
        ];
        let text = fallback(&reports);
        assert!(text.starts_with(FALLBACK_LEAD));
        assert!(text.contains("• Calendar: 09:00: Standup"));
        assert!(text.contains("• Goals: Error accessing goals"));
    }

    #[tokio::test]
    async fn test_calendar_failure_still_publishes_with_sentinel() {
        let workspace = workspace();
        let calendar = FakeCalendar::failing(10);
        let generator = FakeGenerator::replying(&["**TODAY'S FOCUS:**\n• Priority 1: Read Tokio internals"]);
        let services = Services::new(&workspace, Some(&calendar), &generator);
        let config = briefing_config();

        let artifact = compose(&services, &config, &morning()).await.unwrap();

        let prompts = generator.prompts();
        let prompt = &prompts[0];
        assert!(prompt.contains("Tuesday, March 04, 2025"));
        assert!(prompt.contains(&format!("• {}", CALENDAR_ERROR)));
        assert!(prompt.contains("• 📚 Article: Tokio internals"));
        assert!(prompt.contains("• No active goals found"));

        assert!(artifact
            .content
            .starts_with("🤖 AI-Generated Morning Insights - Tuesday, March 04, 2025"));
        assert!(artifact.content.contains("Priority 1: Read Tokio internals"));

        let outcome = services.publish(&config, &artifact).await;
        assert_eq!(outcome.map(|o| o.as_str().to_string()).as_deref(), Some("created"));
        assert_eq!(workspace.children_of(PAGE).len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_publishes_fallback_with_item() {
        let workspace = workspace().with_children(
            "checklist",
            vec![to_do("t1", "Renew passport", false)],
        );
        let generator = FakeGenerator::failing();
        let services = Services::new(&workspace, None::<&FakeCalendar>, &generator);
        let config = config(&[
            ("CAPTURE_DATABASE_ID", "db-captures"),
            ("GOALS_DATABASE_ID", "db-goals"),
            ("CHECKLIST_PAGE_ID", "checklist"),
        ]);

        let artifact = compose(&services, &config, &morning()).await.unwrap();
        assert!(artifact.content.contains(FALLBACK_LEAD));
        assert!(artifact.content.contains("📚 Article: Tokio internals"));
        assert!(artifact.content.contains("[ ] Renew passport"));

        assert!(services.publish(&config, &artifact).await.is_some());
    }
}
