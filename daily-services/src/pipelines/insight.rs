//! Morning insight: a day-of-year stoic line, a birthday or anniversary
//! reminder when the calendar has one, and a short insight tuned to whether
//! today is a workday.

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use regex::Regex;
use shared::blocks::CalloutStyle;
use shared::CalendarEvent;
use std::sync::OnceLock;

use super::{Artifact, ArtifactKind, Services};
use crate::config::AppConfig;
use crate::google::EventSource;
use crate::notion::WorkspaceApi;
use crate::openai::{GenerationRequest, TextGenerator};
use crate::sources::CalendarFetch;
use crate::synthesizer::PostProcess;

/// Carries the emoji so it never matches inside the briefing header
pub const MARKER: &str = "✨ Morning Insight";

/// A work block shorter than this does not make the day a workday
const MIN_WORK_HOURS: f64 = 2.0;

pub const WORKDAY_FALLBACK: &str =
    "Focus on one meaningful project today. What's the smallest step forward you can take right now?";
pub const REST_DAY_FALLBACK: &str =
    "Today is yours to create with. What will bring you joy and connection today?";

const WORKDAY_BRIEF: &str = "This is a WORKDAY. Generate an inspiring insight for a professional who's stepping into their work day.
Requirements:
- 2-3 sentences maximum
- 50-70 words total
- Include ONE action-oriented question at the end (your journal prompt)
- Focus: breakthrough project, focus, growth, power
- Tone: energizing but grounded
- Start with an observation about their week/day
- End with a question that's personal and actionable
- Example:
  \"You're stepping into your power this week. Focus on one breakthrough project that challenges you, that's where real growth lives. What's the smallest first step you can take today?\"
Respond with 2-3 sentences ending with a reflective question. No labels or headers.";

const REST_DAY_BRIEF: &str = "This is a NON-WORKDAY (weekend or holiday). Generate an inspiring insight for someone with freedom today.
Requirements:
- 2-3 sentences maximum
- 50-70 words total
- Include ONE reflective/curiosity-sparking question at the end (your journal prompt)
- Focus: connection, creation, presence, joy, rest
- Tone: warm, introspective, celebratory
- For Saturday: energy, creativity, relationships. For Sunday: reflection, preparation, integration
- End with a question that's personal and invites experimentation
- Example:
  \"Today is for connection and creation. Whether you're building something new or strengthening bonds, let joy guide your choices. Who or what needs your presence today?\"
Respond with 2-3 sentences ending with a reflective question. No labels or headers.";

pub fn style() -> CalloutStyle {
    CalloutStyle::new(MARKER, "✨", "orange_background")
}

/// A workday has at least one timed "work" (or 💼) event of two hours or more.
pub fn is_workday(events: &[CalendarEvent]) -> bool {
    events.iter().any(|event| {
        let looks_like_work =
            event.summary.to_lowercase().contains("work") || event.summary.contains('💼');
        match event.duration_hours() {
            Some(hours) if looks_like_work && hours >= MIN_WORK_HOURS => {
                tracing::info!("Work block detected: {:.1} hours - WORKDAY", hours);
                true
            }
            _ => false,
        }
    })
}

/// Workday status from a calendar fetch. Without calendar data the day is
/// assumed to be a workday.
pub fn workday_from(fetch: &CalendarFetch) -> bool {
    match fetch {
        CalendarFetch::Events(events) => {
            let workday = is_workday(events);
            if !workday {
                tracing::info!("No significant work block found - NON-WORKDAY");
            }
            workday
        }
        CalendarFetch::Unavailable | CalendarFetch::Failed => {
            tracing::warn!("Calendar unavailable - assuming workday");
            true
        }
    }
}

/// First event whose summary mentions a birthday or an anniversary.
pub fn find_special_event(events: &[CalendarEvent]) -> Option<&CalendarEvent> {
    events.iter().find(|event| {
        let lower = event.summary.to_lowercase();
        lower.contains("birthday") || lower.contains("anniversary")
    })
}

fn occasion_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)birthday|anniversary").expect("valid occasion regex"))
}

/// `"🎂 Anna's Birthday - Reach out and celebrate"` from `"Anna Birthday"`.
pub fn birthday_reminder(summary: &str) -> String {
    let (emoji, occasion) = if summary.to_lowercase().contains("anniversary") {
        ("💍", "Anniversary")
    } else {
        ("🎂", "Birthday")
    };

    let stripped = occasion_pattern().replace_all(summary, "");
    let name = stripped
        .trim()
        .trim_end_matches("'s")
        .trim_end_matches("\u{2019}s")
        .trim();

    if name.is_empty() {
        format!("{} {} - Reach out and celebrate", emoji, occasion)
    } else {
        format!("{} {}'s {} - Reach out and celebrate", emoji, name, occasion)
    }
}

pub fn stoic_prompt(day: u32, year: i32) -> String {
    format!(
        "Generate ONE short, powerful stoic wisdom about the passage of time and taking action.

Context: Today is Day {day} of {year}.

Requirements:
- Exactly ONE line, maximum 12 words
- Start with: \"Day {day} of {year}.\"
- End with a verb/action (not a period, but implied)
- Examples style:
  - \"Day 365 of 2025. What will you build with today?\"
  - \"Day 100 of 2025. Time compounds. Act now.\"
  - \"Day 215 of 2025. Every moment shapes your legacy.\"
  - \"Day 42 of 2025. Small actions today, large results tomorrow.\"

Be unique, fresh, and thought-provoking. This will be the first thing someone reads at 6:30 AM.

Respond with ONLY the single line, no punctuation at end, no quotes.",
        day = day,
        year = year
    )
}

pub fn stoic_fallback(day: u32, year: i32) -> String {
    format!("Day {} of {}. Every moment matters", day, year)
}

pub fn insight_prompt(workday: bool) -> String {
    let brief = if workday { WORKDAY_BRIEF } else { REST_DAY_BRIEF };
    format!("{}\n\nGenerate the insight now.", brief)
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
    let (day, year) = (now.ordinal(), now.year());
    tracing::info!("Day {} of {}", day, year);

    let calendar = services.fetcher(config, now).calendar_events().await;
    let workday = workday_from(&calendar);
    let special = match &calendar {
        CalendarFetch::Events(events) => find_special_event(events).map(|e| {
            tracing::info!("Special event found: {}", e.summary);
            birthday_reminder(&e.summary)
        }),
        _ => None,
    };

    let synthesizer = services.synthesizer();

    let stoic_request = GenerationRequest::tuned(&config.openai_model, stoic_prompt(day, year), 30, 0.8);
    let stoic = synthesizer
        .synthesize_with(&stoic_request, &stoic_fallback(day, year), &PostProcess::strict(120))
        .await;

    let insight_request = GenerationRequest::tuned(&config.openai_model, insight_prompt(workday), 100, 0.9);
    let fallback = if workday { WORKDAY_FALLBACK } else { REST_DAY_FALLBACK };
    let post = PostProcess {
        strip_markdown: true,
        max_chars: Some(500),
        reject_failure_phrases: true,
        ..PostProcess::none()
    };
    let insight = synthesizer
        .synthesize_with(&insight_request, fallback, &post)
        .await;

    let date = now.format("%A, %B %d, %Y").to_string();
    let mut sections = vec![format!("{} - {}", MARKER, date), stoic];
    sections.extend(special);
    sections.push(insight);

    Artifact {
        kind: ArtifactKind::Insight,
        style: style(),
        content: sections.join("\n\n"),
    }
}
