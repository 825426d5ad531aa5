use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Source kind a report was fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Calendar,
    DatabaseQuery,
    PageBlocks,
}

/// Display items fetched from one configured source.
///
/// `items` is never empty: an empty result set or a failed fetch is
/// represented by a single sentinel string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub label: String,
    pub kind: SourceKind,
    pub items: Vec<String>,
    /// True when `items` is the error sentinel rather than fetched data
    pub degraded: bool,
}

impl SourceReport {
    /// Build a report, substituting `empty_message` for an empty item list.
    pub fn from_items(
        label: impl Into<String>,
        kind: SourceKind,
        items: Vec<String>,
        empty_message: &str,
    ) -> Self {
        let items = if items.is_empty() {
            vec![empty_message.to_string()]
        } else {
            items
        };

        Self {
            label: label.into(),
            kind,
            items,
            degraded: false,
        }
    }

    pub fn degraded(label: impl Into<String>, kind: SourceKind, error_message: &str) -> Self {
        Self {
            label: label.into(),
            kind,
            items: vec![error_message.to_string()],
            degraded: true,
        }
    }

    pub fn first_item(&self) -> &str {
        self.items.first().map(String::as_str).unwrap_or_default()
    }
}

/// Start or end of a calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    AllDay(NaiveDate),
    At(DateTime<FixedOffset>),
    Unknown,
}

impl EventTime {
    /// Parse the `date` / `dateTime` pair of a calendar event boundary.
    pub fn parse(date_time: Option<&str>, date: Option<&str>) -> Self {
        if let Some(raw) = date_time {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                return EventTime::At(parsed);
            }
        }
        if let Some(raw) = date {
            if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                return EventTime::AllDay(parsed);
            }
        }
        EventTime::Unknown
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::AllDay(_))
    }
}

/// A calendar event reduced to the fields the pipelines consume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
}

impl CalendarEvent {
    /// Duration in hours for timed events; `None` for all-day or unparsable ones.
    pub fn duration_hours(&self) -> Option<f64> {
        match (&self.start, &self.end) {
            (EventTime::At(start), EventTime::At(end)) => {
                Some((*end - *start).num_seconds() as f64 / 3600.0)
            }
            _ => None,
        }
    }

    /// `"HH:MM: Summary"` in the given timezone, or `"All day: Summary"`.
    pub fn display<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let marker = match &self.start {
            EventTime::At(start) => start.with_timezone(tz).format("%H:%M").to_string(),
            EventTime::AllDay(_) => "All day".to_string(),
            EventTime::Unknown => "Time TBD".to_string(),
        };
        format!("{}: {}", marker, self.summary)
    }
}

/// What the publisher did with the target block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishOutcome {
    Updated { block_id: String },
    Created,
}

impl PublishOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            PublishOutcome::Updated { .. } => "updated",
            PublishOutcome::Created => "created",
        }
    }
}
