//! Google Calendar API v3: today's events for one calendar.

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use shared::{CalendarEvent, EventTime};

use super::auth::TokenProvider;
use crate::error::{ServiceError, ServiceResult};

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars";

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    summary: Option<String>,
    start: Option<RawEventTime>,
    end: Option<RawEventTime>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl RawEventTime {
    fn parse(time: Option<&RawEventTime>) -> EventTime {
        match time {
            Some(t) => EventTime::parse(t.date_time.as_deref(), t.date.as_deref()),
            None => EventTime::Unknown,
        }
    }
}

/// Anything that can list a day's calendar events.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    async fn events_on(&self, day: NaiveDate) -> ServiceResult<Vec<CalendarEvent>>;
}

/// Local-midnight bounds of `day` in `tz`, as RFC 3339 strings.
pub fn day_bounds(day: NaiveDate, tz: &Tz) -> Option<(String, String)> {
    let start = tz.from_local_datetime(&day.and_hms_opt(0, 0, 0)?).earliest()?;
    let end = tz.from_local_datetime(&day.and_hms_opt(23, 59, 59)?).latest()?;
    Some((start.to_rfc3339(), end.to_rfc3339()))
}

/// Decode one `items` element. Missing summaries read as "No title" and
/// undecodable items become a placeholder event; cancelled events are `None`.
pub fn decode_event(item: &serde_json::Value) -> Option<CalendarEvent> {
    let raw: RawEvent = match serde_json::from_value(item.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Unreadable calendar event: {}", e);
            return Some(CalendarEvent {
                summary: "Unreadable event".to_string(),
                start: EventTime::Unknown,
                end: EventTime::Unknown,
            });
        }
    };

    if raw.status.as_deref() == Some("cancelled") {
        return None;
    }

    Some(CalendarEvent {
        summary: raw
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "No title".to_string()),
        start: RawEventTime::parse(raw.start.as_ref()),
        end: RawEventTime::parse(raw.end.as_ref()),
    })
}

pub struct CalendarClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    calendar_id: String,
    timezone: Tz,
}

impl CalendarClient {
    pub fn new(http: reqwest::Client, tokens: TokenProvider, calendar_id: String, timezone: Tz) -> Self {
        Self {
            http,
            tokens,
            calendar_id,
            timezone,
        }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/{}/events",
            EVENTS_URL,
            urlencoding::encode(&self.calendar_id)
        )
    }
}

impl EventSource for CalendarClient {
    async fn events_on(&self, day: NaiveDate) -> ServiceResult<Vec<CalendarEvent>> {
        let access_token = self.tokens.access_token().await?;

        let (time_min, time_max) = day_bounds(day, &self.timezone)
            .ok_or_else(|| ServiceError::unexpected("Calendar", format!("no local midnight for {}", day)))?;

        let response = self
            .http
            .get(self.events_url())
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response("Calendar", response).await);
        }

        let body: EventsResponse = response.json().await?;
        let events: Vec<CalendarEvent> = body.items.iter().filter_map(decode_event).collect();

        tracing::debug!("Calendar returned {} events for {}", events.len(), day);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_day_bounds_use_local_offset() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let (start, end) = day_bounds(day, &chrono_tz::Asia::Kolkata).unwrap();
        assert_eq!(start, "2025-03-04T00:00:00+05:30");
        assert_eq!(end, "2025-03-04T23:59:59+05:30");
    }

    #[test]
    fn test_decode_timed_and_all_day() {
        let timed = decode_event(&json!({
            "summary": "Standup",
            "start": {"dateTime": "2025-03-04T09:00:00+05:30"},
            "end": {"dateTime": "2025-03-04T09:15:00+05:30"}
        }))
        .unwrap();
        assert_eq!(timed.display(&chrono_tz::Asia::Kolkata), "09:00: Standup");

        let all_day = decode_event(&json!({
            "summary": "Anna Birthday",
            "start": {"date": "2025-03-04"},
            "end": {"date": "2025-03-05"}
        }))
        .unwrap();
        assert!(all_day.start.is_all_day());
    }

    #[test]
    fn test_decode_missing_fields() {
        let event = decode_event(&json!({})).unwrap();
        assert_eq!(event.summary, "No title");
        assert_eq!(event.start, EventTime::Unknown);
    }

    #[test]
    fn test_decode_skips_cancelled_and_tolerates_garbage() {
        assert!(decode_event(&json!({"summary": "x", "status": "cancelled"})).is_none());

        let garbage = decode_event(&json!({"summary": 42})).unwrap();
        assert_eq!(garbage.summary, "Unreadable event");
    }
}
