//! Fault-tolerant fetching of every configured source into display items.
//!
//! A fetch never fails from the caller's point of view: exhausted retries
//! collapse into a one-item sentinel report flagged `degraded`, and a single
//! malformed record only costs that record.

use chrono::NaiveDate;
use chrono_tz::Tz;
use futures::future::join_all;
use shared::blocks::Block;
use shared::models::SourceKind;
use shared::{CalendarEvent, SourceReport};

use crate::error::ServiceError;
use crate::google::EventSource;
use crate::notion::query::UNREADABLE_ITEM;
use crate::notion::{DatabaseQuery, WorkspaceApi};
use crate::retry::{retry_when, RetryPolicy};

pub const CALENDAR_UNAVAILABLE: &str = "Calendar access unavailable";
pub const CALENDAR_ERROR: &str = "Calendar access error";
pub const NO_EVENTS: &str = "No scheduled events today";

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSource {
    pub label: String,
    pub empty_message: String,
}

impl CalendarSource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            empty_message: NO_EVENTS.to_string(),
        }
    }
}

/// Text-bearing children of one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageBlocksSource {
    pub label: String,
    pub page_id: String,
    pub limit: usize,
    /// Skip to-dos that are already checked
    pub unchecked_only: bool,
    pub empty_message: String,
    pub error_message: String,
}

impl PageBlocksSource {
    pub fn new(label: impl Into<String>, page_id: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            empty_message: format!("No {} items", label.to_lowercase()),
            error_message: format!("Error accessing {}", label.to_lowercase()),
            label,
            page_id: page_id.into(),
            limit: 10,
            unchecked_only: false,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn unchecked_only(mut self) -> Self {
        self.unchecked_only = true;
        self
    }

    /// Project raw children into display items.
    pub fn project(&self, children: &[serde_json::Value]) -> Vec<String> {
        children
            .iter()
            .filter_map(|raw| match Block::from_value(raw) {
                Some(block) if !block.has_text() => None,
                Some(block) if self.unchecked_only && block.checked == Some(true) => None,
                Some(block) => Some(block.display()),
                None => {
                    tracing::warn!("{}: unreadable block", self.label);
                    Some(UNREADABLE_ITEM.to_string())
                }
            })
            .take(self.limit)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    Calendar(CalendarSource),
    DatabaseQuery(DatabaseQuery),
    PageBlocks(PageBlocksSource),
}

impl SourceConfig {
    pub fn label(&self) -> &str {
        match self {
            SourceConfig::Calendar(c) => &c.label,
            SourceConfig::DatabaseQuery(q) => &q.label,
            SourceConfig::PageBlocks(p) => &p.label,
        }
    }
}

/// Result of asking the calendar for today's events
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarFetch {
    Events(Vec<CalendarEvent>),
    /// No credentials were configured
    Unavailable,
    /// Retries exhausted
    Failed,
}

pub struct Fetcher<'a, W, C> {
    workspace: &'a W,
    calendar: Option<&'a C>,
    policy: RetryPolicy,
    timezone: Tz,
    today: NaiveDate,
}

impl<'a, W, C> Fetcher<'a, W, C>
where
    W: WorkspaceApi,
    C: EventSource,
{
    pub fn new(
        workspace: &'a W,
        calendar: Option<&'a C>,
        policy: RetryPolicy,
        timezone: Tz,
        today: NaiveDate,
    ) -> Self {
        Self {
            workspace,
            calendar,
            policy,
            timezone,
            today,
        }
    }

    pub async fn calendar_events(&self) -> CalendarFetch {
        let Some(calendar) = self.calendar else {
            tracing::warn!("{} - no calendar credentials configured", CALENDAR_UNAVAILABLE);
            return CalendarFetch::Unavailable;
        };

        let result = retry_when(
            &self.policy,
            "Calendar events",
            || calendar.events_on(self.today),
            ServiceError::is_transient,
        )
        .await;

        match result {
            Ok(events) => {
                tracing::info!("Found {} calendar events", events.len());
                CalendarFetch::Events(events)
            }
            Err(e) => {
                tracing::error!("Calendar error: {}", e);
                CalendarFetch::Failed
            }
        }
    }

    async fn fetch_calendar(&self, source: &CalendarSource) -> SourceReport {
        match self.calendar_events().await {
            CalendarFetch::Events(events) => {
                let items = events.iter().map(|e| e.display(&self.timezone)).collect();
                SourceReport::from_items(&source.label, SourceKind::Calendar, items, &source.empty_message)
            }
            CalendarFetch::Unavailable => {
                SourceReport::degraded(&source.label, SourceKind::Calendar, CALENDAR_UNAVAILABLE)
            }
            CalendarFetch::Failed => {
                SourceReport::degraded(&source.label, SourceKind::Calendar, CALENDAR_ERROR)
            }
        }
    }

    async fn fetch_database(&self, query: &DatabaseQuery) -> SourceReport {
        let body = query.request_body();
        let result = retry_when(
            &self.policy,
            &query.label,
            || self.workspace.query_database(&query.database_id, &body),
            ServiceError::is_transient,
        )
        .await;

        match result {
            Ok(rows) => {
                let items = query.project_rows(&rows);
                let unreadable = items.iter().filter(|i| *i == UNREADABLE_ITEM).count();
                if unreadable > 0 {
                    tracing::warn!("{}: {} unreadable rows", query.label, unreadable);
                }
                tracing::info!("Found {} {}", items.len(), query.label.to_lowercase());
                SourceReport::from_items(&query.label, SourceKind::DatabaseQuery, items, &query.empty_message)
            }
            Err(e) => {
                tracing::error!("{} query error: {}", query.label, e);
                SourceReport::degraded(&query.label, SourceKind::DatabaseQuery, &query.error_message)
            }
        }
    }

    async fn fetch_blocks(&self, source: &PageBlocksSource) -> SourceReport {
        let result = retry_when(
            &self.policy,
            &source.label,
            || self.workspace.list_children(&source.page_id),
            ServiceError::is_transient,
        )
        .await;

        match result {
            Ok(children) => {
                let items = source.project(&children);
                tracing::info!("Found {} {} items", items.len(), source.label.to_lowercase());
                SourceReport::from_items(&source.label, SourceKind::PageBlocks, items, &source.empty_message)
            }
            Err(e) => {
                tracing::error!("{} error: {}", source.label, e);
                SourceReport::degraded(&source.label, SourceKind::PageBlocks, &source.error_message)
            }
        }
    }

    pub async fn fetch(&self, source: &SourceConfig) -> SourceReport {
        tracing::debug!("Fetching {}", source.label());
        match source {
            SourceConfig::Calendar(c) => self.fetch_calendar(c).await,
            SourceConfig::DatabaseQuery(q) => self.fetch_database(q).await,
            SourceConfig::PageBlocks(p) => self.fetch_blocks(p).await,
        }
    }

    /// Fetch every source concurrently. Reports come back in `sources` order.
    pub async fn fetch_all(&self, sources: &[SourceConfig]) -> Vec<SourceReport> {
        join_all(sources.iter().map(|source| self.fetch(source))).await
    }
}
