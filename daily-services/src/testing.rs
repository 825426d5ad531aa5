//! In-memory stand-ins for the external services, used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde_json::{json, Value};
use shared::CalendarEvent;

use crate::error::{ServiceError, ServiceResult};
use crate::google::EventSource;
use crate::notion::WorkspaceApi;
use crate::openai::{GenerationRequest, TextGenerator};

pub fn unavailable(service: &'static str) -> ServiceError {
    ServiceError::Status {
        service,
        status: 503,
        body: "service unavailable".to_string(),
    }
}

/// Copy `text.content` into `plain_text` the way the API echoes written runs.
fn as_stored(callout: &Value) -> Value {
    let mut stored = callout.clone();
    if let Some(runs) = stored.get_mut("rich_text").and_then(Value::as_array_mut) {
        for run in runs {
            let content = run
                .pointer("/text/content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            run["plain_text"] = json!(content);
        }
    }
    stored
}

#[derive(Default)]
pub struct FakeWorkspace {
    rows: Mutex<HashMap<String, Vec<Value>>>,
    children: Mutex<HashMap<String, Vec<Value>>>,
    /// Number of upcoming calls that fail, per operation name
    failures: Mutex<HashMap<&'static str, u32>>,
    pub queries: Mutex<Vec<(String, Value)>>,
    pub writes: Mutex<Vec<(&'static str, String, Value)>>,
    next_id: Mutex<u32>,
}

impl FakeWorkspace {
    pub fn with_rows(self, database_id: &str, rows: Vec<Value>) -> Self {
        self.rows.lock().unwrap().insert(database_id.to_string(), rows);
        self
    }

    pub fn with_children(self, block_id: &str, children: Vec<Value>) -> Self {
        self.children
            .lock()
            .unwrap()
            .insert(block_id.to_string(), children);
        self
    }

    /// Make the next `times` calls to `operation` fail with a 503.
    pub fn failing(self, operation: &'static str, times: u32) -> Self {
        self.failures.lock().unwrap().insert(operation, times);
        self
    }

    pub fn children_of(&self, block_id: &str) -> Vec<Value> {
        self.children
            .lock()
            .unwrap()
            .get(block_id)
            .cloned()
            .unwrap_or_default()
    }

    fn take_failure(&self, operation: &'static str) -> ServiceResult<()> {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(operation) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Err(unavailable("Notion"))
            }
            _ => Ok(()),
        }
    }
}

impl WorkspaceApi for FakeWorkspace {
    async fn query_database(&self, database_id: &str, body: &Value) -> ServiceResult<Vec<Value>> {
        self.take_failure("query_database")?;
        self.queries
            .lock()
            .unwrap()
            .push((database_id.to_string(), body.clone()));
        self.rows
            .lock()
            .unwrap()
            .get(database_id)
            .cloned()
            .ok_or_else(|| ServiceError::Status {
                service: "Notion",
                status: 404,
                body: "object_not_found".to_string(),
            })
    }

    async fn list_children(&self, block_id: &str) -> ServiceResult<Vec<Value>> {
        self.take_failure("list_children")?;
        Ok(self.children_of(block_id))
    }

    async fn update_block(&self, block_id: &str, body: &Value) -> ServiceResult<()> {
        self.take_failure("update_block")?;
        self.writes
            .lock()
            .unwrap()
            .push(("update", block_id.to_string(), body.clone()));

        let mut children = self.children.lock().unwrap();
        let block = children
            .values_mut()
            .flatten()
            .find(|b| b.get("id").and_then(Value::as_str) == Some(block_id))
            .ok_or_else(|| ServiceError::unexpected("Notion", "no such block"))?;
        block["callout"] = as_stored(&body["callout"]);
        Ok(())
    }

    async fn append_children(&self, block_id: &str, body: &Value) -> ServiceResult<()> {
        self.take_failure("append_children")?;
        self.writes
            .lock()
            .unwrap()
            .push(("append", block_id.to_string(), body.clone()));

        let new_blocks: Vec<Value> = body["children"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|child| {
                let mut next_id = self.next_id.lock().unwrap();
                *next_id += 1;
                json!({
                    "object": "block",
                    "id": format!("created-{}", *next_id),
                    "type": child["type"],
                    "callout": as_stored(&child["callout"]),
                })
            })
            .collect();

        self.children
            .lock()
            .unwrap()
            .entry(block_id.to_string())
            .or_default()
            .extend(new_blocks);
        Ok(())
    }
}

pub struct FakeCalendar {
    events: Vec<CalendarEvent>,
    failures: Mutex<u32>,
    pub calls: Mutex<u32>,
}

impl FakeCalendar {
    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            failures: Mutex::new(0),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(times: u32) -> Self {
        Self {
            events: Vec::new(),
            failures: Mutex::new(times),
            calls: Mutex::new(0),
        }
    }
}

impl EventSource for FakeCalendar {
    async fn events_on(&self, _day: NaiveDate) -> ServiceResult<Vec<CalendarEvent>> {
        *self.calls.lock().unwrap() += 1;
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(unavailable("Calendar"));
        }
        Ok(self.events.clone())
    }
}

/// Replies from a queue; an exhausted queue fails like an outage.
#[derive(Default)]
pub struct FakeGenerator {
    replies: Mutex<VecDeque<ServiceResult<String>>>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }
}

impl TextGenerator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> ServiceResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unavailable("OpenAI")))
    }
}

pub fn callout(id: &str, text: &str) -> Value {
    json!({
        "object": "block",
        "id": id,
        "type": "callout",
        "callout": { "rich_text": [{ "plain_text": text }] }
    })
}

pub fn paragraph(id: &str, text: &str) -> Value {
    json!({
        "object": "block",
        "id": id,
        "type": "paragraph",
        "paragraph": { "rich_text": [{ "plain_text": text }] }
    })
}

pub fn to_do(id: &str, text: &str, checked: bool) -> Value {
    json!({
        "object": "block",
        "id": id,
        "type": "to_do",
        "to_do": { "rich_text": [{ "plain_text": text }], "checked": checked }
    })
}
