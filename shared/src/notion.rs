//! Typed decoding of Notion database row properties.
//!
//! Rows come back as a loosely typed `properties` object keyed by property
//! name. Every accessor here returns `Option` so callers pick their own
//! default; a missing property, a property of the wrong shape, or an empty
//! value all read as `None`.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One rich-text run as returned by the API. Only `plain_text` is consumed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichTextItem {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateValue {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// A single property value, discriminated by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichTextItem>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichTextItem>,
    },
    Select {
        select: Option<SelectOption>,
    },
    Status {
        status: Option<SelectOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Number {
        number: Option<f64>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Date {
        date: Option<DateValue>,
    },
    CreatedTime {
        created_time: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

/// Concatenate the plain text of a run list.
pub fn plain_text(runs: &[RichTextItem]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read-only view over a row's `properties` object.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    inner: Map<String, Value>,
}

impl Properties {
    pub fn new(inner: Map<String, Value>) -> Self {
        Self { inner }
    }

    /// Extract the `properties` object of a database row.
    ///
    /// Returns `None` when the row has no `properties` object at all, which
    /// callers treat as an unreadable item.
    pub fn from_row(row: &Value) -> Option<Self> {
        row.get("properties")
            .and_then(Value::as_object)
            .map(|map| Self::new(map.clone()))
    }

    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        let raw = self.inner.get(name)?;
        match serde_json::from_value::<PropertyValue>(raw.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Property '{}' did not decode: {}", name, e);
                None
            }
        }
    }

    pub fn title(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            PropertyValue::Title { title } => non_empty(plain_text(&title)),
            _ => None,
        }
    }

    pub fn rich_text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            PropertyValue::RichText { rich_text } => non_empty(plain_text(&rich_text)),
            _ => None,
        }
    }

    /// Title or rich text, whichever shape the property has.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            PropertyValue::Title { title } => non_empty(plain_text(&title)),
            PropertyValue::RichText { rich_text } => non_empty(plain_text(&rich_text)),
            _ => None,
        }
    }

    pub fn select(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            PropertyValue::Select { select } => select.and_then(|s| non_empty(s.name)),
            _ => None,
        }
    }

    pub fn status(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            PropertyValue::Status { status } => status.and_then(|s| non_empty(s.name)),
            _ => None,
        }
    }

    pub fn multi_select(&self, name: &str) -> Option<Vec<String>> {
        match self.get(name)? {
            PropertyValue::MultiSelect { multi_select } => {
                let names: Vec<String> = multi_select
                    .into_iter()
                    .filter_map(|s| non_empty(s.name))
                    .collect();
                if names.is_empty() {
                    None
                } else {
                    Some(names)
                }
            }
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            PropertyValue::Number { number } => number,
            _ => None,
        }
    }

    pub fn checkbox(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Checkbox { checkbox } => Some(checkbox),
            _ => None,
        }
    }

    /// Start of a `date` property, as the raw ISO string.
    pub fn date_start(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            PropertyValue::Date { date } => date.and_then(|d| d.start).and_then(non_empty),
            _ => None,
        }
    }

    pub fn created_time(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            PropertyValue::CreatedTime { created_time } => created_time.and_then(non_empty),
            _ => None,
        }
    }
}
