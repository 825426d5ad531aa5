//! Notion block shapes: reading a page's children and building callout payloads.

use serde::Serialize;
use serde_json::{json, Value};

use crate::markdown::TextRun;
use crate::notion::RichTextItem;

/// Block types whose text is meaningful as a display item
const TEXT_BLOCK_TYPES: &[&str] = &[
    "paragraph",
    "bulleted_list_item",
    "numbered_list_item",
    "heading_1",
    "heading_2",
    "heading_3",
    "callout",
    "quote",
    "to_do",
];

/// A child block, reduced to what the fetcher and publisher need.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub block_type: String,
    pub text: String,
    /// `Some` only for `to_do` blocks
    pub checked: Option<bool>,
}

impl Block {
    /// Decode one element of a `results` array. Returns `None` when the
    /// element has no id or type.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id")?.as_str()?.to_string();
        let block_type = value.get("type")?.as_str()?.to_string();
        let body = value.get(&block_type);

        let text = body
            .and_then(|b| b.get("rich_text"))
            .and_then(|rt| serde_json::from_value::<Vec<RichTextItem>>(rt.clone()).ok())
            .map(|runs| crate::notion::plain_text(&runs))
            .unwrap_or_default();

        let checked = if block_type == "to_do" {
            Some(
                body.and_then(|b| b.get("checked"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            )
        } else {
            None
        };

        Some(Self {
            id,
            block_type,
            text,
            checked,
        })
    }

    pub fn is_callout(&self) -> bool {
        self.block_type == "callout"
    }

    pub fn has_text(&self) -> bool {
        TEXT_BLOCK_TYPES.contains(&self.block_type.as_str()) && !self.text.trim().is_empty()
    }

    pub fn first_line(&self) -> &str {
        self.text.lines().next().unwrap_or_default()
    }

    /// Whether this is the callout tagged with `marker`.
    pub fn matches_marker(&self, marker: &str) -> bool {
        self.is_callout() && self.first_line().contains(marker)
    }

    /// Display form: to-dos carry their checkbox state.
    pub fn display(&self) -> String {
        let text = self.text.trim();
        match self.checked {
            Some(true) => format!("[x] {}", text),
            Some(false) => format!("[ ] {}", text),
            None => text.to_string(),
        }
    }
}

/// Visual style of the published callout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalloutStyle {
    /// Text the first line of the block must contain to be recognised
    pub marker: String,
    pub emoji: String,
    pub color: String,
}

impl CalloutStyle {
    pub fn new(marker: impl Into<String>, emoji: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            emoji: emoji.into(),
            color: color.into(),
        }
    }
}

fn rich_text_json(runs: &[TextRun]) -> Vec<Value> {
    runs.iter()
        .map(|run| {
            json!({
                "type": "text",
                "text": { "content": run.content },
                "annotations": { "bold": run.bold },
            })
        })
        .collect()
}

/// Body for `PATCH /v1/blocks/{id}`
pub fn callout_update(style: &CalloutStyle, runs: &[TextRun]) -> Value {
    json!({
        "callout": {
            "rich_text": rich_text_json(runs),
            "icon": { "emoji": style.emoji },
            "color": style.color,
        }
    })
}

/// Body for `PATCH /v1/blocks/{page}/children`
pub fn callout_append(style: &CalloutStyle, runs: &[TextRun]) -> Value {
    json!({
        "children": [{
            "object": "block",
            "type": "callout",
            "callout": {
                "rich_text": rich_text_json(runs),
                "icon": { "emoji": style.emoji },
                "color": style.color,
            }
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_callout() {
        let value = json!({
            "object": "block",
            "id": "b1",
            "type": "callout",
            "callout": {
                "rich_text": [
                    {"plain_text": "🌟 Daily Quote - March 04, 2025\n\n"},
                    {"plain_text": "Quote"}
                ]
            }
        });

        let block = Block::from_value(&value).unwrap();
        assert_eq!(block.id, "b1");
        assert!(block.is_callout());
        assert_eq!(block.first_line(), "🌟 Daily Quote - March 04, 2025");
        assert!(block.matches_marker("Daily Quote"));
        assert!(!block.matches_marker("Morning Insight"));
    }

    #[test]
    fn test_marker_only_matches_callouts_first_line() {
        let paragraph = Block::from_value(&json!({
            "id": "p1", "type": "paragraph",
            "paragraph": {"rich_text": [{"plain_text": "Daily Quote"}]}
        }))
        .unwrap();
        assert!(!paragraph.matches_marker("Daily Quote"));

        let later_line = Block::from_value(&json!({
            "id": "c1", "type": "callout",
            "callout": {"rich_text": [{"plain_text": "Header\nDaily Quote"}]}
        }))
        .unwrap();
        assert!(!later_line.matches_marker("Daily Quote"));
    }

    #[test]
    fn test_to_do_display() {
        let todo = Block::from_value(&json!({
            "id": "t1", "type": "to_do",
            "to_do": {"rich_text": [{"plain_text": "Call mom"}], "checked": false}
        }))
        .unwrap();
        assert_eq!(todo.checked, Some(false));
        assert_eq!(todo.display(), "[ ] Call mom");
        assert!(todo.has_text());
    }

    #[test]
    fn test_block_without_text() {
        let divider = Block::from_value(&json!({"id": "d1", "type": "divider", "divider": {}})).unwrap();
        assert!(!divider.has_text());
        assert!(Block::from_value(&json!({"type": "divider"})).is_none());
    }

    #[test]
    fn test_callout_payloads() {
        let style = CalloutStyle::new("Daily Quote", "✨", "blue_background");
        let runs = vec![
            TextRun::plain("Hello "),
            TextRun::bold("world"),
        ];

        let update = callout_update(&style, &runs);
        assert_eq!(update["callout"]["icon"]["emoji"], "✨");
        assert_eq!(update["callout"]["color"], "blue_background");
        assert_eq!(update["callout"]["rich_text"][1]["annotations"]["bold"], true);

        let append = callout_append(&style, &runs);
        assert_eq!(append["children"][0]["type"], "callout");
        assert_eq!(
            append["children"][0]["callout"]["rich_text"][0]["text"]["content"],
            "Hello "
        );
    }
}
