//! Database query shapes and row projection into display strings.
//!
//! A `DatabaseQuery` is pure data: which database, which filter, how many
//! rows, and how to turn each row into one line of text.

use serde_json::{json, Value};
use shared::notion::Properties;

/// Placeholder for a row whose `properties` object could not be read
pub const UNREADABLE_ITEM: &str = "Unreadable item";

#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Select(String),
    Status(String),
    Checkbox(bool),
}

/// Equality filter on one property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub property: String,
    pub condition: FilterCondition,
}

impl PropertyFilter {
    pub fn select(property: impl Into<String>, equals: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            condition: FilterCondition::Select(equals.into()),
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn status(property: impl Into<String>, equals: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            condition: FilterCondition::Status(equals.into()),
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn checkbox(property: impl Into<String>, equals: bool) -> Self {
        Self {
            property: property.into(),
            condition: FilterCondition::Checkbox(equals),
        }
    }

    pub fn to_json(&self) -> Value {
        match &self.condition {
            FilterCondition::Select(v) => {
                json!({ "property": self.property, "select": { "equals": v } })
            }
            FilterCondition::Status(v) => {
                json!({ "property": self.property, "status": { "equals": v } })
            }
            FilterCondition::Checkbox(v) => {
                json!({ "property": self.property, "checkbox": { "equals": v } })
            }
        }
    }
}

#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }
}

#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, PartialEq)]
pub enum Sort {
    Property(String, SortDirection),
    CreatedTime(SortDirection),
    LastEditedTime(SortDirection),
}

impl Sort {
    pub fn to_json(&self) -> Value {
        match self {
            Sort::Property(name, dir) => json!({ "property": name, "direction": dir.as_str() }),
            Sort::CreatedTime(dir) => json!({ "timestamp": "created_time", "direction": dir.as_str() }),
            Sort::LastEditedTime(dir) => {
                json!({ "timestamp": "last_edited_time", "direction": dir.as_str() })
            }
        }
    }
}

/// How to read one property for display
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Title,
    RichText,
    /// Title or rich text
    Text,
    Select,
    Status,
    MultiSelect,
    Number,
    /// Number stored as a fraction, shown as a whole percentage
    Percent,
    Checkbox,
    Date,
    CreatedTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Placeholder name used in the template, without braces
    pub key: String,
    pub property: String,
    pub kind: FieldKind,
    pub default: String,
}

impl FieldSpec {
    pub fn new(
        key: impl Into<String>,
        property: impl Into<String>,
        kind: FieldKind,
        default: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            property: property.into(),
            kind,
            default: default.into(),
        }
    }

    /// Read this field from a row, falling back to the default.
    pub fn read(&self, props: &Properties) -> String {
        let name = self.property.as_str();
        let value = match self.kind {
            FieldKind::Title => props.title(name),
            FieldKind::RichText => props.rich_text(name),
            FieldKind::Text => props.text(name),
            FieldKind::Select => props.select(name),
            FieldKind::Status => props.status(name),
            FieldKind::MultiSelect => props.multi_select(name).map(|v| v.join(", ")),
            FieldKind::Number => props.number(name).map(format_number),
            FieldKind::Percent => props.number(name).map(|n| format!("{}%", (n * 100.0) as i64)),
            FieldKind::Checkbox => props
                .checkbox(name)
                .map(|b| if b { "yes".to_string() } else { "no".to_string() }),
            FieldKind::Date => props.date_start(name),
            FieldKind::CreatedTime => props
                .created_time(name)
                .map(|t| t.split('T').next().unwrap_or_default().to_string()),
        };
        value.unwrap_or_else(|| self.default.clone())
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One configured database query and its row projection
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseQuery {
    pub label: String,
    pub database_id: String,
    pub filter: Option<PropertyFilter>,
    pub sorts: Vec<Sort>,
    pub page_size: u32,
    pub fields: Vec<FieldSpec>,
    /// Display template, e.g. `"{type}: {title}"`
    pub template: String,
    pub empty_message: String,
    pub error_message: String,
}

impl DatabaseQuery {
    pub fn new(label: impl Into<String>, database_id: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            empty_message: format!("No {} found", label.to_lowercase()),
            error_message: format!("Error accessing {}", label.to_lowercase()),
            label,
            database_id: database_id.into(),
            filter: None,
            sorts: Vec::new(),
            page_size: 10,
            fields: Vec::new(),
            template: String::new(),
        }
    }

    pub fn filter(mut self, filter: PropertyFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn request_body(&self) -> Value {
        let mut body = json!({ "page_size": self.page_size.clamp(1, 100) });
        if let Some(ref filter) = self.filter {
            body["filter"] = filter.to_json();
        }
        if !self.sorts.is_empty() {
            body["sorts"] = Value::Array(self.sorts.iter().map(Sort::to_json).collect());
        }
        body
    }

    /// Render one row. Never fails: an unreadable row becomes [`UNREADABLE_ITEM`].
    pub fn project(&self, row: &Value) -> String {
        let Some(props) = Properties::from_row(row) else {
            let id = row.get("id").and_then(Value::as_str).unwrap_or("<no id>");
            tracing::warn!("{}: row {} has no readable properties", self.label, id);
            return UNREADABLE_ITEM.to_string();
        };

        self.fields.iter().fold(self.template.clone(), |acc, field| {
            acc.replace(&format!("{{{}}}", field.key), &field.read(&props))
        })
    }

    /// Project the rows, honouring `page_size` even if the service returns more.
    pub fn project_rows(&self, rows: &[Value]) -> Vec<String> {
        rows.iter()
            .take(self.page_size as usize)
            .map(|row| self.project(row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goals_query() -> DatabaseQuery {
        DatabaseQuery::new("Goals", "db-goals")
            .filter(PropertyFilter::select("Status", "🔄 In Progress"))
            .page_size(3)
            .field(FieldSpec::new("title", "Goal", FieldKind::Title, "Untitled Goal"))
            .field(FieldSpec::new("progress", "Progress", FieldKind::Percent, "0%"))
            .field(FieldSpec::new("level", "Level", FieldKind::Select, "Goal"))
            .template("{level}: {title} ({progress} complete)")
    }

    #[test]
    fn test_request_body() {
        let body = goals_query()
            .sort(Sort::CreatedTime(SortDirection::Descending))
            .request_body();
        assert_eq!(body["page_size"], 3);
        assert_eq!(body["filter"]["property"], "Status");
        assert_eq!(body["filter"]["select"]["equals"], "🔄 In Progress");
        assert_eq!(body["sorts"][0]["timestamp"], "created_time");
        assert_eq!(body["sorts"][0]["direction"], "descending");
    }

    #[test]
    fn test_filter_shapes() {
        assert_eq!(
            PropertyFilter::checkbox("Done", false).to_json(),
            json!({"property": "Done", "checkbox": {"equals": false}})
        );
        assert_eq!(
            PropertyFilter::status("State", "Active").to_json(),
            json!({"property": "State", "status": {"equals": "Active"}})
        );
    }

    #[test]
    fn test_project_full_row() {
        let row = json!({
            "id": "r1",
            "properties": {
                "Goal": {"type": "title", "title": [{"plain_text": "Ship v2"}]},
                "Progress": {"type": "number", "number": 0.4},
                "Level": {"type": "select", "select": {"name": "Quarterly"}}
            }
        });
        assert_eq!(goals_query().project(&row), "Quarterly: Ship v2 (40% complete)");
    }

    #[test]
    fn test_project_missing_fields_use_defaults() {
        let row = json!({"id": "r2", "properties": {}});
        assert_eq!(goals_query().project(&row), "Goal: Untitled Goal (0% complete)");
    }

    #[test]
    fn test_project_malformed_row_is_placeholder() {
        assert_eq!(goals_query().project(&json!({"id": "r3"})), UNREADABLE_ITEM);
        assert_eq!(goals_query().project(&json!("junk")), UNREADABLE_ITEM);
    }

    #[test]
    fn test_project_rows_respects_page_size() {
        let rows: Vec<Value> = (0..5).map(|_| json!({"properties": {}})).collect();
        assert_eq!(goals_query().project_rows(&rows).len(), 3);
    }

    #[test]
    fn test_field_kinds() {
        let props = Properties::from_row(&json!({"properties": {
            "Tags": {"type": "multi_select", "multi_select": [{"name": "a"}, {"name": "b"}]},
            "Count": {"type": "number", "number": 3.0},
            "Done": {"type": "checkbox", "checkbox": true},
            "Created": {"type": "created_time", "created_time": "2025-03-01T10:00:00.000Z"}
        }}))
        .unwrap();

        let read = |kind, property| FieldSpec::new("k", property, kind, "-").read(&props);
        assert_eq!(read(FieldKind::MultiSelect, "Tags"), "a, b");
        assert_eq!(read(FieldKind::Number, "Count"), "3");
        assert_eq!(read(FieldKind::Checkbox, "Done"), "yes");
        assert_eq!(read(FieldKind::CreatedTime, "Created"), "2025-03-01");
        assert_eq!(read(FieldKind::Date, "Missing"), "-");
    }

    #[test]
    fn test_default_sentinels() {
        let q = DatabaseQuery::new("Captures", "db");
        assert_eq!(q.empty_message, "No captures found");
        assert_eq!(q.error_message, "Error accessing captures");
    }
}
