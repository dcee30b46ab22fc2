use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const CREATED_ACTION: &str = "created";

/// Snapshot of a ticket document as written by the admin app.
///
/// Every field is optional and wrongly typed values are dropped: the snapshot
/// comes from an untyped document store and bad data must degrade to "do not
/// notify" rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ticket {
    #[serde(deserialize_with = "lenient_string")]
    pub folio: Option<String>,
    pub created_at: Option<Value>,
    #[serde(deserialize_with = "lenient_history")]
    pub history: Vec<HistoryEntry>,
    #[serde(deserialize_with = "lenient_string")]
    pub created_by: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub priority: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub machine: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub element_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub action: Option<String>,
}

// Numbers are kept as text (Firestore folios may be integers); anything else
// that is not a string is dropped.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// A history that is not a list reads as empty; an entry that is not an object
// reads as an entry without action. Neither can pass `is_new`.
fn lenient_history<'de, D>(deserializer: D) -> Result<Vec<HistoryEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

impl Ticket {
    /// A ticket is new when it carries a creation timestamp and exactly one
    /// history entry, the "created" one. Edits append to the history.
    pub fn is_new(&self) -> bool {
        let has_timestamp = match &self.created_at {
            None | Some(Value::Null) => false,
            Some(Value::String(raw)) => !raw.trim().is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Bool(set)) => *set,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::Array(items)) => !items.is_empty(),
        };
        has_timestamp
            && self.history.len() == 1
            && self.history[0].action.as_deref() == Some(CREATED_ACTION)
    }

    pub fn creator_email(&self) -> Option<&str> {
        non_blank(self.created_by.as_deref())
    }

    pub fn priority(&self) -> Priority {
        self.priority
            .as_deref()
            .and_then(Priority::from_str)
            .unwrap_or(Priority::Medium)
    }

    pub fn category_label(&self) -> String {
        match non_blank(self.category.as_deref()) {
            Some(raw) => Category::from_str(raw)
                .map(|category| category.label().to_string())
                .unwrap_or_else(|| raw.to_string()),
            None => "N/A".to_string(),
        }
    }

    pub fn status_label(&self) -> &'static str {
        self.status
            .as_deref()
            .and_then(Status::from_str)
            .map(|status| status.label())
            .unwrap_or("Abierto")
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Critical => "🔴 Crítica",
            Priority::High => "🟠 Alta",
            Priority::Medium => "🟡 Media",
            Priority::Low => "🟢 Baja",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Hardware,
    Software,
    Network,
    Other,
}

impl Category {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "hardware" => Some(Category::Hardware),
            "software" => Some(Category::Software),
            "network" => Some(Category::Network),
            "other" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Hardware => "Hardware",
            Category::Software => "Software",
            Category::Network => "Red",
            Category::Other => "Otro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "open" => Some(Status::Open),
            "in_progress" => Some(Status::InProgress),
            "resolved" => Some(Status::Resolved),
            "closed" => Some(Status::Closed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Open => "🔓 Abierto",
            Status::InProgress => "⏳ En Progreso",
            Status::Resolved => "✅ Resuelto",
            Status::Closed => "🔒 Cerrado",
        }
    }
}
