use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::ticket::lenient_string;

/// Singleton notification configuration saved from the admin app.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    /// `None` when the document has no `recipients` field at all.
    #[serde(deserialize_with = "string_entries")]
    pub recipients: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_string")]
    pub custom_message: Option<String>,
}

impl NotificationSettings {
    pub fn custom_template(&self) -> Option<&str> {
        self.custom_message
            .as_deref()
            .filter(|template| !template.trim().is_empty())
    }
}

// Non-string entries are dropped; a non-array value counts as an empty list.
fn string_entries<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        Some(_) => Some(Vec::new()),
    })
}

/// Strips surrounding whitespace and any embedded line breaks.
pub fn clean_identifier(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// Decides who receives a notification.
///
/// An existing settings record always wins, even when its list is empty or
/// absent: that is how an operator silences notifications. The fallback id is
/// only used when no settings record exists.
pub fn resolve_recipients(settings: Option<&NotificationSettings>, fallback: Option<&str>) -> Vec<String> {
    match settings {
        Some(settings) => settings
            .recipients
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|raw| clean_identifier(raw))
            .filter(|id| !id.is_empty())
            .collect(),
        None => fallback
            .map(clean_identifier)
            .filter(|id| !id.is_empty())
            .into_iter()
            .collect(),
    }
}
