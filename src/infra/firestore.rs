use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::FirestoreConfig;
use crate::domain::settings::NotificationSettings;
use crate::domain::user::{Employee, User};
use crate::error::{AppError, AppResult};
use crate::services::DocumentStore;

const FIRESTORE_HOST: &str = "https://firestore.googleapis.com";
const USERS_COLLECTION: &str = "users";
const EMPLOYEES_COLLECTION: &str = "employees";
const NOTIFICATION_SETTINGS_PATH: &str = "settings/notifications";

/// Document store backed by the Firestore REST API.
pub struct FirestoreClient {
    http: Client,
    documents_url: String,
    access_token: Option<String>,
}

impl FirestoreClient {
    pub fn new(config: &FirestoreConfig, timeout: Duration) -> AppResult<Self> {
        let project_id = config.project_id.as_deref().ok_or_else(|| {
            AppError::Configuration("Firestore project id not configured".to_string())
        })?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;

        // The emulator speaks plain HTTP and ignores credentials.
        let (host, access_token) = match &config.emulator_host {
            Some(emulator) => (format!("http://{emulator}"), None),
            None => (FIRESTORE_HOST.to_string(), config.access_token.clone()),
        };

        Ok(Self {
            http,
            documents_url: Self::documents_url(&host, project_id, &config.database),
            access_token,
        })
    }

    fn documents_url(host: &str, project_id: &str, database: &str) -> String {
        format!(
            "{}/v1/projects/{project_id}/databases/{database}/documents",
            host.trim_end_matches('/')
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn get_document<T: DeserializeOwned>(&self, path: &str) -> AppResult<Option<T>> {
        let url = format!("{}/{}", self.documents_url, path.trim_start_matches('/'));
        let response = self
            .authorize(self.http.get(&url).header(ACCEPT, "application/json"))
            .send()
            .await
            .map_err(|err| AppError::DocumentStore(format!("failed to read {path}: {err}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = read_body(response, status, path).await?;
        let document: FirestoreDocument = serde_json::from_str(&body).map_err(|err| {
            AppError::DocumentStore(format!("failed to parse document {path}: {err}"))
        })?;

        document.into_typed().map(Some)
    }

    async fn query_first_by_field<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> AppResult<Option<T>> {
        let url = format!("{}:runQuery", self.documents_url);
        let request_body = RunQueryRequest::field_equals(collection, field, value, 1);

        let response = self
            .authorize(self.http.post(&url).header(ACCEPT, "application/json"))
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                AppError::DocumentStore(format!("failed to query {collection}: {err}"))
            })?;

        let status = response.status();
        let body = read_body(response, status, collection).await?;
        let items: Vec<RunQueryResponseItem> = serde_json::from_str(&body).map_err(|err| {
            AppError::DocumentStore(format!("failed to parse {collection} query: {err}"))
        })?;

        items
            .into_iter()
            .find_map(|item| item.document)
            .map(FirestoreDocument::into_typed)
            .transpose()
    }
}

async fn read_body(response: reqwest::Response, status: StatusCode, what: &str) -> AppResult<String> {
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unable to read response>".to_string());
    if !status.is_success() {
        return Err(AppError::DocumentStore(format!(
            "Firestore responded with {status} for {what}: {body}"
        )));
    }
    Ok(body)
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        // Emails are stored lowercased by the admin app.
        let normalized = email.trim().to_lowercase();
        self.query_first_by_field(USERS_COLLECTION, "email", &normalized)
            .await
    }

    async fn notification_settings(&self) -> AppResult<Option<NotificationSettings>> {
        self.get_document(NOTIFICATION_SETTINGS_PATH).await
    }

    async fn employee(&self, id: &str) -> AppResult<Option<Employee>> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Ok(None);
        }
        self.get_document(&format!("{EMPLOYEES_COLLECTION}/{id}"))
            .await
    }
}

/// A document in the REST wire format: typed values wrapped in `fields`.
#[derive(Debug, Deserialize)]
pub struct FirestoreDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl FirestoreDocument {
    /// Last path segment of the document name.
    pub fn id(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|id| !id.is_empty())
    }

    pub fn into_plain(self) -> Value {
        decode_fields(self.fields)
    }

    fn into_typed<T: DeserializeOwned>(self) -> AppResult<T> {
        serde_json::from_value(self.into_plain())
            .map_err(|err| AppError::DocumentStore(format!("unexpected document shape: {err}")))
    }
}

/// Converts `{"fieldName": {"stringValue": "x"}, ...}` into plain JSON.
pub fn decode_fields(fields: Map<String, Value>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key, decode_value(value)))
            .collect(),
    )
}

fn decode_value(value: Value) -> Value {
    let mut wrapper = match value {
        Value::Object(wrapper) if wrapper.len() == 1 => wrapper,
        other => return other,
    };
    let Some((kind, inner)) = wrapper.iter_mut().next().map(|(k, v)| (k.clone(), v.take())) else {
        return Value::Object(wrapper);
    };

    match (kind.as_str(), inner) {
        ("nullValue", _) => Value::Null,
        ("integerValue", Value::String(raw)) => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::String(raw)),
        ("arrayValue", Value::Object(mut array)) => match array.remove("values") {
            Some(Value::Array(values)) => {
                Value::Array(values.into_iter().map(decode_value).collect())
            }
            _ => Value::Array(Vec::new()),
        },
        ("mapValue", Value::Object(mut map)) => match map.remove("fields") {
            Some(Value::Object(fields)) => decode_fields(fields),
            _ => Value::Object(Map::new()),
        },
        (
            "stringValue" | "booleanValue" | "doubleValue" | "timestampValue" | "bytesValue"
            | "referenceValue" | "geoPointValue",
            inner,
        ) => inner,
        (_, inner) => {
            let mut restored = Map::new();
            restored.insert(kind.clone(), inner);
            Value::Object(restored)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest {
    structured_query: StructuredQuery,
}

impl RunQueryRequest {
    fn field_equals(collection: &str, field: &str, value: &str, limit: u32) -> Self {
        Self {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection.to_string(),
                }],
                r#where: QueryFilter {
                    field_filter: FieldFilter {
                        field: FieldReference {
                            field_path: field.to_string(),
                        },
                        op: "EQUAL",
                        value: serde_json::json!({ "stringValue": value }),
                    },
                },
                limit,
            },
        }
    }
}

#[derive(Serialize)]
struct StructuredQuery {
    from: Vec<CollectionSelector>,
    r#where: QueryFilter,
    limit: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector {
    collection_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryFilter {
    field_filter: FieldFilter,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldFilter {
    field: FieldReference,
    op: &'static str,
    value: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference {
    field_path: String,
}

#[derive(Deserialize)]
struct RunQueryResponseItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::ticket::Ticket;

    #[test]
    fn decodes_typed_values() {
        let document: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/tickets/abc123",
            "fields": {
                "folio": { "stringValue": "T-100" },
                "createdAt": { "timestampValue": "2025-03-01T10:00:00Z" },
                "count": { "integerValue": "3" },
                "urgent": { "booleanValue": true },
                "machine": { "nullValue": null },
                "history": { "arrayValue": { "values": [
                    { "mapValue": { "fields": { "action": { "stringValue": "created" } } } }
                ] } },
                "tags": { "arrayValue": {} },
            },
        }))
        .unwrap();

        assert_eq!(document.id(), Some("abc123"));
        assert_eq!(
            document.into_plain(),
            json!({
                "folio": "T-100",
                "createdAt": "2025-03-01T10:00:00Z",
                "count": 3,
                "urgent": true,
                "machine": null,
                "history": [{ "action": "created" }],
                "tags": [],
            })
        );
    }

    #[test]
    fn decoded_ticket_is_new() {
        let document: FirestoreDocument = serde_json::from_value(json!({
            "fields": {
                "createdAt": { "timestampValue": "2025-03-01T10:00:00Z" },
                "history": { "arrayValue": { "values": [
                    { "mapValue": { "fields": { "action": { "stringValue": "created" } } } }
                ] } },
            },
        }))
        .unwrap();
        assert_eq!(document.id(), None);
        let ticket: Ticket = serde_json::from_value(document.into_plain()).unwrap();
        assert!(ticket.is_new());
    }

    #[test]
    fn builds_user_query() {
        let body = serde_json::to_value(RunQueryRequest::field_equals(
            "users",
            "email",
            "ana@fixify.com",
            1,
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({
                "structuredQuery": {
                    "from": [{ "collectionId": "users" }],
                    "where": { "fieldFilter": {
                        "field": { "fieldPath": "email" },
                        "op": "EQUAL",
                        "value": { "stringValue": "ana@fixify.com" },
                    } },
                    "limit": 1,
                },
            })
        );
    }

    #[test]
    fn builds_documents_url() {
        assert_eq!(
            FirestoreClient::documents_url("http://localhost:8080/", "fixify", "(default)"),
            "http://localhost:8080/v1/projects/fixify/databases/(default)/documents"
        );
    }

    #[test]
    fn requires_project_id() {
        let config = FirestoreConfig {
            project_id: None,
            database: "(default)".to_string(),
            access_token: None,
            emulator_host: None,
        };
        assert!(matches!(
            FirestoreClient::new(&config, Duration::from_secs(1)),
            Err(AppError::Configuration(_))
        ));
    }
}
