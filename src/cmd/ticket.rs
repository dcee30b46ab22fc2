use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use serde_json::Value;

use crate::context::AppContext;
use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};
use crate::infra::firestore::FirestoreDocument;
use crate::workflow::notify::{TicketCreatedEvent, handle_ticket_created};

#[derive(Debug, Clone)]
pub struct TicketCommandArgs {
    pub ticket_id: Option<String>,
    pub snapshot: Option<PathBuf>,
}

pub async fn run(ctx: &AppContext, args: TicketCommandArgs) -> AppResult<()> {
    let raw = match &args.snapshot {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let event = parse_event(&raw, args.ticket_id)?;
    tracing::info!(ticket_id = %event.ticket_id, "handling ticket creation");
    handle_ticket_created(ctx, &event).await;
    Ok(())
}

/// Accepts either a plain ticket object or a Firestore REST document.
pub fn parse_event(raw: &str, ticket_id: Option<String>) -> AppResult<TicketCreatedEvent> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(AppError::InvalidEvent(
            "ticket snapshot must be a JSON object".to_string(),
        ));
    }

    let (document_id, data) = if value.get("fields").is_some_and(Value::is_object) {
        let document: FirestoreDocument = serde_json::from_value(value)?;
        let id = document.id().map(str::to_string);
        (id, document.into_plain())
    } else {
        let id = value.get("id").and_then(Value::as_str).map(str::to_string);
        (id, value)
    };

    let ticket_id = ticket_id
        .or(document_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidEvent("ticket id not provided".to_string()))?;
    let ticket: Ticket = serde_json::from_value(data)?;

    Ok(TicketCreatedEvent { ticket_id, ticket })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_snapshot() {
        let event = parse_event(
            r#"{"id":"tk-9","folio":"T-9","history":[{"action":"created"}]}"#,
            None,
        )
        .unwrap();
        assert_eq!(event.ticket_id, "tk-9");
        assert_eq!(event.ticket.folio.as_deref(), Some("T-9"));
    }

    #[test]
    fn explicit_id_wins() {
        let event = parse_event(r#"{"id":"tk-9"}"#, Some(" tk-1 ".to_string())).unwrap();
        assert_eq!(event.ticket_id, "tk-1");
    }

    #[test]
    fn parses_firestore_document() {
        let event = parse_event(
            r#"{
                "name": "projects/p/databases/(default)/documents/tickets/abc",
                "fields": { "folio": { "stringValue": "T-3" } }
            }"#,
            None,
        )
        .unwrap();
        assert_eq!(event.ticket_id, "abc");
        assert_eq!(event.ticket.folio.as_deref(), Some("T-3"));
    }

    #[test]
    fn wrongly_typed_fields_do_not_fail_parsing() {
        let event = parse_event(
            r#"{
                "id": "tk-5",
                "folio": 100,
                "createdAt": "2025-03-01T10:00:00Z",
                "history": [{ "action": "created" }],
                "machine": { "id": "m1" }
            }"#,
            None,
        )
        .unwrap();
        assert_eq!(event.ticket.folio.as_deref(), Some("100"));
        assert_eq!(event.ticket.machine, None);
        assert!(event.ticket.is_new());

        let event = parse_event(
            r#"{"id":"tk-6","createdAt":"2025-03-01T10:00:00Z","history":"created"}"#,
            None,
        )
        .unwrap();
        assert!(!event.ticket.is_new());
    }

    #[test]
    fn firestore_integer_folio_is_kept_as_text() {
        let event = parse_event(
            r#"{
                "name": "projects/p/databases/(default)/documents/tickets/abc",
                "fields": { "folio": { "integerValue": "100" } }
            }"#,
            None,
        )
        .unwrap();
        assert_eq!(event.ticket.folio.as_deref(), Some("100"));
    }

    #[test]
    fn rejects_snapshot_without_id() {
        assert!(matches!(
            parse_event(r#"{"folio":"T-3"}"#, None),
            Err(AppError::InvalidEvent(_))
        ));
        assert!(matches!(
            parse_event("[1, 2]", Some("x".to_string())),
            Err(AppError::InvalidEvent(_))
        ));
        assert!(matches!(parse_event("not json", None), Err(AppError::Json(_))));
    }
}
