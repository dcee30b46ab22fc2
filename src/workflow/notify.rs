use crate::context::AppContext;
use crate::domain::message::{MessageContext, Requester, build_message};
use crate::domain::notification::{NotificationResult, failure_summary};
use crate::domain::settings::resolve_recipients;
use crate::domain::ticket::{Ticket, non_blank};
use crate::domain::user::{EMPLOYEE_ROLE, resolve_role};
use crate::error::AppResult;
use crate::services::DocumentStore;
use crate::workflow::dispatch::dispatch;

/// A freshly created ticket document and its id, as delivered by the trigger.
#[derive(Debug, Clone)]
pub struct TicketCreatedEvent {
    pub ticket_id: String,
    pub ticket: Ticket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotNew,
    MissingCreator,
    NotEmployee,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Notify { creator: String },
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Skipped(SkipReason),
    NoRecipients,
    Dispatched(Vec<NotificationResult>),
}

/// Trigger entry point. Notification problems are logged and swallowed so
/// they never affect the ticket write that fired the event.
pub async fn handle_ticket_created(ctx: &AppContext, event: &TicketCreatedEvent) {
    if let Err(err) = notify_ticket_created(ctx, event).await {
        tracing::error!(
            ticket_id = %event.ticket_id,
            error = %err,
            "ticket notification aborted"
        );
    }
}

pub async fn notify_ticket_created(
    ctx: &AppContext,
    event: &TicketCreatedEvent,
) -> AppResult<NotifyOutcome> {
    let ticket_id = event.ticket_id.as_str();
    let ticket = &event.ticket;

    let creator = match filter_ticket(ctx.store.as_ref(), &ctx.config.admin_email, ticket_id, ticket)
        .await
    {
        FilterDecision::Notify { creator } => creator,
        FilterDecision::Skip(reason) => return Ok(NotifyOutcome::Skipped(reason)),
    };

    let settings = match ctx.store.notification_settings().await {
        Ok(Some(settings)) => Some(settings),
        Ok(None) => {
            tracing::debug!(ticket_id, "no notification settings stored; using fallback recipient");
            None
        }
        Err(err) => {
            tracing::warn!(
                ticket_id,
                error = %err,
                "notification settings lookup failed; using fallback recipient"
            );
            None
        }
    };
    let recipients = resolve_recipients(
        settings.as_ref(),
        ctx.config.fallback_recipient.as_deref(),
    );
    if recipients.is_empty() {
        tracing::info!(ticket_id, "no notification recipients configured; skipping");
        return Ok(NotifyOutcome::NoRecipients);
    }

    let employee = match non_blank(ticket.contact_id.as_deref()) {
        Some(contact_id) => match ctx.store.employee(contact_id).await {
            Ok(employee) => employee,
            Err(err) => {
                tracing::warn!(ticket_id, contact_id, error = %err, "employee lookup failed");
                None
            }
        },
        None => None,
    };
    let requester = Requester::resolve(ticket, employee.as_ref());
    let ticket_url = ctx.config.ticket_url(ticket_id);
    let message = build_message(
        &MessageContext {
            ticket_id,
            ticket,
            requester: &requester,
            ticket_url: &ticket_url,
        },
        settings.as_ref().and_then(|s| s.custom_template()),
    );

    let results = dispatch(
        ctx.messaging.as_ref(),
        ctx.config.slack_bot_token.as_deref(),
        &recipients,
        &message,
    )
    .await;

    let sent = results.iter().filter(|r| r.success).count();
    let failures = failure_summary(&results);
    if failures.is_empty() {
        tracing::info!(ticket_id, creator = %creator, sent, failed = 0, "ticket notification finished");
    } else {
        tracing::warn!(
            ticket_id,
            creator = %creator,
            sent,
            failed = failures.len(),
            failures = ?failures,
            "ticket notification finished with failures"
        );
    }
    Ok(NotifyOutcome::Dispatched(results))
}

/// Decides whether a ticket deserves a notification: it must be brand new and
/// created by an employee.
pub async fn filter_ticket(
    store: &dyn DocumentStore,
    admin_email: &str,
    ticket_id: &str,
    ticket: &Ticket,
) -> FilterDecision {
    if !ticket.is_new() {
        tracing::debug!(ticket_id, "ticket is not a fresh creation; skipping");
        return FilterDecision::Skip(SkipReason::NotNew);
    }

    let Some(email) = ticket.creator_email() else {
        tracing::info!(ticket_id, "ticket has no creator email; skipping");
        return FilterDecision::Skip(SkipReason::MissingCreator);
    };

    let user = match store.find_user_by_email(email).await {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(ticket_id, creator = email, error = %err, "creator lookup failed");
            return FilterDecision::Skip(SkipReason::NotEmployee);
        }
    };

    let role = resolve_role(user.as_ref(), email, admin_email);
    if role.as_deref() != Some(EMPLOYEE_ROLE) {
        tracing::info!(
            ticket_id,
            creator = email,
            role = role.as_deref().unwrap_or("unresolved"),
            "ticket not created by an employee; skipping"
        );
        return FilterDecision::Skip(SkipReason::NotEmployee);
    }

    tracing::debug!(ticket_id, creator = email, "ticket qualifies for notification");
    FilterDecision::Notify {
        creator: email.to_string(),
    }
}
