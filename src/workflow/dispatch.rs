use crate::domain::message::NotificationMessage;
use crate::domain::notification::NotificationResult;
use crate::domain::settings::clean_identifier;
use crate::services::MessagingService;
use crate::services::messaging::BOT_TOKEN_PREFIX;

/// Sends `message` to every recipient, one request each.
///
/// A bad credential fails the whole batch before any request is made. After
/// that, failures are recorded per recipient and never stop the batch.
pub async fn dispatch(
    messaging: &dyn MessagingService,
    raw_token: Option<&str>,
    recipients: &[String],
    message: &NotificationMessage,
) -> Vec<NotificationResult> {
    let token = raw_token.map(clean_identifier).unwrap_or_default();
    if token.is_empty() {
        tracing::error!("Slack bot token not configured; no notifications sent");
        return vec![NotificationResult::batch_failure("bot token not configured")];
    }
    if !token.starts_with(BOT_TOKEN_PREFIX) {
        tracing::error!(
            expected_prefix = BOT_TOKEN_PREFIX,
            "Slack bot token has an unexpected format; no notifications sent"
        );
        return vec![NotificationResult::batch_failure(format!(
            "bot token must start with '{BOT_TOKEN_PREFIX}'"
        ))];
    }

    let mut results = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        match messaging.post_message(&token, recipient, message).await {
            Ok(()) => {
                tracing::debug!(recipient = %recipient, "notification sent");
                results.push(NotificationResult::sent(recipient));
            }
            Err(err) => {
                tracing::warn!(recipient = %recipient, error = %err, "notification failed");
                results.push(NotificationResult::failed(recipient, err.to_string()));
            }
        }
    }
    results
}
