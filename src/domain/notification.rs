/// Outcome of posting one message. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResult {
    pub success: bool,
    /// Empty for a batch-level failure that never reached any recipient.
    pub recipient: String,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn sent(recipient: &str) -> Self {
        Self {
            success: true,
            recipient: recipient.to_string(),
            error: None,
        }
    }

    pub fn failed(recipient: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            recipient: recipient.to_string(),
            error: Some(error.into()),
        }
    }

    pub fn batch_failure(error: impl Into<String>) -> Self {
        Self::failed("", error)
    }
}

/// `recipient: error` for every failed result, for the operator-facing log.
pub fn failure_summary(results: &[NotificationResult]) -> Vec<String> {
    results
        .iter()
        .filter(|result| !result.success)
        .map(|result| {
            let recipient = if result.recipient.is_empty() {
                "<all>"
            } else {
                result.recipient.as_str()
            };
            format!(
                "{recipient}: {}",
                result.error.as_deref().unwrap_or("unknown error")
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_failures_only() {
        let results = vec![
            NotificationResult::failed("U01", "channel_not_found"),
            NotificationResult::sent("U02"),
            NotificationResult::batch_failure("bot token not configured"),
        ];
        assert_eq!(
            failure_summary(&results),
            vec![
                "U01: channel_not_found".to_string(),
                "<all>: bot token not configured".to_string(),
            ]
        );
        assert!(failure_summary(&[NotificationResult::sent("U02")]).is_empty());
    }
}
