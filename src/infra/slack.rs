use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::message::NotificationMessage;
use crate::error::{AppError, AppResult};
use crate::services::MessagingService;

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

pub struct SlackClient {
    http: Client,
    endpoint: String,
}

impl SlackClient {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            endpoint: POST_MESSAGE_URL.to_string(),
        })
    }

    fn auth_header(token: &str) -> String {
        format!("Bearer {token}")
    }

    fn check_response(status: StatusCode, body: &str) -> AppResult<()> {
        if !status.is_success() {
            return Err(AppError::Messaging(format!(
                "Slack responded with {status}: {body}"
            )));
        }

        let payload: SlackPostMessageResponse = serde_json::from_str(body).map_err(|err| {
            AppError::Messaging(format!("failed to parse Slack response: {err}"))
        })?;

        if payload.ok {
            Ok(())
        } else {
            Err(AppError::Messaging(
                payload.error.unwrap_or_else(|| "unknown".to_string()),
            ))
        }
    }
}

#[async_trait]
impl MessagingService for SlackClient {
    async fn post_message(
        &self,
        token: &str,
        recipient: &str,
        message: &NotificationMessage,
    ) -> AppResult<()> {
        let request_body = SlackPostMessageRequest {
            channel: recipient,
            text: &message.text,
            blocks: &message.blocks,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, Self::auth_header(token))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| AppError::Messaging(format!("failed to call Slack: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());

        Self::check_response(status, &body)
    }
}

#[derive(Serialize)]
struct SlackPostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    blocks: &'a [Value],
}

#[derive(Deserialize)]
struct SlackPostMessageResponse {
    #[serde(default)]
    ok: bool,
    error: Option<String>,
}
