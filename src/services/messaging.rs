use async_trait::async_trait;

use crate::domain::message::NotificationMessage;
use crate::error::AppResult;

pub const BOT_TOKEN_PREFIX: &str = "xoxb-";

#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Posts `message` to a single user or channel.
    async fn post_message(
        &self,
        token: &str,
        recipient: &str,
        message: &NotificationMessage,
    ) -> AppResult<()>;
}
