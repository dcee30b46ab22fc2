use async_trait::async_trait;

use crate::domain::settings::NotificationSettings;
use crate::domain::user::{Employee, User};
use crate::error::AppResult;

/// Read-only view of the documents the notifier depends on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// First user whose email matches, ignoring case.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// `None` when the settings document does not exist.
    async fn notification_settings(&self) -> AppResult<Option<NotificationSettings>>;
    async fn employee(&self, id: &str) -> AppResult<Option<Employee>>;
}
