use serde::Deserialize;

use crate::domain::ticket::lenient_string;

pub const EMPLOYEE_ROLE: &str = "employee";
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub role: Option<String>,
}

/// Related employee record, used only to enrich the requester shown in a
/// notification.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Employee {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
}

/// Role of a ticket creator. `None` means the role could not be resolved.
pub fn resolve_role(user: Option<&User>, email: &str, admin_email: &str) -> Option<String> {
    match user {
        Some(user) => user.role.clone(),
        None if email.trim().eq_ignore_ascii_case(admin_email.trim()) => {
            Some(ADMIN_ROLE.to_string())
        }
        None => None,
    }
}
