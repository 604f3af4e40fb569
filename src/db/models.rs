use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Username → user record, as persisted in the store document.
pub type UserMap = BTreeMap<String, User>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// bcrypt digest, never the plaintext
    pub password: String,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
}

impl User {
    pub fn new(username: String, email: Option<String>, password_hash: String) -> Self {
        Self {
            username,
            email,
            password: password_hash,
            created_at: Utc::now().timestamp_millis(),
        }
    }
}
