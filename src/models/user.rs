//! Forum user row.

use serde::{Deserialize, Serialize};

/// A persisted user row. The API key never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub admin: bool,
    pub moderator: bool,
    #[serde(skip_serializing)]
    pub api_key: String,
}

impl User {
    pub fn is_staff(&self) -> bool {
        self.admin || self.moderator
    }
}
