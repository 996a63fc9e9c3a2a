//! Per-user draft rows, passed through to the UI shell alongside the
//! category list. This service reads drafts but never composes them.

/// Draft key for the shared "start a new topic" composer.
pub const NEW_TOPIC_DRAFT_KEY: &str = "new_topic";

/// A user's draft for one composer key.
#[derive(Debug, Clone)]
pub struct Draft {
    pub draft_key: String,
    pub sequence: i64,
    pub data: String,
}
