//! Wire protocol between clients and the store daemon.
//!
//! JSON newline-delimited over a unix socket. Request/response for
//! `fetch`, `insert`, `update`, `status`, `stop`; a `subscribe` request
//! turns the connection into a one-way stream of [`StoreEvent`] lines.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use gamectl_core::{GameState, RecordId, WriteSet};

/// JSON newline-delimited request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRequest {
    pub cmd: String,
    /// Target row for `update`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Partial record for `update`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<WriteSet>,
}

impl StoreRequest {
    pub fn bare(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_string(),
            id: None,
            set: None,
        }
    }

    pub fn update(id: RecordId, set: WriteSet) -> Self {
        Self {
            cmd: "update".to_string(),
            id: Some(id),
            set: Some(set),
        }
    }
}

/// JSON newline-delimited response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Success with no row — the singleton table is empty.
    pub fn empty() -> Self {
        Self {
            ok: true,
            data: Some(Value::Null),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// One line of a subscription stream: the post-update row image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    pub event: String,
    pub record: GameState,
}

impl StoreEvent {
    pub fn update(record: GameState) -> Self {
        Self {
            event: "update".to_string(),
            record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamectl_core::Flag;

    #[test]
    fn update_request_carries_only_touched_fields() {
        let mut set = WriteSet::default();
        set.set(Flag::GameStarted, false);
        set.set(Flag::Checkpoint1, false);

        let line = serde_json::to_string(&StoreRequest::update(RecordId(4), set))
            .expect("serialize");
        assert!(line.contains(r#""cmd":"update""#));
        assert!(line.contains(r#""id":4"#));
        assert!(line.contains(r#""game_has_started":false"#));
        assert!(!line.contains("checkpoint2"), "untouched field leaked: {line}");
    }

    #[test]
    fn empty_response_distinguishes_no_row_from_error() {
        let empty = StoreResponse::empty();
        assert!(empty.ok);
        assert_eq!(empty.data, Some(Value::Null));

        let failed = StoreResponse::error("disk on fire");
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("disk on fire"));
    }
}
