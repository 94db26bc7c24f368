//! Realtime protocol message types
//!
//! Supabase Realtime speaks Phoenix channels (serializer vsn 1.0.0): every
//! frame is a JSON object with `topic`, `event`, `payload` and `ref`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::{ChangeFilter, ChangeNotification};

/// Topic used for socket-level heartbeats
pub const PHOENIX_TOPIC: &str = "phoenix";

/// Channel events
pub const PHX_JOIN: &str = "phx_join";
pub const PHX_LEAVE: &str = "phx_leave";
pub const PHX_REPLY: &str = "phx_reply";
pub const PHX_ERROR: &str = "phx_error";
pub const PHX_CLOSE: &str = "phx_close";
pub const HEARTBEAT: &str = "heartbeat";
pub const POSTGRES_CHANGES: &str = "postgres_changes";
pub const SYSTEM: &str = "system";

/// A single Phoenix frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

/// `postgres_changes` payload body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PostgresChange {
    #[serde(rename = "type", default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
}

impl PhoenixMessage {
    /// Join a channel listening for `postgres_changes` on the filter
    pub fn join(filter: &ChangeFilter, access_token: &str, msg_ref: &str) -> Self {
        Self {
            topic: filter.topic(),
            event: PHX_JOIN.to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "ack": false, "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [{
                        "event": filter.event.as_str(),
                        "schema": filter.schema,
                        "table": filter.table,
                    }],
                    "private": false,
                },
                "access_token": access_token,
            }),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: Some(msg_ref.to_string()),
        }
    }

    /// Leave a channel
    pub fn leave(topic: &str, msg_ref: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: PHX_LEAVE.to_string(),
            payload: json!({}),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: None,
        }
    }

    /// Socket heartbeat
    pub fn heartbeat(msg_ref: &str) -> Self {
        Self {
            topic: PHOENIX_TOPIC.to_string(),
            event: HEARTBEAT.to_string(),
            payload: json!({}),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: None,
        }
    }

    /// Encode to a text frame
    pub fn encode(&self) -> String {
        // Serializing a struct of strings and a Value cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode from a text frame
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Reply status (`ok` / `error`) for `phx_reply` frames
    pub fn reply_status(&self) -> Option<&str> {
        if self.event != PHX_REPLY {
            return None;
        }
        self.payload.get("status").and_then(Value::as_str)
    }

    /// Human-readable reason carried by an error reply or system frame
    pub fn reason(&self) -> Option<String> {
        let response = self.payload.get("response").unwrap_or(&self.payload);
        response
            .get("reason")
            .or_else(|| response.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Change notification carried by a `postgres_changes` frame
    pub fn as_change(&self) -> Option<ChangeNotification> {
        if self.event != POSTGRES_CHANGES {
            return None;
        }

        let change: PostgresChange = self
            .payload
            .get("data")
            .cloned()
            .and_then(|data| serde_json::from_value(data).ok())
            .unwrap_or_default();

        Some(ChangeNotification {
            kind: change.change_type,
            table: change.table,
        })
    }
}
