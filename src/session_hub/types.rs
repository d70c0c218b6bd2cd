//! Session hub message types

use crate::challenge_filter::Activity;
use crate::consensus_tracker::WindowSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One inbound unit, already classified by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Text(String),
    Binary(Vec<u8>),
}

/// Which endpoint opened the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Frames + commands (`/ws/video`)
    Video,
    /// Text chat only (`/ws/text`)
    Chat,
}

/// Control command sent as `{"command": ...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    TestMode(bool),
    Status,
    Reset,
    Unknown(String),
}

/// Parsed text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Command(Command),
    /// `{"message": ...}`
    Chat(String),
    /// Not JSON, or JSON without `command` / `message`
    Unrecognized(String),
}

impl ClientMessage {
    pub fn parse(text: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(_) => return ClientMessage::Unrecognized(text.to_string()),
        };
        let Some(obj) = value.as_object() else {
            return ClientMessage::Unrecognized(text.to_string());
        };

        if let Some(command) = obj.get("command") {
            let command = match command.as_str() {
                Some("ping") => Command::Ping,
                Some("test_mode") => Command::TestMode(
                    obj.get("enabled").and_then(|v| v.as_bool()).unwrap_or(true),
                ),
                Some("status") => Command::Status,
                Some("reset") => Command::Reset,
                Some(other) => Command::Unknown(other.to_string()),
                None => Command::Unknown(command.to_string()),
            };
            return ClientMessage::Command(command);
        }

        if let Some(message) = obj.get("message") {
            let message = match message.as_str() {
                Some(s) => s.to_string(),
                None => message.to_string(),
            };
            return ClientMessage::Chat(message);
        }

        ClientMessage::Unrecognized(text.to_string())
    }
}

/// Reply to a chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub server_response: String,
    pub original: String,
}

impl ChatReply {
    pub fn new(original: String) -> Self {
        Self {
            server_response: format!("Server received: {}", original),
            original,
        }
    }
}

/// Server-initiated notices fanned out to sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum HubNotice {
    ServerNotice(ServerNoticeMessage),
}

/// Free-form operator notice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerNoticeMessage {
    pub message: String,
    pub timestamp: String,
}

impl ServerNoticeMessage {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Live session summary
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub client_id: Option<String>,
    pub kind: SessionKind,
    pub connected_at: DateTime<Utc>,
    pub test_mode: bool,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub queued_frames: usize,
    pub windows: HashMap<Activity, WindowSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ClientMessage::parse(r#"{"command": "ping"}"#),
            ClientMessage::Command(Command::Ping)
        );
        assert_eq!(
            ClientMessage::parse(r#"{"command": "test_mode", "enabled": false}"#),
            ClientMessage::Command(Command::TestMode(false))
        );
        assert_eq!(
            ClientMessage::parse(r#"{"command": "dance"}"#),
            ClientMessage::Command(Command::Unknown("dance".to_string()))
        );
        assert_eq!(
            ClientMessage::parse(r#"{"command": 7}"#),
            ClientMessage::Command(Command::Unknown("7".to_string()))
        );
    }

    #[test]
    fn test_parse_chat_and_garbage() {
        assert_eq!(
            ClientMessage::parse(r#"{"message": "hello"}"#),
            ClientMessage::Chat("hello".to_string())
        );
        assert_eq!(
            ClientMessage::parse("{not json"),
            ClientMessage::Unrecognized("{not json".to_string())
        );
        assert_eq!(
            ClientMessage::parse(r#"{"foo": 1}"#),
            ClientMessage::Unrecognized(r#"{"foo": 1}"#.to_string())
        );
        assert_eq!(
            ClientMessage::parse("[1,2]"),
            ClientMessage::Unrecognized("[1,2]".to_string())
        );
    }

    #[test]
    fn test_chat_reply() {
        let reply = ChatReply::new("hi".to_string());
        assert_eq!(reply.server_response, "Server received: hi");
        assert_eq!(reply.original, "hi");
    }

    #[test]
    fn test_notice_wire_format() {
        let notice = HubNotice::ServerNotice(ServerNoticeMessage::now("maintenance"));
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["type"], "server_notice");
        assert_eq!(json["data"]["message"], "maintenance");
    }
}
