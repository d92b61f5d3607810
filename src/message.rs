use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sender type the chat service uses for bot-authored messages.
pub const BOT_SENDER_TYPE: &str = "bot";

/// A chat event delivered to the webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundMessage {
    pub avatar_url: String,
    pub id: String,
    pub name: String,
    pub sender_id: String,
    pub sender_type: String,
    pub system: bool,
    pub text: String,
    pub user_id: String,
}

impl InboundMessage {
    /// Decode a webhook body. Undecodable input comes back marked as
    /// bot-authored so it is dropped before logging and dispatch.
    pub fn decode(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Couldn't parse the request body: {}", e);
                Self::undecodable()
            }
        }
    }

    /// Placeholder for a body that could not be read or parsed.
    pub fn undecodable() -> Self {
        Self {
            sender_type: BOT_SENDER_TYPE.to_string(),
            ..Self::default()
        }
    }

    pub fn is_from_bot(&self) -> bool {
        self.sender_type == BOT_SENDER_TYPE
    }
}

/// Payload posted to the chat service.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub bot_id: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_partial_payload() {
        let msg = InboundMessage::decode(
            br#"{"text":"hello world","sender_type":"user","sender_id":"U1","name":"Alice"}"#,
        );
        assert_eq!(msg.text, "hello world");
        assert_eq!(msg.sender_id, "U1");
        assert_eq!(msg.name, "Alice");
        assert_eq!(msg.avatar_url, "");
        assert!(!msg.system);
        assert!(!msg.is_from_bot());
    }

    #[test]
    fn test_decode_full_payload() {
        let msg = InboundMessage::decode(
            br#"{"avatar_url":"https://i.example/a.png","id":"M9","name":"Bob",
                "sender_id":"S2","sender_type":"user","system":true,
                "text":"hey","user_id":"S2"}"#,
        );
        assert_eq!(msg.id, "M9");
        assert_eq!(msg.avatar_url, "https://i.example/a.png");
        assert!(msg.system);
        assert_eq!(msg.user_id, "S2");
    }

    #[test]
    fn test_malformed_body_marked_as_bot() {
        let msg = InboundMessage::decode(b"{not json");
        assert!(msg.is_from_bot());
        assert_eq!(msg.text, "");
    }

    #[test]
    fn test_wrong_field_type_marked_as_bot() {
        let msg = InboundMessage::decode(br#"{"text":"hi","system":"yes"}"#);
        assert!(msg.is_from_bot());
    }

    #[test]
    fn test_bot_sender_detected() {
        let msg = InboundMessage::decode(br#"{"text":"hi","sender_type":"bot"}"#);
        assert!(msg.is_from_bot());
    }

    #[test]
    fn test_outbound_wire_format() {
        let out = OutboundMessage {
            bot_id: "B1".to_string(),
            text: "hi there".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"bot_id":"B1","text":"hi there"}"#
        );
    }
}
