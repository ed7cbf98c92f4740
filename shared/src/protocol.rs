//! JSON message envelopes exchanged between server and clients.
//!
//! Every message is an object `{ "type": ..., "payload": ... }`. Decoding goes
//! through a loose [`Envelope`] first so that an unrecognised `type` can be
//! reported separately from a payload that does not parse.

use crate::{InputState, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Welcome {
    pub id: u32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "welcome")]
    Welcome(Welcome),
    #[serde(rename = "authoritative_state")]
    AuthoritativeState(Snapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "input")]
    Input(InputState),
    #[serde(rename = "toggleInvincible")]
    ToggleInvincible,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "requestRestart")]
    RequestRestart,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown message type `{0}`")]
    UnknownType(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl Envelope {
    fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::parse(text)?;
        match envelope.kind.as_str() {
            "welcome" => Ok(ServerMessage::Welcome(serde_json::from_value(
                envelope.payload,
            )?)),
            "authoritative_state" => Ok(ServerMessage::AuthoritativeState(
                serde_json::from_value(envelope.payload)?,
            )),
            _ => Err(ProtocolError::UnknownType(envelope.kind)),
        }
    }
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Signal messages ignore whatever payload they carry.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::parse(text)?;
        match envelope.kind.as_str() {
            "input" => Ok(ClientMessage::Input(serde_json::from_value(
                envelope.payload,
            )?)),
            "toggleInvincible" => Ok(ClientMessage::ToggleInvincible),
            "ready" => Ok(ClientMessage::Ready),
            "requestRestart" => Ok(ClientMessage::RequestRestart),
            _ => Err(ProtocolError::UnknownType(envelope.kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_envelope_shape() {
        let message = ServerMessage::Welcome(Welcome {
            id: 4,
            color: "#FF00FF".to_string(),
        });
        let value: Value = serde_json::from_str(&message.encode().unwrap()).unwrap();
        assert_eq!(value["type"], "welcome");
        assert_eq!(value["payload"]["id"], 4);
        assert_eq!(value["payload"]["color"], "#FF00FF");
    }

    #[test]
    fn test_decode_input() {
        let text = r#"{"type":"input","payload":{"left":true,"fire":true}}"#;
        match ClientMessage::decode(text).unwrap() {
            ClientMessage::Input(input) => {
                assert!(input.left);
                assert!(input.fire);
                assert!(!input.right);
                assert!(!input.up);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_signals_without_payload() {
        assert_eq!(
            ClientMessage::decode(r#"{"type":"ready"}"#).unwrap(),
            ClientMessage::Ready
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"toggleInvincible","payload":null}"#).unwrap(),
            ClientMessage::ToggleInvincible
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"requestRestart","payload":{}}"#).unwrap(),
            ClientMessage::RequestRestart
        );
    }

    #[test]
    fn test_encoded_signals_decode_back() {
        for message in [
            ClientMessage::Ready,
            ClientMessage::ToggleInvincible,
            ClientMessage::RequestRestart,
        ] {
            let text = message.encode().unwrap();
            assert_eq!(ClientMessage::decode(&text).unwrap(), message);
        }
    }

    #[test]
    fn test_unknown_type_is_distinguished() {
        match ClientMessage::decode(r#"{"type":"teleport","payload":{}}"#) {
            Err(ProtocolError::UnknownType(kind)) => assert_eq!(kind, "teleport"),
            other => panic!("Expected unknown type, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            ClientMessage::decode("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::decode(r#"{"payload":{}}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::decode(r#"{"type":"input","payload":{"left":"yes"}}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_snapshot_message_decodes() {
        let snapshot = Snapshot {
            wave: 3,
            ..Default::default()
        };
        let text = ServerMessage::AuthoritativeState(snapshot.clone())
            .encode()
            .unwrap();
        assert_eq!(
            ServerMessage::decode(&text).unwrap(),
            ServerMessage::AuthoritativeState(snapshot)
        );
    }
}
