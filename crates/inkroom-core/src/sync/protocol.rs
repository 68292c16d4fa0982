//! Relay message envelopes.

use super::{SyncResult, WireId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames exchanged with the room relay.
///
/// `data` payloads are sent as JSON-encoded strings; on receipt both a string
/// and an inline object are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WireMessage {
    JoinRoom {
        room_id: String,
    },
    LeaveRoom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },
    Draw {
        data: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    Erase {
        data: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },
    Clear {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },
    Select {
        #[serde(default)]
        data: Value,
    },
    /// Any frame type the canvas does not act on.
    #[serde(other)]
    Unknown,
}

impl WireMessage {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::JoinRoom { .. } => "join_room",
            WireMessage::LeaveRoom { .. } => "leave_room",
            WireMessage::Draw { .. } => "draw",
            WireMessage::Erase { .. } => "erase",
            WireMessage::Clear { .. } => "clear",
            WireMessage::Select { .. } => "select",
            WireMessage::Unknown => "unknown",
        }
    }
}

/// Payload of an erase frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EraseData {
    pub shape_id: WireId,
}

/// Serialize `payload` into the string form carried in `data`.
pub(crate) fn encode_payload<T: Serialize>(payload: &T) -> SyncResult<Value> {
    Ok(Value::String(serde_json::to_string(payload)?))
}

/// Read a `data` payload that is either a JSON string or an inline object.
pub fn decode_payload<T: DeserializeOwned>(data: &Value) -> SyncResult<T> {
    match data {
        Value::String(text) => Ok(serde_json::from_str(text)?),
        other => Ok(T::deserialize(other)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_room_shape() {
        let frame = serde_json::to_value(WireMessage::JoinRoom {
            room_id: "abc".into(),
        })
        .unwrap();
        assert_eq!(frame, serde_json::json!({"type": "join_room", "roomId": "abc"}));
    }

    #[test]
    fn test_unknown_type_tolerated() {
        let msg: WireMessage = serde_json::from_str(r#"{"type":"cursor","x":1}"#).unwrap();
        assert_eq!(msg, WireMessage::Unknown);
    }

    #[test]
    fn test_decode_payload_forms() {
        let from_string: EraseData =
            decode_payload(&Value::String(r#"{"shapeId":7}"#.into())).unwrap();
        assert_eq!(from_string.shape_id.to_shape_id().as_str(), "7");

        let from_object: EraseData =
            decode_payload(&serde_json::json!({"shapeId": "a"})).unwrap();
        assert_eq!(from_object.shape_id.to_shape_id().as_str(), "a");
    }
}
