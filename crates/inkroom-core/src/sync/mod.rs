//! Room synchronization over a message channel.
//!
//! Local edits are broadcast as JSON text frames and inbound frames are
//! decoded into [`RemoteEdit`]s for the session to apply.

mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod native;
mod protocol;
mod record;

pub use memory::MemoryChannel;
#[cfg(not(target_arch = "wasm32"))]
pub use native::{ConnectionState, WebSocketChannel};
pub use protocol::{EraseData, WireMessage, decode_payload};
pub use record::{ShapeEnvelope, ShapeRecord, TRANSPARENT, WireId, WireKind, WirePoint};

use crate::shapes::{Shape, ShapeId, UserId};
use thiserror::Error;

/// Errors raised while encoding, decoding or transmitting sync frames.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for field: {0}")]
    InvalidField(&'static str),

    #[error("Channel is closed")]
    Closed,

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Connection failed: {0}")]
    Connect(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Bidirectional text-frame transport to the room relay.
pub trait Channel {
    /// Whether frames can be sent right now.
    fn is_open(&self) -> bool;

    /// Queue one text frame for delivery.
    fn send(&mut self, frame: &str) -> SyncResult<()>;

    /// Take every inbound frame received since the last poll.
    fn poll(&mut self) -> Vec<String>;

    /// Close the transport. Further sends fail.
    fn close(&mut self);
}

/// An edit received from another participant.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEdit {
    Draw {
        record: ShapeRecord,
        author: Option<UserId>,
    },
    Erase(ShapeId),
    Clear,
    /// Selection notice from a peer; carries nothing the canvas uses.
    Select,
}

/// Encodes local edits for a room and decodes what peers send back.
pub struct SyncAdapter {
    room_id: String,
    channel: Box<dyn Channel>,
}

impl SyncAdapter {
    pub fn new(room_id: impl Into<String>, channel: Box<dyn Channel>) -> Self {
        Self {
            room_id: room_id.into(),
            channel,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Announce this participant to the room.
    pub fn join(&mut self) {
        log::info!("Joining room {}", self.room_id);
        self.emit(&WireMessage::JoinRoom {
            room_id: self.room_id.clone(),
        });
    }

    /// Say goodbye if the channel is still open, then close it.
    pub fn leave(&mut self) {
        if self.channel.is_open() {
            log::info!("Leaving room {}", self.room_id);
            self.emit(&WireMessage::LeaveRoom {
                room_id: Some(self.room_id.clone()),
            });
        }
        self.channel.close();
    }

    pub fn broadcast_draw(&mut self, shape: &Shape) {
        let envelope = ShapeEnvelope {
            shape: ShapeRecord::from_shape(shape),
        };
        match protocol::encode_payload(&envelope) {
            Ok(data) => self.emit(&WireMessage::Draw {
                data,
                room_id: Some(self.room_id.clone()),
                user_id: Some(shape.author.to_string()),
            }),
            Err(e) => log::error!("Failed to encode shape {}: {}", shape.id(), e),
        }
    }

    pub fn broadcast_erase(&mut self, id: &ShapeId) {
        let payload = EraseData {
            shape_id: WireId::from(id),
        };
        match protocol::encode_payload(&payload) {
            Ok(data) => self.emit(&WireMessage::Erase {
                data,
                room_id: Some(self.room_id.clone()),
            }),
            Err(e) => log::error!("Failed to encode erase of {}: {}", id, e),
        }
    }

    pub fn broadcast_clear(&mut self) {
        self.emit(&WireMessage::Clear {
            room_id: Some(self.room_id.clone()),
        });
    }

    /// Inbound frames waiting on the channel.
    pub fn poll(&mut self) -> Vec<String> {
        self.channel.poll()
    }

    /// Decode one inbound frame. Frames that carry no edit yield `None`.
    pub fn decode(frame: &str) -> SyncResult<Option<RemoteEdit>> {
        let message: WireMessage = serde_json::from_str(frame)?;
        let edit = match message {
            WireMessage::Draw { data, user_id, .. } => {
                let envelope: ShapeEnvelope = decode_payload(&data)?;
                // Relays that do not stamp the sender leave the record's author.
                let author = user_id
                    .or_else(|| envelope.shape.user_id.clone())
                    .map(UserId::new);
                Some(RemoteEdit::Draw {
                    record: envelope.shape,
                    author,
                })
            }
            WireMessage::Erase { data, .. } => {
                let erase: EraseData = decode_payload(&data)?;
                Some(RemoteEdit::Erase(erase.shape_id.to_shape_id()))
            }
            WireMessage::Clear { .. } => Some(RemoteEdit::Clear),
            WireMessage::Select { .. } => Some(RemoteEdit::Select),
            WireMessage::JoinRoom { .. } | WireMessage::LeaveRoom { .. } | WireMessage::Unknown => {
                log::debug!("Ignoring frame without canvas edit");
                None
            }
        };
        Ok(edit)
    }

    fn emit(&mut self, message: &WireMessage) {
        if !self.channel.is_open() {
            log::debug!("Channel closed, dropping outbound {:?}", message.kind());
            return;
        }
        let frame = match serde_json::to_string(message) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Failed to encode {:?} message: {}", message.kind(), e);
                return;
            }
        };
        if let Err(e) = self.channel.send(&frame) {
            log::warn!("Failed to send {:?} message: {}", message.kind(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Geometry, Rectangle, ShapeStyle};
    use kurbo::Point;
    use serde_json::Value;

    fn adapter() -> (SyncAdapter, MemoryChannel) {
        let channel = MemoryChannel::open();
        (SyncAdapter::new("room-1", Box::new(channel.clone())), channel)
    }

    #[test]
    fn test_join_and_leave_frames() {
        let (mut sync, channel) = adapter();
        sync.join();
        sync.leave();

        let sent: Vec<Value> = channel
            .sent()
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect();
        assert_eq!(sent[0]["type"], "join_room");
        assert_eq!(sent[0]["roomId"], "room-1");
        assert_eq!(sent[1]["type"], "leave_room");
        assert!(channel.is_closed());
    }

    #[test]
    fn test_leave_on_closed_channel_sends_nothing() {
        let channel = MemoryChannel::new();
        let mut sync = SyncAdapter::new("room-1", Box::new(channel.clone()));
        sync.leave();
        assert!(channel.sent().is_empty());
        assert!(channel.is_closed());
    }

    #[test]
    fn test_draw_payload_is_encoded_string() {
        let (mut sync, channel) = adapter();
        let shape = Shape::new(
            ShapeId::new("rect-1"),
            Geometry::Rectangle(Rectangle::new(Point::new(1.0, 2.0), 3.0, 4.0)),
            ShapeStyle::default(),
            UserId::new("alice"),
        );
        sync.broadcast_draw(&shape);

        let frame: Value = serde_json::from_str(&channel.sent()[0]).unwrap();
        assert_eq!(frame["type"], "draw");
        assert_eq!(frame["roomId"], "room-1");
        assert_eq!(frame["userId"], "alice");
        let inner: Value = serde_json::from_str(frame["data"].as_str().unwrap()).unwrap();
        assert_eq!(inner["shape"]["id"], "rect-1");
        assert_eq!(inner["shape"]["type"], "rectangle");
    }

    #[test]
    fn test_erase_and_clear_frames() {
        let (mut sync, channel) = adapter();
        sync.broadcast_erase(&ShapeId::new("line-7"));
        sync.broadcast_clear();

        let sent = channel.sent();
        let erase: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(erase["type"], "erase");
        let inner: Value = serde_json::from_str(erase["data"].as_str().unwrap()).unwrap();
        assert_eq!(inner["shapeId"], "line-7");

        let clear: Value = serde_json::from_str(&sent[1]).unwrap();
        assert_eq!(clear["type"], "clear");
        assert_eq!(clear["roomId"], "room-1");
    }

    #[test]
    fn test_decode_draw_string_and_object_payloads() {
        let as_string = r#"{"type":"draw","userId":"bob","data":"{\"shape\":{\"type\":\"line\",\"x\":0,\"y\":0,\"width\":10,\"height\":0}}"}"#;
        match SyncAdapter::decode(as_string).unwrap() {
            Some(RemoteEdit::Draw { record, author }) => {
                assert_eq!(record.kind, WireKind::Line);
                assert_eq!(author, Some(UserId::new("bob")));
            }
            other => panic!("unexpected {other:?}"),
        }

        let as_object = r#"{"type":"draw","data":{"shape":{"type":"ellipse","x":5,"y":5,"width":2,"height":3}}}"#;
        match SyncAdapter::decode(as_object).unwrap() {
            Some(RemoteEdit::Draw { record, author }) => {
                assert_eq!(record.kind, WireKind::Ellipse);
                assert!(author.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_draw_falls_back_to_record_author() {
        let unstamped = r#"{"type":"draw","data":{"shape":{"type":"rectangle","x":0,"y":0,"width":4,"height":4,"userId":"carol"}}}"#;
        match SyncAdapter::decode(unstamped).unwrap() {
            Some(RemoteEdit::Draw { author, .. }) => {
                assert_eq!(author, Some(UserId::new("carol")));
            }
            other => panic!("unexpected {other:?}"),
        }

        let stamped = r#"{"type":"draw","userId":"bob","data":{"shape":{"type":"rectangle","x":0,"y":0,"width":4,"height":4,"userId":"carol"}}}"#;
        match SyncAdapter::decode(stamped).unwrap() {
            Some(RemoteEdit::Draw { author, .. }) => {
                assert_eq!(author, Some(UserId::new("bob")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_erase_clear_and_ignored() {
        let erase = r#"{"type":"erase","data":"{\"shapeId\":\"rect-9\"}"}"#;
        assert_eq!(
            SyncAdapter::decode(erase).unwrap(),
            Some(RemoteEdit::Erase(ShapeId::new("rect-9")))
        );
        assert_eq!(
            SyncAdapter::decode(r#"{"type":"clear","roomId":"r"}"#).unwrap(),
            Some(RemoteEdit::Clear)
        );
        assert_eq!(
            SyncAdapter::decode(r#"{"type":"select","data":"{}"}"#).unwrap(),
            Some(RemoteEdit::Select)
        );
        assert_eq!(SyncAdapter::decode(r#"{"type":"chat","message":"hi"}"#).unwrap(), None);
        assert_eq!(SyncAdapter::decode(r#"{"type":"join_room","roomId":"r"}"#).unwrap(), None);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(SyncAdapter::decode("not json").is_err());
        assert!(SyncAdapter::decode(r#"{"type":"draw","data":"{oops"}"#).is_err());
        assert!(SyncAdapter::decode(r#"{"type":"draw"}"#).is_err());
        assert!(SyncAdapter::decode(r#"{"type":"erase","data":"{}"}"#).is_err());
    }

    #[test]
    fn test_emit_on_closed_channel_is_dropped() {
        let channel = MemoryChannel::new();
        let mut sync = SyncAdapter::new("room-1", Box::new(channel.clone()));
        sync.broadcast_clear();
        assert!(channel.sent().is_empty());
    }
}
