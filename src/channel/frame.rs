//! Wire frames exchanged between the page and the panel
//!
//! On the wire every frame is a JSON array `[type, payload]`. The payload is
//! itself a JSON document serialized to a string, or absent.

use crate::error::{SyncError, SyncResult};
use crate::model::{CursorId, Opacity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PING: &str = "ping";
pub const PONG: &str = "pong";
pub const CHANGE_CURSOR_DISPLAY: &str = "change_cursor_display";
pub const CHANGE_NAME_DISPLAY: &str = "change_name_display";
pub const CHANGE_CURSOR_OPACITY: &str = "change_cursor_opacity";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: String,
    pub payload: Option<String>,
}

impl Frame {
    pub fn new(kind: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    pub fn encode(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(&(&self.kind, &self.payload))?)
    }

    /// Decode `[type, payload]`. A one-element array or a bare type string
    /// is accepted as a frame without payload.
    pub fn decode(text: &str) -> SyncResult<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::String(kind) => Ok(Self::new(kind, None)),
            Value::Array(items) => {
                let mut items = items.into_iter();
                let kind = match items.next() {
                    Some(Value::String(kind)) => kind,
                    _ => {
                        return Err(SyncError::MalformedFrame(
                            "frame type must be a string".to_string(),
                        ))
                    }
                };
                let payload = match items.next() {
                    None | Some(Value::Null) => None,
                    Some(Value::String(payload)) => Some(payload),
                    Some(other) => {
                        return Err(SyncError::MalformedFrame(format!(
                            "payload must be a string, got {}",
                            other
                        )))
                    }
                };
                if items.next().is_some() {
                    return Err(SyncError::MalformedFrame(
                        "frame has more than two elements".to_string(),
                    ));
                }
                Ok(Self::new(kind, payload))
            }
            other => Err(SyncError::MalformedFrame(format!("unexpected frame {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayChange {
    pub id: CursorId,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpacityChange {
    pub id: CursorId,
    pub value: Opacity,
}

/// Payloads that may carry one change or a batch of them
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// Typed view of a [`Frame`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Ping,
    Pong,
    ChangeCursorDisplay(Vec<DisplayChange>),
    ChangeNameDisplay(DisplayChange),
    ChangeCursorOpacity(Vec<OpacityChange>),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Ping => PING,
            Message::Pong => PONG,
            Message::ChangeCursorDisplay(_) => CHANGE_CURSOR_DISPLAY,
            Message::ChangeNameDisplay(_) => CHANGE_NAME_DISPLAY,
            Message::ChangeCursorOpacity(_) => CHANGE_CURSOR_OPACITY,
        }
    }

    pub fn to_frame(&self) -> SyncResult<Frame> {
        let payload = match self {
            Message::Ping | Message::Pong => None,
            Message::ChangeCursorDisplay(changes) => Some(batch_payload(changes)?),
            Message::ChangeNameDisplay(change) => Some(serde_json::to_string(change)?),
            Message::ChangeCursorOpacity(changes) => Some(batch_payload(changes)?),
        };
        Ok(Frame::new(self.kind(), payload))
    }
}

impl TryFrom<Frame> for Message {
    type Error = SyncError;

    fn try_from(frame: Frame) -> SyncResult<Self> {
        match frame.kind.as_str() {
            PING => Ok(Message::Ping),
            PONG => Ok(Message::Pong),
            CHANGE_CURSOR_DISPLAY => Ok(Message::ChangeCursorDisplay(
                payload::<OneOrMany<DisplayChange>>(&frame)?.into(),
            )),
            CHANGE_NAME_DISPLAY => Ok(Message::ChangeNameDisplay(payload(&frame)?)),
            CHANGE_CURSOR_OPACITY => Ok(Message::ChangeCursorOpacity(
                payload::<OneOrMany<OpacityChange>>(&frame)?.into(),
            )),
            other => Err(SyncError::UnknownFrame(other.to_string())),
        }
    }
}

// A single change is sent bare, several as an array
fn batch_payload<T: Serialize>(changes: &[T]) -> SyncResult<String> {
    match changes {
        [single] => Ok(serde_json::to_string(single)?),
        many => Ok(serde_json::to_string(many)?),
    }
}

fn payload<T: DeserializeOwned>(frame: &Frame) -> SyncResult<T> {
    let text = frame
        .payload
        .as_deref()
        .ok_or_else(|| SyncError::MalformedFrame(format!("{} requires a payload", frame.kind)))?;
    Ok(serde_json::from_str(text)?)
}
