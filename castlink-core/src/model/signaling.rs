use crate::model::role::Role;
use crate::model::room_code::RoomCode;
use crate::model::path::SignalPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Negotiation payload owned by the peer-connection engine.
///
/// Stored as `{"type": "offer" | "answer", "sdp": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }

    /// Reads a description out of a store slot. `None` if the slot holds
    /// something other than a description of the expected kind.
    pub fn from_slot(value: Value, kind: SdpKind) -> Option<Self> {
        serde_json::from_value::<Self>(value)
            .ok()
            .filter(|desc| desc.kind == kind)
    }
}

/// Opaque reachability candidate, kept as the JSON the engine produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IceCandidate(Value);

impl IceCandidate {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Everything a session writes to the shared store.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalMessage {
    Offer(SessionDescription),
    Answer(SessionDescription),
    IceCandidate {
        from: Role,
        seq: u64,
        candidate: IceCandidate,
    },
}

impl SignalMessage {
    pub fn path(&self, code: &RoomCode) -> SignalPath {
        match self {
            SignalMessage::Offer(_) => SignalPath::Offer(code.clone()),
            SignalMessage::Answer(_) => SignalPath::Answer(code.clone()),
            SignalMessage::IceCandidate { from, seq, .. } => {
                SignalPath::MailboxEntry(code.clone(), *from, *seq)
            }
        }
    }

    pub fn into_value(self) -> Result<Value, serde_json::Error> {
        match self {
            SignalMessage::Offer(desc) | SignalMessage::Answer(desc) => serde_json::to_value(desc),
            SignalMessage::IceCandidate { candidate, .. } => Ok(candidate.into_value()),
        }
    }
}
