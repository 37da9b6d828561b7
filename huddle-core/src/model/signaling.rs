use crate::error::SignalError;
use crate::model::connection::ConnectionId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// Offer or answer payload, shaped like the browser's `RTCSessionDescriptionInit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    Offer {
        offer: SessionDescription,
        to: ConnectionId,
        #[serde(default, skip_serializing_if = "is_false")]
        restart: bool,
    },
    Answer {
        answer: SessionDescription,
        to: ConnectionId,
    },
    IceCandidate {
        candidate: IceCandidate,
        to: ConnectionId,
    },
}

/// Messages the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Welcome {
        connection_id: ConnectionId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    RoomUsers {
        users: Vec<ConnectionId>,
    },
    UserJoined {
        user_id: ConnectionId,
    },
    UserLeft {
        user_id: ConnectionId,
    },
    Offer {
        offer: SessionDescription,
        from: ConnectionId,
        #[serde(default, skip_serializing_if = "is_false")]
        restart: bool,
    },
    Answer {
        answer: SessionDescription,
        from: ConnectionId,
    },
    IceCandidate {
        candidate: IceCandidate,
        from: ConnectionId,
    },
}

impl ClientMessage {
    /// Parses and validates one text frame.
    pub fn decode(text: &str) -> Result<Self, SignalError> {
        let msg: Self = serde_json::from_str(text)?;
        msg.validate()?;
        Ok(msg)
    }

    pub fn encode(&self) -> Result<String, SignalError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        match self {
            Self::JoinRoom { room_id } | Self::LeaveRoom { room_id } if !room_id.is_valid() => {
                Err(SignalError::Invalid("room id must not be empty"))
            }
            Self::Offer { offer, .. } if offer.kind != SdpType::Offer => {
                Err(SignalError::Invalid("offer must carry an offer description"))
            }
            Self::Answer { answer, .. } if answer.kind != SdpType::Answer => {
                Err(SignalError::Invalid("answer must carry an answer description"))
            }
            _ => Ok(()),
        }
    }

    /// Target of a point-to-point message.
    pub fn target(&self) -> Option<ConnectionId> {
        match self {
            Self::Offer { to, .. } | Self::Answer { to, .. } | Self::IceCandidate { to, .. } => {
                Some(*to)
            }
            Self::JoinRoom { .. } | Self::LeaveRoom { .. } => None,
        }
    }

    /// Re-addresses a point-to-point message as seen by its target.
    pub fn into_relayed(self, from: ConnectionId) -> Option<ServerMessage> {
        match self {
            Self::Offer { offer, restart, .. } => Some(ServerMessage::Offer {
                offer,
                from,
                restart,
            }),
            Self::Answer { answer, .. } => Some(ServerMessage::Answer { answer, from }),
            Self::IceCandidate { candidate, .. } => {
                Some(ServerMessage::IceCandidate { candidate, from })
            }
            Self::JoinRoom { .. } | Self::LeaveRoom { .. } => None,
        }
    }
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<Self, SignalError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, SignalError> {
        Ok(serde_json::to_string(self)?)
    }
}
