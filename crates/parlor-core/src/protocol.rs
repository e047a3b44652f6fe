//! Protocol types for the Parlor coordination surface.
//!
//! `Notification` is what the coordinator pushes to a user's handle. The
//! wire envelopes (`ClientRequest`, `ServerMessage`) are JSON text frames
//! shared by `parlor-server` and `parlor-client`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// Whether a connected user is free to pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Available,
    Busy,
}

/// Snapshot of the lobby as seen by one requester (who is excluded).
/// Both lists are in join order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyView {
    pub available: Vec<String>,
    pub busy: Vec<String>,
}

impl LobbyView {
    pub fn is_empty(&self) -> bool {
        self.available.is_empty() && self.busy.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Server-to-client push issued by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A formatted, timestamped chat line from the current conversation.
    Message { text: String },
    UserJoined { name: String },
    UserLeft { name: String },
    /// The recipient has been paired by `by`.
    PeeredUp { by: String },
    /// `from` and `to` started a conversation.
    StatusChanged { from: String, to: String },
    /// `from` ended its conversation with `to`.
    PeerReturnedHome { from: String, to: String },
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

/// Requests a front end sends to the server. After a successful `join`
/// the connection's name is implied for every other request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Join { name: String },
    Pair { to: String },
    Send { text: String },
    ReturnToLobby,
    Lobby,
    Disconnect,
    Ping,
}

/// Everything the server writes to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Message {
        text: String,
    },
    UserJoined {
        name: String,
    },
    UserLeft {
        name: String,
    },
    PeeredUp {
        by: String,
    },
    StatusChanged {
        from: String,
        to: String,
    },
    PeerReturnedHome {
        from: String,
        to: String,
    },
    JoinResult {
        joined: bool,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        reason: Option<String>,
    },
    PairResult {
        to: String,
        paired: bool,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        reason: Option<String>,
    },
    Lobby {
        available: Vec<String>,
        busy: Vec<String>,
    },
    /// The request needs a conversation and the sender is not in one.
    NotPaired,
    Pong,
    Error {
        message: String,
    },
}

impl From<Notification> for ServerMessage {
    fn from(n: Notification) -> Self {
        match n {
            Notification::Message { text } => Self::Message { text },
            Notification::UserJoined { name } => Self::UserJoined { name },
            Notification::UserLeft { name } => Self::UserLeft { name },
            Notification::PeeredUp { by } => Self::PeeredUp { by },
            Notification::StatusChanged { from, to } => Self::StatusChanged { from, to },
            Notification::PeerReturnedHome { from, to } => Self::PeerReturnedHome { from, to },
        }
    }
}

impl From<LobbyView> for ServerMessage {
    fn from(view: LobbyView) -> Self {
        Self::Lobby {
            available: view.available,
            busy: view.busy,
        }
    }
}

impl ServerMessage {
    /// Split a server frame into a coordinator notification, handing back
    /// anything that is a reply instead.
    pub fn into_notification(self) -> Result<Notification, Self> {
        match self {
            Self::Message { text } => Ok(Notification::Message { text }),
            Self::UserJoined { name } => Ok(Notification::UserJoined { name }),
            Self::UserLeft { name } => Ok(Notification::UserLeft { name }),
            Self::PeeredUp { by } => Ok(Notification::PeeredUp { by }),
            Self::StatusChanged { from, to } => Ok(Notification::StatusChanged { from, to }),
            Self::PeerReturnedHome { from, to } => Ok(Notification::PeerReturnedHome { from, to }),
            other => Err(other),
        }
    }
}
