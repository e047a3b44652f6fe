//! Client-side presence state machine.
//!
//! Turns coordinator notifications into display output for one user and
//! tracks whether that user is in the lobby or in a conversation. The agent
//! performs no I/O; a front end renders `AgentOutput` and answers
//! `RefreshLobby` by fetching a fresh `LobbyView`.

use tracing::debug;

use crate::directory::same_name;
use crate::protocol::{LobbyView, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentState {
    Lobby,
    Paired { partner: String },
    Gone,
}

/// What the front end should do in response to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutput {
    Show(String),
    /// Fetch and render the current lobby listing.
    RefreshLobby,
}

#[derive(Debug)]
pub struct PresenceAgent {
    name: String,
    state: AgentState,
}

impl PresenceAgent {
    /// An agent for `name`, which has just joined and sits in the lobby.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: AgentState::Lobby,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn is_paired(&self) -> bool {
        matches!(self.state, AgentState::Paired { .. })
    }

    pub fn partner(&self) -> Option<&str> {
        match &self.state {
            AgentState::Paired { partner } => Some(partner),
            _ => None,
        }
    }

    /// Our own pair request was accepted.
    pub fn paired_with(&mut self, partner: &str) -> Vec<AgentOutput> {
        self.state = AgentState::Paired {
            partner: partner.to_string(),
        };
        vec![AgentOutput::Show(format!(
            "You are now chatting with {partner}. Type $return to go back to the lobby."
        ))]
    }

    /// The server reports that we are not in a conversation. Any pairing we
    /// still believe in is stale.
    pub fn not_paired(&mut self) -> Vec<AgentOutput> {
        let AgentState::Paired { partner } = &self.state else {
            debug!(state = ?self.state, "Not paired, as expected");
            return vec![];
        };
        let line = format!("Your conversation with {partner} has ended. Returning to the lobby.");
        self.state = AgentState::Lobby;
        vec![AgentOutput::Show(line), AgentOutput::RefreshLobby]
    }

    pub fn disconnected(&mut self) {
        self.state = AgentState::Gone;
    }

    pub fn handle(&mut self, notification: Notification) -> Vec<AgentOutput> {
        if self.state == AgentState::Gone {
            debug!(event = ?notification, "Ignoring notification after disconnect");
            return vec![];
        }
        let partner = self.partner().map(str::to_string);

        match notification {
            Notification::Message { text } if partner.is_some() => vec![AgentOutput::Show(text)],
            Notification::Message { .. } => {
                debug!("Dropping chat message received outside a conversation");
                vec![]
            }

            Notification::UserLeft { ref name }
                if partner.as_deref().is_some_and(|p| same_name(p, name)) =>
            {
                self.state = AgentState::Lobby;
                vec![
                    AgentOutput::Show(
                        "Your partner has disconnected. Returning to the lobby.".into(),
                    ),
                    AgentOutput::RefreshLobby,
                ]
            }

            Notification::PeeredUp { by } => {
                let line = format!(
                    "{by} started a conversation with you. Type $return to go back to the lobby."
                );
                self.state = AgentState::Paired { partner: by };
                vec![AgentOutput::Show(line)]
            }

            Notification::PeerReturnedHome { ref from, .. } if same_name(from, &self.name) => {
                self.state = AgentState::Lobby;
                vec![
                    AgentOutput::Show("You are back in the lobby.".into()),
                    AgentOutput::RefreshLobby,
                ]
            }
            Notification::PeerReturnedHome { ref from, ref to } if same_name(to, &self.name) => {
                let line = format!("{from} ended the conversation. Returning to the lobby.");
                self.state = AgentState::Lobby;
                vec![AgentOutput::Show(line), AgentOutput::RefreshLobby]
            }

            // Everything else is lobby news, shown only while idle.
            n if partner.is_some() => {
                debug!(event = ?n, "Suppressing lobby event while paired");
                vec![]
            }
            Notification::UserJoined { name } => lobby_news(format!("{name} joined the room.")),
            Notification::UserLeft { name } => lobby_news(format!("{name} left the room.")),
            Notification::StatusChanged { from, to } => {
                lobby_news(format!("{from} and {to} are now chatting."))
            }
            Notification::PeerReturnedHome { from, to } => {
                lobby_news(format!("{from} and {to} finished chatting."))
            }
        }
    }
}

fn lobby_news(line: String) -> Vec<AgentOutput> {
    vec![AgentOutput::Show(line), AgentOutput::RefreshLobby]
}

/// Render a lobby listing for display.
pub fn render_lobby(view: &LobbyView) -> String {
    if view.is_empty() {
        return "Nobody else is here yet.".to_string();
    }
    let mut out = String::new();
    out.push_str("Available:\n");
    if view.available.is_empty() {
        out.push_str("  (none)\n");
    }
    for name in &view.available {
        out.push_str(&format!("  {name}\n"));
    }
    if !view.busy.is_empty() {
        out.push_str("Busy:\n");
        for name in &view.busy {
            out.push_str(&format!("  {name}\n"));
        }
    }
    out.push_str("Type $<name> to start a conversation.");
    out
}
