pub mod agent;
pub mod coordinator;
pub mod directory;
pub mod faults;
pub mod handle;
pub mod notifier;
pub mod pairing;
pub mod protocol;

#[cfg(test)]
mod testing;

pub use agent::{render_lobby, AgentOutput, AgentState, PresenceAgent};
pub use coordinator::{
    Coordinator, CoordinatorConfig, JoinRejection, NameRules, NotPaired, PairRejection,
};
pub use directory::{same_name, Directory, User};
pub use faults::FaultTracker;
pub use handle::{ClientHandle, DeliveryError, SharedHandle};
pub use notifier::{format_chat_line, FanoutReport, Notifier, Recipient};
pub use pairing::{Pairing, PairingError, PairingTable};
pub use protocol::{ClientRequest, LobbyView, Notification, ServerMessage, UserStatus};
