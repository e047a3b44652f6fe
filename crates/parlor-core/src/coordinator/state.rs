//! Shared state guarded by the coordinator's single lock.

use crate::directory::Directory;
use crate::faults::FaultTracker;
use crate::pairing::PairingTable;
use crate::protocol::UserStatus;

/// Directory, pairing table and fault counts under one lock, so every
/// check-then-act sequence sees and leaves a consistent view.
#[derive(Debug)]
pub(crate) struct LobbyState {
    pub(crate) directory: Directory,
    pub(crate) pairings: PairingTable,
    pub(crate) faults: FaultTracker,
}

impl LobbyState {
    pub(crate) fn new(unreachable_threshold: u32) -> Self {
        Self {
            directory: Directory::new(),
            pairings: PairingTable::new(),
            faults: FaultTracker::new(unreachable_threshold),
        }
    }

    /// Describe the first broken invariant, if any. Busy must coincide with
    /// having exactly one edge, and every edge must join two present users.
    pub(crate) fn invariant_violation(&self) -> Option<String> {
        for user in self.directory.users() {
            let busy = user.status == UserStatus::Busy;
            let paired = self.pairings.is_paired(&user.name);
            if busy != paired {
                return Some(format!(
                    "{} is {:?} but paired={}",
                    user.name, user.status, paired
                ));
            }
        }
        for edge in self.pairings.edges() {
            for endpoint in [&edge.initiator, &edge.partner] {
                if !self.directory.contains(endpoint) {
                    return Some(format!("edge endpoint {endpoint} is not connected"));
                }
            }
        }
        None
    }
}
