//! Record of which user is chatting with which.
//!
//! The table is the only writer of `Busy`: creating an edge marks both
//! endpoints Busy in the directory, removing one restores both to
//! Available.

use std::collections::HashMap;

use crate::directory::{Directory, NameKey};
use crate::protocol::UserStatus;

/// A directed edge `initiator -> partner` for one active conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub initiator: String,
    pub partner: String,
}

impl Pairing {
    /// The endpoint opposite `name`, if `name` is on this edge.
    pub fn other(&self, name: &str) -> Option<&str> {
        let key = NameKey::new(name);
        if NameKey::new(&self.initiator) == key {
            Some(&self.partner)
        } else if NameKey::new(&self.partner) == key {
            Some(&self.initiator)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairingError {
    #[error("{0} is already paired")]
    AlreadyPaired(String),

    #[error("{0} is not connected")]
    UnknownUser(String),

    #[error("cannot pair {0} with itself")]
    SelfPair(String),
}

#[derive(Debug, Default)]
pub struct PairingTable {
    /// Edges keyed by initiator.
    edges: HashMap<NameKey, Pairing>,
    /// Both endpoints of every edge -> initiator key.
    members: HashMap<NameKey, NameKey>,
}

impl PairingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The other endpoint of the edge containing `name`, in either role.
    pub fn lookup_partner(&self, name: &str) -> Option<String> {
        self.edge_of(name)
            .and_then(|edge| edge.other(name))
            .map(str::to_string)
    }

    pub fn edge_of(&self, name: &str) -> Option<&Pairing> {
        let initiator = self.members.get(&NameKey::new(name))?;
        self.edges.get(initiator)
    }

    pub fn is_paired(&self, name: &str) -> bool {
        self.members.contains_key(&NameKey::new(name))
    }

    /// Establish `initiator -> partner` and mark both Busy.
    ///
    /// Fails without mutation if either endpoint already has an edge or is
    /// missing from the directory.
    pub fn create(
        &mut self,
        directory: &mut Directory,
        initiator: &str,
        partner: &str,
    ) -> Result<&Pairing, PairingError> {
        let init_key = NameKey::new(initiator);
        let partner_key = NameKey::new(partner);
        if init_key == partner_key {
            return Err(PairingError::SelfPair(initiator.to_string()));
        }
        for name in [initiator, partner] {
            if !directory.contains(name) {
                return Err(PairingError::UnknownUser(name.to_string()));
            }
            if self.is_paired(name) {
                return Err(PairingError::AlreadyPaired(name.to_string()));
            }
        }

        directory.set_status(initiator, UserStatus::Busy);
        directory.set_status(partner, UserStatus::Busy);
        self.members.insert(init_key.clone(), init_key.clone());
        self.members.insert(partner_key, init_key.clone());
        Ok(self.edges.entry(init_key).or_insert(Pairing {
            initiator: initiator.to_string(),
            partner: partner.to_string(),
        }))
    }

    /// Remove the edge containing `name` and restore both endpoints to
    /// Available. No-op when `name` has no edge.
    pub fn remove(&mut self, directory: &mut Directory, name: &str) -> Option<Pairing> {
        let initiator = self.members.get(&NameKey::new(name))?.clone();
        let edge = self.edges.remove(&initiator)?;
        self.members.remove(&NameKey::new(&edge.initiator));
        self.members.remove(&NameKey::new(&edge.partner));
        directory.set_status(&edge.initiator, UserStatus::Available);
        directory.set_status(&edge.partner, UserStatus::Available);
        Some(edge)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Pairing> {
        self.edges.values()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
