//! The coordinator: every operation mutates state under one lock, takes a
//! recipient snapshot, releases the lock, then fans out.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::state::LobbyState;
use super::types::{CoordinatorConfig, JoinRejection, NameRules, NotPaired, PairRejection};
use crate::directory::same_name;
use crate::handle::SharedHandle;
use crate::notifier::{FanoutReport, Notifier, Recipient};
use crate::pairing::{Pairing, PairingError};
use crate::protocol::{LobbyView, Notification, UserStatus};

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owns the directory and pairing table and serialises all mutation.
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Coordinator {
    state: Arc<RwLock<LobbyState>>,
    notifier: Notifier,
    names: Arc<NameRules>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(LobbyState::new(config.unreachable_threshold))),
            notifier: Notifier::new(config.delivery_timeout),
            names: Arc::new(config.names),
        }
    }

    // -- Join / Disconnect --------------------------------------------------

    /// Register `name`. Users already in the lobby are told about the
    /// newcomer; the newcomer is not notified about itself.
    pub async fn join(&self, name: &str, handle: SharedHandle) -> Result<(), JoinRejection> {
        self.names.check(name).map_err(JoinRejection::InvalidName)?;

        let recipients = {
            let mut state = self.state.write().await;
            let recipients = state.directory.recipients(|u| u.status == UserStatus::Available);
            if !state.directory.join(name, handle) {
                return Err(JoinRejection::NameTaken);
            }
            state.faults.forget(name);
            recipients
        };

        info!(name = %name, "User joined");
        let report = self
            .notifier
            .broadcast(
                recipients,
                Notification::UserJoined {
                    name: name.to_string(),
                },
            )
            .await;
        self.settle(report).await;
        Ok(())
    }

    /// Remove `name`, first ending its conversation if it has one. Returns
    /// false if `name` was not connected.
    pub async fn disconnect(&self, name: &str) -> bool {
        match self.disconnect_one(name, None).await {
            Some(report) => {
                self.settle(report).await;
                true
            }
            None => false,
        }
    }

    /// Disconnect `name` only while it is still registered with `handle`.
    /// Used by transports so a stale session cannot remove a newer user who
    /// took the same name after an eviction.
    pub async fn leave(&self, name: &str, handle: &SharedHandle) -> bool {
        match self.disconnect_one(name, Some(handle)).await {
            Some(report) => {
                self.settle(report).await;
                true
            }
            None => false,
        }
    }

    /// Remove `name`, and with `session` set only while that handle still
    /// owns the name.
    async fn disconnect_one(
        &self,
        name: &str,
        session: Option<&SharedHandle>,
    ) -> Option<FanoutReport> {
        let (departed, recipients) = {
            let mut state = self.state.write().await;
            let state = &mut *state;
            let owned = match session {
                Some(handle) => state.directory.holds(name, handle),
                None => state.directory.contains(name),
            };
            if !owned {
                return None;
            }
            if let Some(edge) = state.pairings.remove(&mut state.directory, name) {
                debug!(name = %name, partner = ?edge.other(name), "Ended conversation on disconnect");
            }
            let departed = state.directory.remove(name)?.name;
            state.faults.forget(name);
            debug_assert_eq!(state.invariant_violation(), None);
            let recipients = state.directory.recipients(|u| u.status == UserStatus::Available);
            (departed, recipients)
        };

        info!(name = %departed, "User left");
        Some(
            self.notifier
                .broadcast(recipients, Notification::UserLeft { name: departed })
                .await,
        )
    }

    // -- Pairing ------------------------------------------------------------

    /// Start a conversation `from -> to`. The target is told directly; lobby
    /// bystanders are told the two are now chatting.
    pub async fn pair(&self, from: &str, to: &str) -> Result<Pairing, PairRejection> {
        if same_name(from, to) {
            return Err(PairRejection::SelfPair);
        }

        let (edge, target, bystanders) = {
            let mut state = self.state.write().await;
            let state = &mut *state;
            if !state.directory.contains(from) {
                return Err(PairRejection::NotJoined);
            }
            if state.pairings.is_paired(from) {
                return Err(PairRejection::AlreadyPaired);
            }
            let target = match state.directory.find(to) {
                None => return Err(PairRejection::UnknownTarget),
                Some(user) if user.status == UserStatus::Busy => {
                    return Err(PairRejection::TargetBusy)
                }
                Some(user) => user.recipient(),
            };
            let from_name = state
                .directory
                .find(from)
                .map(|u| u.name.clone())
                .ok_or(PairRejection::NotJoined)?;

            let edge = state
                .pairings
                .create(&mut state.directory, &from_name, &target.name)
                .map_err(|e| match e {
                    PairingError::AlreadyPaired(n) if same_name(&n, from) => {
                        PairRejection::AlreadyPaired
                    }
                    PairingError::AlreadyPaired(_) => PairRejection::TargetBusy,
                    PairingError::UnknownUser(_) => PairRejection::UnknownTarget,
                    PairingError::SelfPair(_) => PairRejection::SelfPair,
                })?
                .clone();
            debug_assert_eq!(state.invariant_violation(), None);

            // Both endpoints are Busy now, so this is exactly the idle bystanders.
            let bystanders = state.directory.recipients(|u| u.status == UserStatus::Available);
            (edge, target, bystanders)
        };

        info!(from = %edge.initiator, to = %edge.partner, "Paired");
        let mut report = FanoutReport::default();
        let result = self
            .notifier
            .deliver(
                &target,
                Notification::PeeredUp {
                    by: edge.initiator.clone(),
                },
            )
            .await;
        report.record(&target, &result);

        report.merge(
            self.notifier
                .broadcast(
                    bystanders,
                    Notification::StatusChanged {
                        from: edge.initiator.clone(),
                        to: edge.partner.clone(),
                    },
                )
                .await,
        );
        self.settle(report).await;
        Ok(edge)
    }

    /// End the caller's conversation. Both endpoints return to the lobby and
    /// every idle user, the two endpoints included, receives
    /// `PeerReturnedHome { from: caller, to: other }`.
    pub async fn return_to_lobby(&self, name: &str) -> Result<(), NotPaired> {
        let (notification, recipients) = {
            let mut state = self.state.write().await;
            let state = &mut *state;
            let edge = state
                .pairings
                .remove(&mut state.directory, name)
                .ok_or(NotPaired)?;
            debug_assert_eq!(state.invariant_violation(), None);

            let from = state
                .directory
                .find(name)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| name.to_string());
            let to = edge.other(name).unwrap_or_default().to_string();
            let recipients = state.directory.recipients(|u| u.status == UserStatus::Available);
            (Notification::PeerReturnedHome { from, to }, recipients)
        };

        info!(event = ?notification, "Conversation ended");
        let report = self.notifier.broadcast(recipients, notification).await;
        self.settle(report).await;
        Ok(())
    }

    /// Relay `text` from `from` to both endpoints of its conversation.
    pub async fn send_message(&self, from: &str, text: &str) -> Result<(), NotPaired> {
        let (sender, endpoints) = {
            let state = self.state.read().await;
            let partner = state.pairings.lookup_partner(from).ok_or(NotPaired)?;
            let sender = state.directory.find(from).ok_or(NotPaired)?;
            let endpoints: Vec<Recipient> = [Some(sender), state.directory.find(&partner)]
                .into_iter()
                .flatten()
                .map(|u| u.recipient())
                .collect();
            (sender.name.clone(), endpoints)
        };

        debug!(from = %sender, len = text.len(), "Relaying message");
        let report = self.notifier.relay(&sender, endpoints, text).await;
        self.settle(report).await;
        Ok(())
    }

    // -- Queries ------------------------------------------------------------

    /// Available users other than `requester`, in join order.
    pub async fn list_available(&self, requester: &str) -> Vec<String> {
        self.list(UserStatus::Available, requester).await
    }

    /// Busy users other than `requester`, in join order.
    pub async fn list_busy(&self, requester: &str) -> Vec<String> {
        self.list(UserStatus::Busy, requester).await
    }

    /// Both listings from a single snapshot.
    pub async fn lobby_view(&self, requester: &str) -> LobbyView {
        let state = self.state.read().await;
        let names = |status: UserStatus| -> Vec<String> {
            state
                .directory
                .list_by_status(status, requester)
                .into_iter()
                .map(|u| u.name.clone())
                .collect()
        };
        LobbyView {
            available: names(UserStatus::Available),
            busy: names(UserStatus::Busy),
        }
    }

    pub async fn status(&self, name: &str) -> Option<UserStatus> {
        self.state.read().await.directory.status(name)
    }

    pub async fn partner_of(&self, name: &str) -> Option<String> {
        self.state.read().await.pairings.lookup_partner(name)
    }

    pub async fn connected_count(&self) -> usize {
        self.state.read().await.directory.len()
    }

    async fn list(&self, status: UserStatus, requester: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .directory
            .list_by_status(status, requester)
            .into_iter()
            .map(|u| u.name.clone())
            .collect()
    }

    // -- Fault handling -----------------------------------------------------

    /// Feed a fan-out outcome to the fault tracker and implicitly disconnect
    /// anyone who crossed the threshold. Evictions produce fan-outs of their
    /// own, which are queued rather than recursed into.
    async fn settle(&self, report: FanoutReport) {
        if report.is_empty() {
            return;
        }
        let mut pending: VecDeque<Recipient> = self.record_faults(report).await.into();

        while let Some(session) = pending.pop_front() {
            info!(name = %session.name, "Disconnecting unreachable user");
            if let Some(report) = self.disconnect_one(&session.name, Some(&session.handle)).await {
                pending.extend(self.record_faults(report).await);
            }
        }
    }

    /// Count outcomes against sessions that still own their name; a user who
    /// re-joined under a departed user's name starts with a clean record.
    async fn record_faults(&self, mut report: FanoutReport) -> Vec<Recipient> {
        let mut state = self.state.write().await;
        let state = &mut *state;
        let directory = &state.directory;
        report.retain(|r| directory.holds(&r.name, &r.handle));
        state.faults.record(&report)
    }

    #[cfg(test)]
    pub(crate) async fn invariant_violation(&self) -> Option<String> {
        self.state.read().await.invariant_violation()
    }
}
