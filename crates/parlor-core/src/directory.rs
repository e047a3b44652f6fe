//! Authoritative map of connected users.
//!
//! Names are unique under case-insensitive comparison; the spelling used at
//! join time is kept for display. Listings come back in join order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handle::SharedHandle;
use crate::notifier::Recipient;
use crate::protocol::UserStatus;

/// Case-folded lookup key for a user name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NameKey(String);

impl NameKey {
    pub(crate) fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }
}

/// Case-insensitive name comparison used everywhere names are matched.
pub fn same_name(a: &str, b: &str) -> bool {
    NameKey::new(a) == NameKey::new(b)
}

/// A connected user.
#[derive(Clone)]
pub struct User {
    pub name: String,
    pub handle: SharedHandle,
    pub status: UserStatus,
    seq: u64,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("name", &self.name)
            .field("status", &self.status)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

impl User {
    pub fn recipient(&self) -> Recipient {
        Recipient {
            name: self.name.clone(),
            handle: self.handle.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Directory {
    users: HashMap<NameKey, User>,
    next_seq: u64,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`. Returns false, leaving the directory untouched, if
    /// the name is already present under case-insensitive comparison.
    pub fn join(&mut self, name: &str, handle: SharedHandle) -> bool {
        let key = NameKey::new(name);
        if self.users.contains_key(&key) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.users.insert(
            key,
            User {
                name: name.to_string(),
                handle,
                status: UserStatus::Available,
                seq,
            },
        );
        true
    }

    /// Delete the entry unconditionally. Any pairing must already be gone.
    pub fn remove(&mut self, name: &str) -> Option<User> {
        self.users.remove(&NameKey::new(name))
    }

    pub fn find(&self, name: &str) -> Option<&User> {
        self.users.get(&NameKey::new(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.users.contains_key(&NameKey::new(name))
    }

    /// Whether `name` is registered with exactly this handle.
    pub fn holds(&self, name: &str, handle: &SharedHandle) -> bool {
        self.find(name).is_some_and(|user| {
            std::ptr::addr_eq(Arc::as_ptr(&user.handle), Arc::as_ptr(handle))
        })
    }

    pub fn status(&self, name: &str) -> Option<UserStatus> {
        self.find(name).map(|u| u.status)
    }

    /// Only the pairing table flips statuses, keeping Busy in lock-step
    /// with edge membership.
    pub(crate) fn set_status(&mut self, name: &str, status: UserStatus) -> bool {
        match self.users.get_mut(&NameKey::new(name)) {
            Some(user) => {
                user.status = status;
                true
            }
            None => false,
        }
    }

    /// Users with `status`, excluding `requester`, in join order.
    pub fn list_by_status(&self, status: UserStatus, requester: &str) -> Vec<&User> {
        let skip = NameKey::new(requester);
        self.ordered()
            .into_iter()
            .filter(|(key, user)| user.status == status && **key != skip)
            .map(|(_, user)| user)
            .collect()
    }

    /// Snapshot of delivery targets matching `filter`, in join order.
    pub fn recipients(&self, filter: impl Fn(&User) -> bool) -> Vec<Recipient> {
        self.ordered()
            .into_iter()
            .filter(|(_, user)| filter(*user))
            .map(|(_, user)| user.recipient())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.ordered()
            .into_iter()
            .map(|(_, user)| user.name.clone())
            .collect()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn ordered(&self) -> Vec<(&NameKey, &User)> {
        let mut entries: Vec<_> = self.users.iter().collect();
        entries.sort_by_key(|(_, user)| user.seq);
        entries
    }
}
