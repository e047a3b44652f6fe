use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use super::*;
use crate::handle::SharedHandle;
use crate::protocol::{Notification, UserStatus};
use crate::testing::{FailingHandle, RecordingHandle, StallingHandle};

fn coordinator() -> Coordinator {
    Coordinator::new(CoordinatorConfig {
        delivery_timeout: Duration::from_millis(200),
        ..CoordinatorConfig::default()
    })
}

async fn joined(coord: &Coordinator, name: &str) -> RecordingHandle {
    let handle = RecordingHandle::new();
    coord.join(name, handle.shared()).await.unwrap();
    handle
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_join_is_rejected_case_insensitively() {
    let coord = coordinator();
    joined(&coord, "alice").await;
    joined(&coord, "bob").await;

    let again = coord.join("ALICE", RecordingHandle::new().shared()).await;
    assert_eq!(again, Err(JoinRejection::NameTaken));
    assert_eq!(coord.connected_count().await, 2);
}

#[tokio::test]
async fn invalid_name_is_rejected() {
    let coord = coordinator();
    let result = coord.join("", RecordingHandle::new().shared()).await;
    assert!(matches!(result, Err(JoinRejection::InvalidName(_))));

    let result = coord.join("has space", RecordingHandle::new().shared()).await;
    assert!(matches!(result, Err(JoinRejection::InvalidName(_))));
    assert_eq!(coord.connected_count().await, 0);
}

#[tokio::test]
async fn join_notifies_existing_users_but_not_self() {
    let coord = coordinator();
    let alice = joined(&coord, "alice").await;
    let bob = joined(&coord, "bob").await;

    assert_eq!(
        alice.received(),
        vec![Notification::UserJoined { name: "bob".into() }]
    );
    assert!(bob.received().is_empty());
}

#[tokio::test]
async fn join_skips_busy_users() {
    let coord = coordinator();
    let alice = joined(&coord, "alice").await;
    joined(&coord, "bob").await;
    coord.pair("alice", "bob").await.unwrap();
    alice.clear();

    joined(&coord, "carol").await;
    assert!(alice.received().is_empty());
}

// ---------------------------------------------------------------------------
// Pair
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pair_marks_both_busy_and_links_both_ways() {
    let coord = coordinator();
    joined(&coord, "alice").await;
    let bob = joined(&coord, "bob").await;
    let carol = joined(&coord, "carol").await;
    bob.clear();
    carol.clear();

    let edge = coord.pair("alice", "bob").await.unwrap();
    assert_eq!(edge.initiator, "alice");
    assert_eq!(edge.partner, "bob");

    assert_eq!(coord.status("alice").await, Some(UserStatus::Busy));
    assert_eq!(coord.status("bob").await, Some(UserStatus::Busy));
    assert_eq!(coord.partner_of("alice").await.as_deref(), Some("bob"));
    assert_eq!(coord.partner_of("bob").await.as_deref(), Some("alice"));

    assert_eq!(
        bob.received(),
        vec![Notification::PeeredUp { by: "alice".into() }]
    );
    assert_eq!(
        carol.received(),
        vec![Notification::StatusChanged {
            from: "alice".into(),
            to: "bob".into()
        }]
    );
    assert_eq!(coord.invariant_violation().await, None);
}

#[tokio::test]
async fn pair_uses_registered_spelling() {
    let coord = coordinator();
    joined(&coord, "Alice").await;
    let bob = joined(&coord, "Bob").await;

    let edge = coord.pair("alice", "BOB").await.unwrap();
    assert_eq!(edge.initiator, "Alice");
    assert_eq!(edge.partner, "Bob");
    assert_eq!(
        bob.received(),
        vec![Notification::PeeredUp { by: "Alice".into() }]
    );
}

#[tokio::test]
async fn pair_with_unknown_initiator_changes_nothing() {
    let coord = coordinator();
    joined(&coord, "alice").await;
    joined(&coord, "bob").await;
    coord.pair("alice", "bob").await.unwrap();

    assert_eq!(
        coord.pair("carol", "bob").await,
        Err(PairRejection::NotJoined)
    );
    assert_eq!(coord.partner_of("bob").await.as_deref(), Some("alice"));
    assert_eq!(coord.invariant_violation().await, None);
}

#[tokio::test]
async fn pair_rejections() {
    let coord = coordinator();
    joined(&coord, "alice").await;
    joined(&coord, "bob").await;
    joined(&coord, "carol").await;

    assert_eq!(
        coord.pair("alice", "ghost").await,
        Err(PairRejection::UnknownTarget)
    );
    assert_eq!(
        coord.pair("alice", "ALICE").await,
        Err(PairRejection::SelfPair)
    );

    coord.pair("alice", "bob").await.unwrap();
    assert_eq!(
        coord.pair("carol", "bob").await,
        Err(PairRejection::TargetBusy)
    );
    assert_eq!(
        coord.pair("alice", "carol").await,
        Err(PairRejection::AlreadyPaired)
    );
    assert_eq!(coord.status("carol").await, Some(UserStatus::Available));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_pairs_for_one_target_have_one_winner() {
    for _ in 0..50 {
        let coord = coordinator();
        let target = joined(&coord, "target").await;
        for name in ["a", "b", "c", "d"] {
            joined(&coord, name).await;
        }
        target.clear();

        let tasks: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|name| {
                let coord = coord.clone();
                tokio::spawn(async move { coord.pair(name, "target").await })
            })
            .collect();

        let mut wins = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => wins += 1,
                Err(rejection) => assert_eq!(rejection, PairRejection::TargetBusy),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(coord.list_busy("nobody").await.len(), 2);
        assert_eq!(target.received().len(), 1);
        assert_eq!(coord.invariant_violation().await, None);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pair_racing_disconnect_of_target_leaves_no_dangling_edge() {
    for _ in 0..50 {
        let coord = coordinator();
        joined(&coord, "a").await;
        joined(&coord, "b").await;
        joined(&coord, "c").await;

        let pairing = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.pair("a", "b").await })
        };
        let leaving = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.disconnect("b").await })
        };

        let paired = pairing.await.unwrap();
        assert!(leaving.await.unwrap());
        if let Err(rejection) = paired {
            assert_eq!(rejection, PairRejection::UnknownTarget);
        }

        assert_eq!(coord.status("b").await, None);
        assert_eq!(coord.status("a").await, Some(UserStatus::Available));
        assert_eq!(coord.partner_of("a").await, None);
        assert!(coord.list_busy("c").await.is_empty());
        assert_eq!(coord.invariant_violation().await, None);
    }
}

// ---------------------------------------------------------------------------
// Return / Disconnect
// ---------------------------------------------------------------------------

#[tokio::test]
async fn return_to_lobby_restores_both_and_tells_everyone_idle() {
    let coord = coordinator();
    let alice = joined(&coord, "alice").await;
    let bob = joined(&coord, "bob").await;
    let carol = joined(&coord, "carol").await;
    let dave = joined(&coord, "dave").await;
    joined(&coord, "erin").await;
    coord.pair("alice", "bob").await.unwrap();
    coord.pair("dave", "erin").await.unwrap();
    for h in [&alice, &bob, &carol, &dave] {
        h.clear();
    }

    coord.return_to_lobby("alice").await.unwrap();

    assert_eq!(coord.status("alice").await, Some(UserStatus::Available));
    assert_eq!(coord.status("bob").await, Some(UserStatus::Available));
    let expected = vec![Notification::PeerReturnedHome {
        from: "alice".into(),
        to: "bob".into(),
    }];
    assert_eq!(alice.received(), expected);
    assert_eq!(bob.received(), expected);
    assert_eq!(carol.received(), expected);
    // Busy bystanders are not told.
    assert!(dave.received().is_empty());
}

#[tokio::test]
async fn return_from_partner_side_and_repeat_is_noop() {
    let coord = coordinator();
    joined(&coord, "alice").await;
    joined(&coord, "bob").await;
    coord.pair("alice", "bob").await.unwrap();

    coord.return_to_lobby("bob").await.unwrap();
    assert_eq!(coord.partner_of("alice").await, None);
    assert_eq!(coord.return_to_lobby("bob").await, Err(NotPaired));
    assert_eq!(coord.return_to_lobby("alice").await, Err(NotPaired));
    assert_eq!(coord.invariant_violation().await, None);
}

#[tokio::test]
async fn disconnect_frees_partner_and_notifies() {
    let coord = coordinator();
    joined(&coord, "alice").await;
    let bob = joined(&coord, "bob").await;
    let carol = joined(&coord, "carol").await;
    coord.pair("alice", "bob").await.unwrap();
    bob.clear();
    carol.clear();

    assert!(coord.disconnect("alice").await);

    assert_eq!(coord.status("bob").await, Some(UserStatus::Available));
    assert_eq!(coord.status("alice").await, None);
    assert!(!coord.list_available("bob").await.contains(&"alice".to_string()));
    let left = vec![Notification::UserLeft { name: "alice".into() }];
    assert_eq!(bob.received(), left);
    assert_eq!(carol.received(), left);

    assert!(!coord.disconnect("alice").await);
    assert_eq!(coord.invariant_violation().await, None);
}

#[tokio::test]
async fn leave_ignores_stale_handle() {
    let coord = coordinator();
    let first = RecordingHandle::new().shared();
    coord.join("alice", first.clone()).await.unwrap();
    coord.disconnect("alice").await;

    let second = RecordingHandle::new().shared();
    coord.join("alice", second.clone()).await.unwrap();

    assert!(!coord.leave("alice", &first).await);
    assert_eq!(coord.connected_count().await, 1);
    assert!(coord.leave("alice", &second).await);
    assert_eq!(coord.connected_count().await, 0);
}

// ---------------------------------------------------------------------------
// Messages and listings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn message_reaches_both_endpoints_only() {
    let coord = coordinator();
    let alice = joined(&coord, "alice").await;
    let bob = joined(&coord, "bob").await;
    let carol = joined(&coord, "carol").await;
    coord.pair("alice", "bob").await.unwrap();
    for h in [&alice, &bob, &carol] {
        h.clear();
    }

    coord.send_message("bob", "hi").await.unwrap();

    let got = alice.received();
    assert_eq!(got.len(), 1);
    match &got[0] {
        Notification::Message { text } => {
            assert!(text.contains("bob"));
            assert!(text.contains("hi"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(bob.received(), got);
    assert!(carol.received().is_empty());
}

#[tokio::test]
async fn message_while_unpaired_is_dropped() {
    let coord = coordinator();
    let alice = joined(&coord, "alice").await;
    let bob = joined(&coord, "bob").await;
    alice.clear();

    assert_eq!(coord.send_message("alice", "anyone?").await, Err(NotPaired));
    assert_eq!(coord.send_message("ghost", "boo").await, Err(NotPaired));
    assert!(alice.received().is_empty());
    assert!(bob.received().is_empty());
}

#[tokio::test]
async fn listings_partition_everyone_but_requester() {
    let coord = coordinator();
    for name in ["alice", "bob", "carol", "dave"] {
        joined(&coord, name).await;
    }
    coord.pair("bob", "dave").await.unwrap();

    let available = coord.list_available("alice").await;
    let busy = coord.list_busy("alice").await;
    assert_eq!(available, vec!["carol"]);
    assert_eq!(busy, vec!["bob", "dave"]);

    let union: HashSet<_> = available.iter().chain(busy.iter()).collect();
    assert_eq!(union.len(), available.len() + busy.len());
    assert_eq!(union.len(), coord.connected_count().await - 1);

    let view = coord.lobby_view("alice").await;
    assert_eq!(view.available, available);
    assert_eq!(view.busy, busy);
}

// ---------------------------------------------------------------------------
// Faults
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_recipient_does_not_fail_the_operation() {
    let coord = coordinator();
    coord.join("ghost", FailingHandle::shared()).await.unwrap();
    let alice = joined(&coord, "alice").await;
    let bob = joined(&coord, "bob").await;

    assert_eq!(
        alice.received(),
        vec![Notification::UserJoined { name: "bob".into() }]
    );
    assert!(bob.received().is_empty());
}

#[tokio::test]
async fn repeatedly_unreachable_user_is_disconnected() {
    let coord = Coordinator::new(CoordinatorConfig {
        delivery_timeout: Duration::from_millis(200),
        unreachable_threshold: 2,
        ..CoordinatorConfig::default()
    });
    coord.join("ghost", FailingHandle::shared()).await.unwrap();
    joined(&coord, "alice").await;
    assert_eq!(coord.status("ghost").await, Some(UserStatus::Available));

    let bob = joined(&coord, "bob").await;

    assert_eq!(coord.status("ghost").await, None);
    assert_eq!(
        bob.received(),
        vec![Notification::UserLeft { name: "ghost".into() }]
    );
    assert_eq!(coord.invariant_violation().await, None);
}

#[tokio::test]
async fn evicting_a_paired_user_frees_its_partner() {
    let coord = Coordinator::new(CoordinatorConfig {
        delivery_timeout: Duration::from_millis(200),
        unreachable_threshold: 1,
        ..CoordinatorConfig::default()
    });
    let alice = joined(&coord, "alice").await;
    coord.join("ghost", FailingHandle::shared()).await.unwrap();
    alice.clear();

    coord.pair("alice", "ghost").await.unwrap();

    assert_eq!(coord.status("ghost").await, None);
    assert_eq!(coord.status("alice").await, Some(UserStatus::Available));
    assert_eq!(
        alice.received(),
        vec![Notification::UserLeft { name: "ghost".into() }]
    );
}

/// Parks its first delivery until released, then reports it as failed.
struct GatedFailure {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait::async_trait]
impl crate::handle::ClientHandle for GatedFailure {
    async fn deliver(&self, _notification: Notification) -> Result<(), crate::DeliveryError> {
        self.entered.notify_one();
        self.release.notified().await;
        Err(crate::DeliveryError::Unreachable("connection reset".into()))
    }
}

#[tokio::test]
async fn late_failure_of_old_session_spares_new_holder_of_the_name() {
    let coord = Coordinator::new(CoordinatorConfig {
        delivery_timeout: Duration::from_secs(5),
        unreachable_threshold: 1,
        ..CoordinatorConfig::default()
    });
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let old: SharedHandle = Arc::new(GatedFailure {
        entered: entered.clone(),
        release: release.clone(),
    });
    coord.join("ghost", old.clone()).await.unwrap();

    let newcomer = RecordingHandle::new();
    let replace_ghost = async {
        entered.notified().await;
        assert!(coord.leave("ghost", &old).await);
        coord.join("GHOST", newcomer.shared()).await.unwrap();
        release.notify_one();
    };
    let (joined_alice, ()) = tokio::join!(
        coord.join("alice", RecordingHandle::new().shared()),
        replace_ghost
    );
    joined_alice.unwrap();

    assert_eq!(coord.status("ghost").await, Some(UserStatus::Available));
    assert_eq!(coord.connected_count().await, 2);
    assert!(!coord.leave("ghost", &old).await);
    assert_eq!(coord.invariant_violation().await, None);
}

#[tokio::test]
async fn stalled_recipient_does_not_hang_fanout() {
    let coord = Coordinator::new(CoordinatorConfig {
        delivery_timeout: Duration::from_millis(50),
        ..CoordinatorConfig::default()
    });
    coord.join("stuck", StallingHandle::shared()).await.unwrap();

    let joined = tokio::time::timeout(
        Duration::from_secs(5),
        coord.join("alice", RecordingHandle::new().shared()),
    )
    .await;
    assert_eq!(joined, Ok(Ok(())));
    assert_eq!(coord.connected_count().await, 2);
}
