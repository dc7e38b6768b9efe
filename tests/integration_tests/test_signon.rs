// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use oscar_server_rs::{
    models::{feedbag::FeedbagItem, parse::SnacBody},
    session::{
        common::{KickReason, ServerMessage},
        session::Session,
    },
    store::traits::FeedbagManager,
};
use serial_test::serial;
use tokio_util::sync::CancellationToken;

use super::harness::{Server, drain};

#[tokio::test]
#[serial]
async fn test_second_signon_displaces_the_first() {
    let srv = Server::start();
    assert!(srv.cfg.server.replace_existing_sessions);

    let (first, mut rx_first) = srv.signon("alice").await;
    let (second, _rx_second) = srv.signon("Alice").await;

    let kick = rx_first.try_recv().expect("first session not notified");
    assert_eq!(kick, ServerMessage::Kick(KickReason::SignedOnElsewhere));
    assert!(first.is_closed());
    assert!(!second.is_closed());
    assert!(srv.registry.is_online("alice"));
}

#[tokio::test]
#[serial]
async fn test_duplicate_signon_rejected_without_replacement() {
    let srv = Server::start();
    let (_first, _rx) = srv.signon("alice").await;

    let (second, _rx2) = Session::new("alice", None, srv.cfg.limits.session_queue_depth);
    assert!(srv.registry.insert(second, false).is_err());
}

#[tokio::test]
#[serial]
async fn test_signon_populates_presence_both_ways() {
    let srv = Server::start();
    let (_bob, mut rx_b) = srv.signon("bob").await;

    srv.store
        .feedbag_upsert(
            &CancellationToken::new(),
            "alice",
            &[FeedbagItem::buddy("bob", 1, 10)],
        )
        .await
        .expect("upsert");

    let (_alice, mut rx_a) = srv.signon("alice").await;

    // Alice's initial view includes her online buddy.
    let to_alice = drain(&mut rx_a);
    assert!(
        matches!(&to_alice[0], SnacBody::BuddyArrived(a) if a.user_info.screen_name == "bob"),
        "got {to_alice:?}"
    );

    // Bob learns that alice just arrived.
    let to_bob = drain(&mut rx_b);
    assert!(
        matches!(&to_bob[0], SnacBody::BuddyArrived(a) if a.user_info.screen_name == "alice"),
        "got {to_bob:?}"
    );
}
