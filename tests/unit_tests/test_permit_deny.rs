// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use oscar_server_rs::{
    models::{
        feedbag::PdMode,
        parse::SnacBody,
        pd::{
            PdAddDenyListEntries, PdAddPermListEntries, PdDelDenyListEntries,
            PdRightsQuery,
        },
    },
    store::traits::LocalBuddyListManager,
};
use tokio_util::sync::CancellationToken;

use super::harness::{TestServer, drain, single_reply};

fn ctx() -> CancellationToken {
    CancellationToken::new()
}

#[tokio::test]
async fn test_rights_query_is_static() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    let reply = single_reply(srv.send(&alice, PdRightsQuery).await);
    assert!(matches!(reply, SnacBody::PdRightsReply(r) if !r.tlvs.is_empty()));
}

#[tokio::test]
async fn test_deny_list_mutation_sets_mode_and_list() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    let replies = srv
        .send(&alice, PdAddDenyListEntries { users: vec!["Bob".to_owned()] })
        .await;
    assert!(replies.is_empty());

    assert_eq!(srv.store.pd_mode(&ctx(), "alice").await.expect("mode"), PdMode::DenySome);
    assert_eq!(
        srv.store.deny_list(&ctx(), "alice").await.expect("list"),
        vec!["bob".to_owned()]
    );
}

#[tokio::test]
async fn test_self_sentinel_sets_global_modes() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    // Denying yourself means "permit everyone".
    srv.send(&alice, PdAddDenyListEntries { users: vec!["alice".to_owned()] }).await;
    assert_eq!(srv.store.pd_mode(&ctx(), "alice").await.expect("mode"), PdMode::PermitAll);
    assert!(srv.store.deny_list(&ctx(), "alice").await.expect("list").is_empty());

    // Permitting yourself means "deny everyone".
    srv.send(&alice, PdAddPermListEntries { users: vec!["Alice".to_owned()] }).await;
    assert_eq!(srv.store.pd_mode(&ctx(), "alice").await.expect("mode"), PdMode::DenyAll);
    assert!(srv.store.permit_list(&ctx(), "alice").await.expect("list").is_empty());
}

#[tokio::test]
async fn test_deny_then_undeny_flips_visibility() {
    let srv = TestServer::new();
    let (alice, mut rx_a) = srv.login("alice");
    let (_bob, mut rx_b) = srv.login("bob");

    srv.send(&alice, PdAddDenyListEntries { users: vec!["bob".to_owned()] }).await;

    let to_bob = drain(&mut rx_b);
    assert_eq!(to_bob.len(), 1);
    assert!(
        matches!(&to_bob[0], SnacBody::BuddyDeparted(d) if d.user_info.screen_name == "alice"),
        "blocked peer sees a departure: {to_bob:?}"
    );
    let to_alice = drain(&mut rx_a);
    assert!(
        matches!(&to_alice[0], SnacBody::BuddyDeparted(d) if d.user_info.screen_name == "bob"),
        "bidirectional: subject stops seeing the peer too: {to_alice:?}"
    );

    srv.send(&alice, PdDelDenyListEntries { users: vec!["bob".to_owned()] }).await;

    let to_bob = drain(&mut rx_b);
    assert_eq!(to_bob.len(), 1);
    assert!(
        matches!(&to_bob[0], SnacBody::BuddyArrived(a) if a.user_info.screen_name == "alice"),
        "unblocked peer sees an arrival: {to_bob:?}"
    );
}

#[tokio::test]
async fn test_no_broadcast_before_signon_complete() {
    let srv = TestServer::new();
    let (alice, _rx_a) = srv.login_fresh("alice", None);
    let (_bob, mut rx_b) = srv.login("bob");

    srv.send(&alice, PdAddDenyListEntries { users: vec!["bob".to_owned()] }).await;

    assert_eq!(
        srv.store.pd_mode(&ctx(), "alice").await.expect("mode"),
        PdMode::DenySome,
        "list mutation still persists"
    );
    assert!(drain(&mut rx_b).is_empty(), "signon broadcast covers it later");
}
