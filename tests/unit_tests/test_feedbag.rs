// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use hex_literal::hex;
use oscar_server_rs::{
    models::{
        bart::{BartFlags, BartId, CLEAR_ICON_HASH, bart_type, hash_item},
        feedbag::{
            FeedbagDeleteItem, FeedbagItem, FeedbagQuery, FeedbagQueryIfModified,
            FeedbagUpsertItem, FeedbagUse,
        },
        parse::SnacBody,
        snac::ErrorCode,
        user_info::tag,
    },
    store::traits::{BartItemManager, FeedbagManager},
};
use tokio_util::sync::CancellationToken;

use super::harness::{TestServer, drain, single_reply};

fn upsert(items: Vec<FeedbagItem>) -> FeedbagUpsertItem {
    FeedbagUpsertItem { items }
}

#[tokio::test]
async fn test_query_returns_upserted_items() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    let reply = single_reply(
        srv.send(&alice, upsert(vec![FeedbagItem::buddy("bob", 1, 10)])).await,
    );
    let SnacBody::FeedbagStatus(status) = reply else {
        panic!("expected status, got {reply:?}");
    };
    assert_eq!(status.results, vec![0x0000]);

    let reply = single_reply(srv.send(&alice, FeedbagQuery).await);
    let SnacBody::FeedbagReply(feedbag) = reply else {
        panic!("expected feedbag reply, got {reply:?}");
    };
    assert_eq!(feedbag.items.len(), 1);
    assert_eq!(feedbag.items[0].name, "bob");
    assert!(feedbag.last_update > 0);
}

#[tokio::test]
async fn test_status_results_align_with_batch() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    let reply = single_reply(
        srv.send(
            &alice,
            upsert(vec![
                FeedbagItem::buddy("bob", 1, 10),
                FeedbagItem::buddy("carol", 1, 11),
                FeedbagItem::permit("dave", 12),
            ]),
        )
        .await,
    );
    let SnacBody::FeedbagStatus(status) = reply else {
        panic!("expected status, got {reply:?}");
    };
    assert_eq!(status.results, vec![0x0000; 3]);
}

#[tokio::test]
async fn test_query_if_modified_both_branches() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");
    srv.send(&alice, upsert(vec![FeedbagItem::buddy("bob", 1, 10)])).await;

    let stored = srv
        .store
        .feedbag_last_modified(&CancellationToken::new(), "alice")
        .await
        .expect("last modified");

    // Client copy is current.
    let reply = single_reply(
        srv.send(&alice, FeedbagQueryIfModified { last_update: stored, count: 1 }).await,
    );
    let SnacBody::FeedbagReplyNotModified(not_modified) = reply else {
        panic!("expected not-modified, got {reply:?}");
    };
    assert_eq!(not_modified.last_update, stored);
    assert_eq!(not_modified.count, 1);

    // Client copy is stale.
    let reply = single_reply(
        srv.send(&alice, FeedbagQueryIfModified { last_update: stored - 1, count: 1 })
            .await,
    );
    assert!(matches!(reply, SnacBody::FeedbagReply(_)));
}

#[tokio::test]
async fn test_upsert_buddy_announces_online_buddy() {
    let srv = TestServer::new();
    let (alice, mut rx_a) = srv.login("alice");
    let (_bob, mut rx_b) = srv.login("bob");

    srv.send(&alice, upsert(vec![FeedbagItem::buddy("bob", 1, 10)])).await;

    let bodies = drain(&mut rx_a);
    assert_eq!(bodies.len(), 1);
    let SnacBody::BuddyArrived(arrived) = &bodies[0] else {
        panic!("expected arrival, got {bodies:?}");
    };
    assert_eq!(arrived.user_info.screen_name, "bob");
    assert!(drain(&mut rx_b).is_empty());
}

#[tokio::test]
async fn test_block_departs_both_sides_exactly_once() {
    let srv = TestServer::new();
    let (alice, mut rx_a) = srv.login("alice");
    let (_bob, mut rx_b) = srv.login("bob");

    srv.send(&alice, upsert(vec![FeedbagItem::deny("bob", 20)])).await;

    let to_alice = drain(&mut rx_a);
    let to_bob = drain(&mut rx_b);
    assert_eq!(to_alice.len(), 1, "alice: {to_alice:?}");
    assert_eq!(to_bob.len(), 1, "bob: {to_bob:?}");
    assert!(matches!(&to_alice[0], SnacBody::BuddyDeparted(d) if d.user_info.screen_name == "bob"));
    assert!(matches!(&to_bob[0], SnacBody::BuddyDeparted(d) if d.user_info.screen_name == "alice"));
}

#[tokio::test]
async fn test_unblock_mutual_arrival_exactly_once() {
    let srv = TestServer::new();
    let (alice, mut rx_a) = srv.login("alice");
    let (_bob, mut rx_b) = srv.login("bob");

    srv.send(&alice, upsert(vec![FeedbagItem::deny("bob", 20)])).await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    srv.send(&alice, FeedbagDeleteItem { items: vec![FeedbagItem::deny("bob", 20)] })
        .await;

    let to_alice = drain(&mut rx_a);
    let to_bob = drain(&mut rx_b);
    assert_eq!(to_alice.len(), 1, "alice: {to_alice:?}");
    assert_eq!(to_bob.len(), 1, "bob: {to_bob:?}");
    assert!(matches!(&to_alice[0], SnacBody::BuddyArrived(a) if a.user_info.screen_name == "bob"));
    assert!(matches!(&to_bob[0], SnacBody::BuddyArrived(a) if a.user_info.screen_name == "alice"));
}

#[tokio::test]
async fn test_invisible_unblock_emits_nothing() {
    let srv = TestServer::new();
    let (alice, mut rx_a) = srv.login("alice");
    let (_bob, mut rx_b) = srv.login("bob");

    srv.send(&alice, upsert(vec![FeedbagItem::deny("bob", 20)])).await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    alice.set_invisible(true);
    srv.send(&alice, FeedbagDeleteItem { items: vec![FeedbagItem::deny("bob", 20)] })
        .await;

    assert!(drain(&mut rx_a).is_empty(), "invisible unblocker hears nothing");
    assert!(drain(&mut rx_b).is_empty(), "peer must not see an invisible user arrive");
}

#[tokio::test]
async fn test_self_block_refused_without_persistence() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    let reply = single_reply(
        srv.send(
            &alice,
            upsert(vec![
                FeedbagItem::buddy("bob", 1, 10),
                FeedbagItem::deny("A L I C E", 20),
            ]),
        )
        .await,
    );
    let SnacBody::FeedbagErr(err) = reply else {
        panic!("expected error, got {reply:?}");
    };
    assert_eq!(err.code, u16::from(ErrorCode::NotSupportedByHost));

    let items = srv
        .store
        .feedbag(&CancellationToken::new(), "alice")
        .await
        .expect("feedbag");
    assert!(items.is_empty(), "batch must not persist: {items:?}");
}

#[tokio::test]
async fn test_bart_item_with_unknown_hash_requests_upload() {
    let srv = TestServer::new();
    let (alice, mut rx_a) = srv.login("alice");
    let (bob, mut rx_b) = srv.login("bob");
    srv.send(&bob, upsert(vec![FeedbagItem::buddy("alice", 1, 1)])).await;
    drain(&mut rx_b);

    let id = BartId::new(
        bart_type::BUDDY_ICON,
        BartFlags::KNOWN,
        hex!("00112233445566778899aabbccddeeff").to_vec(),
    );
    srv.send(
        &alice,
        upsert(vec![FeedbagItem::bart_icon(30, id.encode())]),
    )
    .await;

    let to_alice = drain(&mut rx_a);
    assert_eq!(to_alice.len(), 1);
    let SnacBody::OServiceBartReply(bart) = &to_alice[0] else {
        panic!("expected bart reply, got {to_alice:?}");
    };
    assert_eq!(bart.id.flags, BartFlags::CUSTOM | BartFlags::UNKNOWN);

    // No broadcast until the blob is actually uploaded.
    assert!(drain(&mut rx_b).is_empty());
}

#[tokio::test]
async fn test_bart_item_with_known_hash_goes_live() {
    let srv = TestServer::new();
    let (alice, mut rx_a) = srv.login("alice");
    let (bob, mut rx_b) = srv.login("bob");
    srv.send(&bob, upsert(vec![FeedbagItem::buddy("alice", 1, 1)])).await;
    drain(&mut rx_b);

    let data = bytes::Bytes::from_static(b"icon bytes");
    let hash = hash_item(&data);
    srv.store
        .insert_bart_item(&CancellationToken::new(), &hash, &data, bart_type::BUDDY_ICON)
        .await
        .expect("insert");

    let id = BartId::new(bart_type::BUDDY_ICON, BartFlags::KNOWN, hash.to_vec());
    srv.send(&alice, upsert(vec![FeedbagItem::bart_icon(30, id.encode())])).await;

    let to_alice = drain(&mut rx_a);
    let SnacBody::OServiceBartReply(bart) = &to_alice[0] else {
        panic!("expected bart reply, got {to_alice:?}");
    };
    assert_eq!(bart.id.flags, BartFlags::CUSTOM);

    // Watchers refetch: the arrival carries the icon reference.
    let to_bob = drain(&mut rx_b);
    assert_eq!(to_bob.len(), 1);
    let SnacBody::BuddyArrived(arrived) = &to_bob[0] else {
        panic!("expected arrival, got {to_bob:?}");
    };
    assert!(arrived.user_info.tlvs.has(tag::BART_INFO));
}

#[tokio::test]
async fn test_bart_clear_icon_skips_lookup() {
    let srv = TestServer::new();
    let (alice, mut rx_a) = srv.login("alice");
    let (bob, mut rx_b) = srv.login("bob");
    srv.send(&bob, upsert(vec![FeedbagItem::buddy("alice", 1, 1)])).await;
    drain(&mut rx_b);

    let id = BartId::new(bart_type::BUDDY_ICON, BartFlags::KNOWN, CLEAR_ICON_HASH.to_vec());
    srv.send(&alice, upsert(vec![FeedbagItem::bart_icon(30, id.encode())])).await;

    let to_alice = drain(&mut rx_a);
    assert!(
        matches!(&to_alice[0], SnacBody::OServiceBartReply(b) if b.id.is_clear_icon()),
        "expected clear-icon reply: {to_alice:?}"
    );
    assert_eq!(drain(&mut rx_b).len(), 1, "peers observe the cleared icon");
}

#[tokio::test]
async fn test_use_populates_initial_presence() {
    let srv = TestServer::new();
    let (_bob, _rx_b) = srv.login("bob");
    let (_carol, _rx_c) = srv.login("carol");
    let (alice, mut rx_a) = srv.login_fresh("alice", None);

    srv.store
        .feedbag_upsert(
            &CancellationToken::new(),
            "alice",
            &[FeedbagItem::buddy("bob", 1, 10), FeedbagItem::buddy("offlineguy", 1, 11)],
        )
        .await
        .expect("upsert");

    srv.send(&alice, FeedbagUse).await;

    assert!(alice.is_signon_complete());
    let bodies = drain(&mut rx_a);
    let arrivals: Vec<&str> = bodies
        .iter()
        .filter_map(|b| match b {
            SnacBody::BuddyArrived(a) => Some(a.user_info.screen_name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(arrivals, vec!["bob"], "only online buddies arrive: {bodies:?}");
}
