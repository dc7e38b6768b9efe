// SPDX-License-Identifier: AGPL-3.0-or-later GPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! End-to-end walks through the server's observable behavior, one client
//! action at a time.

use bytes::Bytes;
use oscar_server_rs::{
    models::{
        bart::{BartFlags, BartId, bart_type, hash_item},
        feedbag::{FeedbagItem, FeedbagUpsertItem},
        icbm::{IcbmChannelMsgToHost, IcbmEvilRequest, channel, tag},
        locate::LocateUserInfoQuery,
        parse::SnacBody,
        snac::ErrorCode,
        tlv::{Tlv, TlvBlock},
        user_info::tag as info_tag,
    },
    store::traits::OfflineMessageManager,
};
use serial_test::serial;
use tokio_util::sync::CancellationToken;

use super::harness::{Server, drain, single_reply};

#[tokio::test]
#[serial]
async fn test_add_buddy_arrival() {
    let srv = Server::start();
    let (alice, mut rx_a) = srv.signon("alice").await;
    let (_bob, _rx_b) = srv.signon("bob").await;

    let reply = single_reply(
        srv.send(
            &alice,
            FeedbagUpsertItem { items: vec![FeedbagItem::buddy("bob", 1, 10)] },
        )
        .await,
    );
    let SnacBody::FeedbagStatus(status) = reply else {
        panic!("expected status, got {reply:?}");
    };
    assert_eq!(status.results, vec![0x0000]);

    let bodies = drain(&mut rx_a);
    assert_eq!(bodies.len(), 1, "exactly one arrival: {bodies:?}");
    assert!(
        matches!(&bodies[0], SnacBody::BuddyArrived(a) if a.user_info.screen_name == "bob")
    );
}

#[tokio::test]
#[serial]
async fn test_blocked_user_info_query() {
    let srv = Server::start();
    let (alice, _rx_a) = srv.signon("alice").await;
    let (bob, _rx_b) = srv.signon("bob").await;

    srv.send(
        &bob,
        FeedbagUpsertItem { items: vec![FeedbagItem::deny("alice", 20)] },
    )
    .await;

    let reply = single_reply(
        srv.send(
            &alice,
            LocateUserInfoQuery { locate_type: 0, screen_name: "bob".to_owned() },
        )
        .await,
    );
    assert!(
        matches!(&reply, SnacBody::LocateErr(e) if e.code == u16::from(ErrorCode::NotLoggedOn)),
        "blocked lookups must not reveal presence: {reply:?}"
    );
}

#[tokio::test]
#[serial]
async fn test_im_with_host_ack() {
    let srv = Server::start();
    let (alice, _rx_a) = srv.signon("alice").await;
    let (_bob, mut rx_b) = srv.signon("bob").await;

    let msg = IcbmChannelMsgToHost {
        cookie: [7; 8],
        channel: channel::IM,
        screen_name: "bob".to_owned(),
        tlvs: TlvBlock::new()
            .with(Tlv::new(tag::DATA, &[0x01u8, 0x02, 0x03, 0x04][..]))
            .with(Tlv::empty(tag::REQUEST_HOST_ACK)),
    };
    let reply = single_reply(srv.send(&alice, msg).await);
    let SnacBody::IcbmHostAck(ack) = reply else {
        panic!("expected host ack, got {reply:?}");
    };
    assert_eq!(ack.channel, channel::IM);
    assert_eq!(ack.screen_name, "bob");

    let bodies = drain(&mut rx_b);
    let SnacBody::IcbmChannelMsgToClient(delivered) = &bodies[0] else {
        panic!("expected delivery, got {bodies:?}");
    };
    assert_eq!(delivered.sender.screen_name, "alice");
    assert_eq!(
        delivered.tlvs.first(tag::DATA).map(|t| t.value.as_ref()),
        Some(&[0x01u8, 0x02, 0x03, 0x04][..])
    );
}

#[tokio::test]
#[serial]
async fn test_anonymous_warning_propagates() {
    let srv = Server::start();
    let (alice, _rx_a) = srv.signon("alice").await;
    let (bob, mut rx_b) = srv.signon("bob").await;
    let (carol, mut rx_c) = srv.signon("carol").await;

    // Carol watches bob and should observe his warning level change.
    srv.send(
        &carol,
        FeedbagUpsertItem { items: vec![FeedbagItem::buddy("bob", 1, 10)] },
    )
    .await;
    drain(&mut rx_c);

    let reply = single_reply(
        srv.send(&alice, IcbmEvilRequest { send_as: 1, screen_name: "bob".to_owned() })
            .await,
    );
    let SnacBody::IcbmEvilReply(evil) = reply else {
        panic!("expected evil reply, got {reply:?}");
    };
    assert_eq!(evil.evil_delta_applied, 30);
    assert_eq!(evil.updated_evil_value, 30);

    let to_bob = drain(&mut rx_b);
    assert!(
        matches!(&to_bob[0], SnacBody::OServiceEvilNotification(n) if n.new_evil == 30 && n.snitcher.is_none()),
        "got {to_bob:?}"
    );

    let to_carol = drain(&mut rx_c);
    assert!(
        matches!(&to_carol[0], SnacBody::BuddyArrived(a) if a.user_info.warning_level == 30),
        "watchers observe the raised warning: {to_carol:?}"
    );

    assert_eq!(bob.warning_level(), 30);
}

#[tokio::test]
#[serial]
async fn test_offline_icq_message_stored() {
    let srv = Server::start();
    let (sender, _rx) = srv.signon("11111111").await;

    let msg = IcbmChannelMsgToHost {
        cookie: [9; 8],
        channel: channel::IM,
        screen_name: "22222222".to_owned(),
        tlvs: TlvBlock::new()
            .with(Tlv::new(tag::DATA, &b"see you later"[..]))
            .with(Tlv::empty(tag::STORE)),
    };
    let reply = single_reply(srv.send(&sender, msg).await);
    assert!(
        matches!(&reply, SnacBody::IcbmErr(e) if e.code == u16::from(ErrorCode::NotLoggedOn)),
        "got {reply:?}"
    );

    let queued = srv
        .store
        .load_messages(&CancellationToken::new(), "22222222")
        .await
        .expect("load");
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].sender, "11111111");
    assert_eq!(queued[0].recipient, "22222222");
    assert!(queued[0].sent.timestamp() > 0);
}

#[tokio::test]
#[serial]
async fn test_bart_upload_refreshes_peers() {
    let srv = Server::start();
    let (alice, mut rx_a) = srv.signon("alice").await;
    let (bob, mut rx_b) = srv.signon("bob").await;

    srv.send(
        &bob,
        FeedbagUpsertItem { items: vec![FeedbagItem::buddy("alice", 1, 10)] },
    )
    .await;
    drain(&mut rx_b);

    let icon = Bytes::from_static(b"gif bytes of a tiny icon");
    let hash = hash_item(&icon);

    let reply = single_reply(
        srv.send(
            &alice,
            oscar_server_rs::models::bart::BartUploadQuery {
                bart_type: bart_type::BUDDY_ICON,
                data: icon,
            },
        )
        .await,
    );
    let SnacBody::BartUploadReply(upload) = reply else {
        panic!("expected upload reply, got {reply:?}");
    };
    assert_eq!(upload.id.hash.as_ref(), hash.as_slice());

    // The upload alone announces alice once.
    let to_bob = drain(&mut rx_b);
    assert!(matches!(&to_bob[0], SnacBody::BuddyArrived(_)), "got {to_bob:?}");

    // Referencing the now-known hash from the feedbag puts the icon into
    // alice's presence snapshot.
    let id = BartId::new(bart_type::BUDDY_ICON, BartFlags::KNOWN, hash.to_vec());
    srv.send(
        &alice,
        FeedbagUpsertItem { items: vec![FeedbagItem::bart_icon(30, id.encode())] },
    )
    .await;
    drain(&mut rx_a);

    let to_bob = drain(&mut rx_b);
    let SnacBody::BuddyArrived(arrived) = &to_bob[0] else {
        panic!("expected arrival, got {to_bob:?}");
    };
    let icon_ref = arrived
        .user_info
        .tlvs
        .first(info_tag::BART_INFO)
        .expect("icon reference in user info");
    let id = BartId::decode(icon_ref.value.clone()).expect("decode icon reference");
    assert_eq!(id.hash.as_ref(), hash.as_slice());
    assert_eq!(id.flags, BartFlags::CUSTOM);
}
