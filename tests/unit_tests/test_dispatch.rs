// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use oscar_server_rs::models::{
    buddy::BuddyRightsQuery,
    feedbag::{FeedbagEndCluster, FeedbagStartCluster},
    oservice::OServiceIdleNotification,
    parse::SnacBody,
    snac::{ErrorCode, SnacFrame, foodgroup},
    stats::StatsReportEvents,
    user_info::tag,
};
use oscar_server_rs::session::common::ServerMessage;

use super::harness::{REQUEST_ID, TestServer, single_reply};

#[tokio::test]
async fn test_reply_echoes_request_id() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    let replies = srv.send(&alice, BuddyRightsQuery::default()).await;
    let ServerMessage::Snac { frame, body } = &replies[0] else {
        panic!("expected snac reply");
    };
    assert_eq!(frame.request_id.get(), REQUEST_ID);
    assert_eq!(frame.foodgroup.get(), foodgroup::BUDDY);
    assert!(matches!(body, SnacBody::BuddyRightsReply(_)));
}

#[tokio::test]
async fn test_stats_report_is_acked() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    let reply = single_reply(srv.send(&alice, StatsReportEvents::default()).await);
    assert!(matches!(reply, SnacBody::StatsReportAck(_)));
}

#[tokio::test]
async fn test_cluster_brackets_are_accepted_silently() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    assert!(srv.send(&alice, FeedbagStartCluster::default()).await.is_empty());
    assert!(srv.send(&alice, FeedbagEndCluster).await.is_empty());
}

#[tokio::test]
async fn test_misrouted_body_answers_on_the_frames_error_subgroup() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    // A buddy-group frame carrying a stats body cannot be routed.
    let frame = SnacFrame::new(foodgroup::BUDDY, 0x7F, REQUEST_ID);
    let replies = srv
        .dispatcher
        .dispatch(&srv.ctx, &alice, frame, StatsReportEvents::default().into())
        .await
        .expect("dispatch failed");

    let reply = single_reply(replies);
    assert!(
        matches!(&reply, SnacBody::BuddyErr(e) if e.code == u16::from(ErrorCode::InvalidSnac)),
        "got {reply:?}"
    );
}

#[tokio::test]
async fn test_unknown_foodgroup_falls_back_to_oservice_error() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    let frame = SnacFrame::new(0x0E, 0x02, REQUEST_ID);
    let replies = srv
        .dispatcher
        .dispatch(&srv.ctx, &alice, frame, StatsReportEvents::default().into())
        .await
        .expect("dispatch failed");

    let reply = single_reply(replies);
    assert!(matches!(&reply, SnacBody::OServiceErr(_)), "got {reply:?}");
}

#[tokio::test]
async fn test_idle_notification_tracks_idle_time() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    srv.send(&alice, OServiceIdleNotification { idle_time: 600 }).await;
    let info = alice.user_info();
    let minutes = info
        .tlvs
        .first(tag::IDLE_TIME)
        .and_then(oscar_server_rs::models::tlv::Tlv::value_u16)
        .expect("idle tlv");
    assert!(minutes >= 10, "600s of idle is at least 10 minutes, got {minutes}");

    srv.send(&alice, OServiceIdleNotification { idle_time: 0 }).await;
    assert!(!alice.user_info().tlvs.has(tag::IDLE_TIME));
}

#[tokio::test]
async fn test_cancelled_context_aborts_dispatch() {
    let srv = TestServer::new();
    let (alice, _rx) = srv.login("alice");

    srv.ctx.cancel();
    let frame = SnacFrame::new(foodgroup::BUDDY, 0x02, REQUEST_ID);
    let result = srv
        .dispatcher
        .dispatch(&srv.ctx, &alice, frame, BuddyRightsQuery::default().into())
        .await;
    assert!(result.is_err());
}
