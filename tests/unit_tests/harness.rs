// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Shared wiring for service-level tests: the full dispatcher mounted on
//! the in-memory store, with real sessions and bounded queues.

use std::{net::SocketAddr, sync::Arc};

use oscar_server_rs::{
    broadcast::BuddyBroadcaster,
    handlers::{
        Dispatcher,
        bart::BartService,
        buddy::{BuddyService, StatsService},
        feedbag::FeedbagService,
        icbm::IcbmService,
        locate::LocateService,
        permit_deny::PermitDenyService,
    },
    models::{
        parse::{SnacBody, SnacInfo},
        snac::SnacFrame,
    },
    relationship::RelationshipEngine,
    session::{common::ServerMessage, registry::SessionRegistry, session::Session},
    store::memory::MemoryStore,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const QUEUE_DEPTH: usize = 64;
pub const REQUEST_ID: u32 = 0x0000_1234;

pub struct TestServer {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<SessionRegistry>,
    pub dispatcher: Dispatcher,
    pub ctx: CancellationToken,
}

impl TestServer {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(SessionRegistry::new());
        let relationships: Arc<RelationshipEngine> =
            Arc::new(RelationshipEngine::new(store.clone(), store.clone()));
        let broadcaster =
            Arc::new(BuddyBroadcaster::new(registry.clone(), relationships.clone()));

        let dispatcher = Dispatcher {
            locate: LocateService::new(
                store.clone(),
                relationships.clone(),
                registry.clone(),
                broadcaster.clone(),
            ),
            buddy: BuddyService,
            icbm: IcbmService::new(
                registry.clone(),
                relationships.clone(),
                store.clone(),
                broadcaster.clone(),
            ),
            permit_deny: PermitDenyService::new(store.clone(), broadcaster.clone()),
            stats: StatsService,
            bart: BartService::new(store.clone(), broadcaster.clone()),
            feedbag: FeedbagService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                registry.clone(),
                broadcaster.clone(),
            ),
        };

        Self { store, registry, dispatcher, ctx: CancellationToken::new() }
    }

    /// Signs a user on with signon already complete, the steady state most
    /// tests exercise.
    pub fn login(&self, name: &str) -> (Arc<Session>, mpsc::Receiver<ServerMessage>) {
        let (sess, rx) = self.login_fresh(name, None);
        sess.mark_signon_complete();
        (sess, rx)
    }

    pub fn login_fresh(
        &self,
        name: &str,
        addr: Option<SocketAddr>,
    ) -> (Arc<Session>, mpsc::Receiver<ServerMessage>) {
        let (sess, rx) = Session::new(name, addr, QUEUE_DEPTH);
        self.registry.insert(sess.clone(), false).expect("duplicate login in test");
        self.store.upsert_user(name);
        (sess, rx)
    }

    /// Routes `body` as `sess`'s request and returns the replies.
    pub async fn send(
        &self,
        sess: &Arc<Session>,
        body: impl Into<SnacBody>,
    ) -> Vec<ServerMessage> {
        let body = body.into();
        let frame = SnacFrame::new(body.foodgroup(), body.subgroup(), REQUEST_ID);
        self.dispatcher
            .dispatch(&self.ctx, sess, frame, body)
            .await
            .expect("dispatch failed")
    }
}

/// Drains everything currently queued for a session.
pub fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<SnacBody> {
    let mut bodies = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let Some(body) = msg.body() {
            bodies.push(body.clone());
        }
    }
    bodies
}

/// The single reply body of a request expected to produce exactly one.
pub fn single_reply(mut replies: Vec<ServerMessage>) -> SnacBody {
    assert_eq!(replies.len(), 1, "expected exactly one reply: {replies:?}");
    match replies.remove(0) {
        ServerMessage::Snac { frame, body } => {
            assert_eq!(frame.request_id.get(), REQUEST_ID);
            body
        },
        ServerMessage::Kick(reason) => panic!("expected snac reply, got kick {reason:?}"),
    }
}
