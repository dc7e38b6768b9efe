// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use anyhow::{Context, Result};
use oscar_server_rs::{
    broadcast::BuddyBroadcaster,
    cfg::{cli::resolve_config_path, config::Config, logger::init_logger},
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
        feedbag::FeedbagItem,
        parse::SnacBody,
        snac::{SnacFrame, foodgroup, subgroup},
    },
    relationship::RelationshipEngine,
    session::{registry::SessionRegistry, session::Session},
    store::memory::MemoryStore,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Smoke driver: wires the food-group core against the in-memory store and
/// walks two local sessions through a signon + buddy add. The network
/// transport mounts the same `Dispatcher`.
#[tokio::main]
async fn main() -> Result<()> {
    let _init_logger = init_logger("tests/config_logger.yaml")?;

    let cfg = resolve_config_path("tests/config.yaml")
        .and_then(Config::load_from_file)
        .context("failed to resolve or load config")?;

    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let relationships = Arc::new(RelationshipEngine::new(store.clone(), store.clone()));
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

    let ctx = CancellationToken::new();
    let depth = cfg.limits.session_queue_depth;
    let replace = cfg.server.replace_existing_sessions;

    let (alice, _alice_rx) = Session::new("alice", None, depth);
    let (bob, mut bob_rx) = Session::new("bob", None, depth);
    registry.insert(alice.clone(), replace)?;
    registry.insert(bob.clone(), replace)?;
    store.upsert_user("alice");
    store.upsert_user("bob");

    for sess in [&alice, &bob] {
        dispatcher
            .dispatch(
                &ctx,
                sess,
                SnacFrame::new(foodgroup::FEEDBAG, subgroup::feedbag::USE, 1),
                SnacBody::from(oscar_server_rs::models::feedbag::FeedbagUse),
            )
            .await?;
    }

    let replies = dispatcher
        .dispatch(
            &ctx,
            &bob,
            SnacFrame::new(foodgroup::FEEDBAG, subgroup::feedbag::INSERT_ITEM, 2),
            SnacBody::from(oscar_server_rs::models::feedbag::FeedbagUpsertItem {
                items: vec![FeedbagItem::buddy("alice", 1, 1)],
            }),
        )
        .await?;
    info!(replies = replies.len(), "bob added alice");

    while let Ok(msg) = bob_rx.try_recv() {
        info!(?msg, "bob received");
    }

    info!(bind = %cfg.server.bind_address, "core ready; mount a transport to serve clients");
    Ok(())
}
