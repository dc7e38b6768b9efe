// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Single writer for presence fan-out. Every arrival/departure a peer
//! observes goes through here; individual services never construct buddy
//! notifications themselves.
//!
//! The subject session's fan-out lock is held across recipient enumeration
//! and enqueue, so for any `(subject, receiver)` pair notifications land in
//! causal order. Receivers are never awaited; relays enqueue into bounded
//! per-session buffers.

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    models::{
        buddy::{BuddyArrived, BuddyDeparted},
        user_info::TlvUserInfo,
    },
    relationship::RelationshipFetcher,
    session::{common::ServerMessage, registry::SessionRegistry, session::Session},
    utils::ensure_live,
};

pub struct BuddyBroadcaster {
    registry: Arc<SessionRegistry>,
    relationships: Arc<dyn RelationshipFetcher>,
}

fn arrival(user_info: TlvUserInfo) -> ServerMessage {
    ServerMessage::notification(BuddyArrived { user_info })
}

fn departure(screen_name: &str) -> ServerMessage {
    ServerMessage::notification(BuddyDeparted {
        user_info: TlvUserInfo::bare(screen_name),
    })
}

impl BuddyBroadcaster {
    pub fn new(
        registry: Arc<SessionRegistry>,
        relationships: Arc<dyn RelationshipFetcher>,
    ) -> Self {
        Self { registry, relationships }
    }

    /// `sess` just became (or re-became) visible: login, un-away, away
    /// text change, icon change, capability change, warning change. Every
    /// online peer allowed to see them gets an arrival with the current
    /// snapshot.
    pub async fn broadcast_arrival(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
    ) -> Result<()> {
        ensure_live(ctx)?;
        if sess.is_invisible() {
            // Invisible sessions emit nothing; they still see others.
            return Ok(());
        }

        let _fanout = sess.fanout_lock().lock().await;
        let info = sess.user_info();
        let rels = self
            .relationships
            .all_relationships(ctx, sess.identifier(), &[])
            .await?;

        let mut receivers = 0usize;
        for rel in rels {
            ensure_live(ctx)?;
            if !rel.mutually_visible() {
                continue;
            }
            if self.registry.is_online(&rel.identifier) {
                self.registry
                    .relay_to_identifier(&rel.identifier, arrival(info.clone()));
                receivers += 1;
            }
        }
        debug!(subject = %sess.identifier(), receivers, "broadcast arrival");
        Ok(())
    }

    /// Logout counterpart of [`Self::broadcast_arrival`].
    pub async fn broadcast_departure(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
    ) -> Result<()> {
        ensure_live(ctx)?;
        if sess.is_invisible() {
            return Ok(());
        }

        let _fanout = sess.fanout_lock().lock().await;
        let rels = self
            .relationships
            .all_relationships(ctx, sess.identifier(), &[])
            .await?;
        for rel in rels {
            ensure_live(ctx)?;
            if rel.mutually_visible() {
                self.registry
                    .relay_to_identifier(&rel.identifier, departure(sess.display_name()));
            }
        }
        Ok(())
    }

    /// Tells `to` that `from` is here, respecting visibility in both
    /// directions and `from`'s invisibility.
    pub async fn unicast_arrival(
        &self,
        ctx: &CancellationToken,
        from: &Arc<Session>,
        to: &Arc<Session>,
    ) -> Result<()> {
        ensure_live(ctx)?;
        if from.is_invisible() {
            return Ok(());
        }

        let _fanout = from.fanout_lock().lock().await;
        let rel = self
            .relationships
            .relationship(ctx, from.identifier(), to.identifier())
            .await?;
        if rel.mutually_visible() {
            to.relay(arrival(from.user_info()));
        }
        Ok(())
    }

    /// Tells `to` that `from` is gone. Departures carry identity only and
    /// are sent regardless of the current relationship: blocking a peer
    /// produces exactly this message.
    pub async fn unicast_departure(
        &self,
        ctx: &CancellationToken,
        from: &Arc<Session>,
        to: &Arc<Session>,
    ) -> Result<()> {
        ensure_live(ctx)?;
        let _fanout = from.fanout_lock().lock().await;
        to.relay(departure(from.display_name()));
        Ok(())
    }

    /// Recomputes visibility between `sess` and the peers in `filter` (or
    /// everyone related when empty): arrivals to peers who may now see
    /// them, departures to peers who no longer may. With `bidirectional`,
    /// symmetric notifications about those peers flow back to `sess`.
    pub async fn broadcast_visibility(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        filter: &[String],
        bidirectional: bool,
    ) -> Result<()> {
        ensure_live(ctx)?;
        let _fanout = sess.fanout_lock().lock().await;
        let info = sess.user_info();
        let rels = self
            .relationships
            .all_relationships(ctx, sess.identifier(), filter)
            .await?;

        for rel in rels {
            ensure_live(ctx)?;
            let Some(peer) = self.registry.retrieve(&rel.identifier) else {
                continue;
            };

            if rel.mutually_visible() && !sess.is_invisible() {
                peer.relay(arrival(info.clone()));
            } else {
                peer.relay(departure(sess.display_name()));
            }

            if bidirectional {
                if rel.mutually_visible() && !peer.is_invisible() {
                    sess.relay(arrival(peer.user_info()));
                } else {
                    sess.relay(departure(peer.display_name()));
                }
            }
        }
        Ok(())
    }
}
