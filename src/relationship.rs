// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Derived relationship state between ordered pairs of users.
//!
//! Two list mechanisms coexist: the feedbag's deny/permit rows plus its
//! PDInfo mode, and the older permit/deny food group's lists. Neither
//! overrides the other; a user is visible only when both subsystems allow
//! it. Relationships are recomputed on demand and never cached past a
//! single handler.

use std::{collections::BTreeSet, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    models::feedbag::PdMode,
    store::traits::{FeedbagManager, LocalBuddyListManager},
};

/// Derived state for the ordered pair `(me, them)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationship {
    /// The peer's identifier.
    pub identifier: String,
    /// I hide them: they are on my deny side of either subsystem.
    pub you_block: bool,
    /// They hide me.
    pub blocks_you: bool,
    pub is_on_your_list: bool,
    pub is_on_their_list: bool,
}

impl Relationship {
    /// Neither side blocks; presence may flow in both directions.
    pub fn mutually_visible(&self) -> bool {
        !self.you_block && !self.blocks_you
    }
}

/// Computes [`Relationship`]s for the service layer and the buddy-update
/// broadcaster.
#[async_trait]
pub trait RelationshipFetcher: Send + Sync {
    async fn relationship(
        &self,
        ctx: &CancellationToken,
        me: &str,
        them: &str,
    ) -> Result<Relationship>;

    /// Relationships with every peer in `filter`, or with me's combined
    /// buddy/permit/deny universe (both directions) when `filter` is
    /// empty.
    async fn all_relationships(
        &self,
        ctx: &CancellationToken,
        me: &str,
        filter: &[String],
    ) -> Result<Vec<Relationship>>;
}

pub struct RelationshipEngine {
    feedbag: Arc<dyn FeedbagManager>,
    buddy_lists: Arc<dyn LocalBuddyListManager>,
}

impl RelationshipEngine {
    pub fn new(
        feedbag: Arc<dyn FeedbagManager>,
        buddy_lists: Arc<dyn LocalBuddyListManager>,
    ) -> Self {
        Self { feedbag, buddy_lists }
    }

    /// Permit-deny-subsystem verdict: does `me` hide `them`?
    async fn pd_blocks(
        &self,
        ctx: &CancellationToken,
        me: &str,
        them: &str,
    ) -> Result<bool> {
        if self
            .buddy_lists
            .deny_list(ctx, me)
            .await?
            .iter()
            .any(|b| b == them)
        {
            return Ok(true);
        }
        Ok(match self.buddy_lists.pd_mode(ctx, me).await? {
            PdMode::PermitAll | PdMode::DenySome => false,
            PdMode::DenyAll => true,
            PdMode::PermitSome => !self
                .buddy_lists
                .permit_list(ctx, me)
                .await?
                .iter()
                .any(|b| b == them),
        })
    }
}

#[async_trait]
impl RelationshipFetcher for RelationshipEngine {
    async fn relationship(
        &self,
        ctx: &CancellationToken,
        me: &str,
        them: &str,
    ) -> Result<Relationship> {
        let feedbag_state = self.feedbag.blocked_state(ctx, me, them).await?;
        let you_block = feedbag_state.a_blocks_b || self.pd_blocks(ctx, me, them).await?;
        let blocks_you = feedbag_state.b_blocks_a || self.pd_blocks(ctx, them, me).await?;

        Ok(Relationship {
            identifier: them.to_owned(),
            you_block,
            blocks_you,
            is_on_your_list: self.feedbag.buddies(ctx, me).await?.iter().any(|b| b == them),
            is_on_their_list: self
                .feedbag
                .buddies(ctx, them)
                .await?
                .iter()
                .any(|b| b == me),
        })
    }

    async fn all_relationships(
        &self,
        ctx: &CancellationToken,
        me: &str,
        filter: &[String],
    ) -> Result<Vec<Relationship>> {
        let universe: BTreeSet<String> = if filter.is_empty() {
            let mut peers: BTreeSet<String> = self
                .feedbag
                .adjacent_users(ctx, me)
                .await?
                .into_iter()
                .collect();
            peers.extend(self.feedbag.buddies(ctx, me).await?);
            peers.extend(self.buddy_lists.permit_list(ctx, me).await?);
            peers.extend(self.buddy_lists.deny_list(ctx, me).await?);
            peers
        } else {
            filter.iter().cloned().collect()
        };

        let mut relationships = Vec::with_capacity(universe.len());
        for them in universe {
            if them == me {
                continue;
            }
            relationships.push(self.relationship(ctx, me, &them).await?);
        }
        Ok(relationships)
    }
}
