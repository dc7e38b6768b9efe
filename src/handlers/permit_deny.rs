// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Permit/deny food group: the pre-feedbag visibility lists.
//!
//! The protocol overloads a single-element list naming the caller
//! themselves to switch global modes: adding yourself to the deny list
//! means "permit everyone", adding yourself to the permit list means
//! "deny everyone". Clients rely on this sentinel; it never mutates the
//! lists.

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::{
    broadcast::BuddyBroadcaster,
    models::{feedbag::PdMode, pd::PdRightsReply, tlv::Tlv},
    store::traits::LocalBuddyListManager,
    session::session::Session,
    utils::{ensure_live, normalize_identifier},
};

const TAG_MAX_PERMITS: u16 = 0x0001;
const TAG_MAX_DENIES: u16 = 0x0002;

const MAX_PERMITS: u16 = 200;
const MAX_DENIES: u16 = 200;

enum ListKind {
    Permit,
    Deny,
}

enum Mutation {
    Add,
    Remove,
}

pub struct PermitDenyService {
    buddy_lists: Arc<dyn LocalBuddyListManager>,
    broadcaster: Arc<BuddyBroadcaster>,
}

impl PermitDenyService {
    pub fn new(
        buddy_lists: Arc<dyn LocalBuddyListManager>,
        broadcaster: Arc<BuddyBroadcaster>,
    ) -> Self {
        Self { buddy_lists, broadcaster }
    }

    pub fn rights_query(&self) -> PdRightsReply {
        let mut reply = PdRightsReply::default();
        reply.tlvs.push(Tlv::u16(TAG_MAX_PERMITS, MAX_PERMITS));
        reply.tlvs.push(Tlv::u16(TAG_MAX_DENIES, MAX_DENIES));
        reply
    }

    pub async fn add_permit_entries(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        users: &[String],
    ) -> Result<()> {
        self.mutate(ctx, sess, users, ListKind::Permit, Mutation::Add).await
    }

    pub async fn del_permit_entries(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        users: &[String],
    ) -> Result<()> {
        self.mutate(ctx, sess, users, ListKind::Permit, Mutation::Remove).await
    }

    pub async fn add_deny_entries(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        users: &[String],
    ) -> Result<()> {
        self.mutate(ctx, sess, users, ListKind::Deny, Mutation::Add).await
    }

    pub async fn del_deny_entries(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        users: &[String],
    ) -> Result<()> {
        self.mutate(ctx, sess, users, ListKind::Deny, Mutation::Remove).await
    }

    async fn mutate(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        users: &[String],
        kind: ListKind,
        mutation: Mutation,
    ) -> Result<()> {
        ensure_live(ctx)?;
        let me = sess.identifier();

        let is_self_sentinel = matches!(mutation, Mutation::Add)
            && users.len() == 1
            && normalize_identifier(&users[0]) == me;

        let mut mutated: Vec<String> = Vec::new();
        if is_self_sentinel {
            let mode = match kind {
                ListKind::Deny => PdMode::PermitAll,
                ListKind::Permit => PdMode::DenyAll,
            };
            self.buddy_lists.set_pd_mode(ctx, me, mode).await?;
        } else {
            if matches!(mutation, Mutation::Add) {
                let mode = match kind {
                    ListKind::Permit => PdMode::PermitSome,
                    ListKind::Deny => PdMode::DenySome,
                };
                self.buddy_lists.set_pd_mode(ctx, me, mode).await?;
            }
            for user in users {
                ensure_live(ctx)?;
                let id = normalize_identifier(user);
                match (&kind, &mutation) {
                    (ListKind::Permit, Mutation::Add) => {
                        self.buddy_lists.permit_buddy(ctx, me, &id).await?;
                    },
                    (ListKind::Permit, Mutation::Remove) => {
                        self.buddy_lists.remove_permit_buddy(ctx, me, &id).await?;
                    },
                    (ListKind::Deny, Mutation::Add) => {
                        self.buddy_lists.deny_buddy(ctx, me, &id).await?;
                    },
                    (ListKind::Deny, Mutation::Remove) => {
                        self.buddy_lists.remove_deny_buddy(ctx, me, &id).await?;
                    },
                }
                mutated.push(id);
            }
        }

        // Before signon-complete, the arrival broadcast at signon covers
        // the change; nothing to recompute yet.
        if sess.is_signon_complete() {
            self.broadcaster
                .broadcast_visibility(ctx, sess, &mutated, true)
                .await?;
        }
        Ok(())
    }
}
