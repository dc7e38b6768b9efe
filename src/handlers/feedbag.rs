// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Feedbag food group: the server-stored buddy list and its per-item side
//! effects on presence.

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    broadcast::BuddyBroadcaster,
    handlers::common::error_body,
    models::{
        bart::{BartFlags, BartId},
        feedbag::{
            ClassId, FeedbagDeleteItem, FeedbagItem, FeedbagQueryIfModified,
            FeedbagReply, FeedbagReplyNotModified, FeedbagRightsReply, FeedbagStatus,
            FeedbagUpsertItem, attr,
        },
        icbm::IcbmChannelMsgToClient,
        oservice::OServiceBartReply,
        parse::SnacBody,
        snac::{ErrorCode, foodgroup},
        tlv::Tlv,
        user_info::TlvUserInfo,
    },
    session::{common::ServerMessage, registry::SessionRegistry, session::Session},
    store::traits::{BartItemManager, FeedbagManager, OfflineMessageManager},
    utils::{ensure_live, normalize_identifier},
};

/// Rights-reply tags.
const TAG_MAX_CLASS_ATTRS: u16 = 0x0002;
const TAG_MAX_ITEMS_BY_CLASS: u16 = 0x0004;

const MAX_CLASS_ATTRS: u16 = 0x00C8;
/// Per-class item maxima, indexed by class id.
const MAX_ITEMS_BY_CLASS: [u16; 8] = [400, 61, 200, 200, 1, 1, 150, 32];

pub struct FeedbagService {
    feedbag: Arc<dyn FeedbagManager>,
    bart: Arc<dyn BartItemManager>,
    offline: Arc<dyn OfflineMessageManager>,
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<BuddyBroadcaster>,
}

impl FeedbagService {
    pub fn new(
        feedbag: Arc<dyn FeedbagManager>,
        bart: Arc<dyn BartItemManager>,
        offline: Arc<dyn OfflineMessageManager>,
        registry: Arc<SessionRegistry>,
        broadcaster: Arc<BuddyBroadcaster>,
    ) -> Self {
        Self { feedbag, bart, offline, registry, broadcaster }
    }

    pub fn rights_query(&self) -> FeedbagRightsReply {
        let by_class: Vec<u8> = MAX_ITEMS_BY_CLASS
            .iter()
            .flat_map(|n| n.to_be_bytes())
            .collect();
        let mut reply = FeedbagRightsReply::default();
        reply.tlvs.push(Tlv::u16(TAG_MAX_CLASS_ATTRS, MAX_CLASS_ATTRS));
        reply.tlvs.push(Tlv::new(TAG_MAX_ITEMS_BY_CLASS, by_class));
        reply
    }

    pub async fn query(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
    ) -> Result<FeedbagReply> {
        let me = sess.identifier();
        Ok(FeedbagReply {
            version: 0,
            items: self.feedbag.feedbag(ctx, me).await?,
            last_update: self.feedbag.feedbag_last_modified(ctx, me).await?,
        })
    }

    /// Full reply only when the stored feedbag is newer than the client's
    /// cached copy.
    pub async fn query_if_modified(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &FeedbagQueryIfModified,
    ) -> Result<SnacBody> {
        let me = sess.identifier();
        let last_modified = self.feedbag.feedbag_last_modified(ctx, me).await?;
        if last_modified <= body.last_update {
            let count = self.feedbag.feedbag(ctx, me).await?.len() as u8;
            return Ok(FeedbagReplyNotModified { last_update: last_modified, count }.into());
        }
        Ok(self.query(ctx, sess).await?.into())
    }

    /// Persists the batch, then walks it in order applying per-class side
    /// effects. A self-block anywhere in the batch refuses the whole batch
    /// before anything is written.
    pub async fn upsert_item(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &FeedbagUpsertItem,
    ) -> Result<SnacBody> {
        let me = sess.identifier();
        let blocks_self = body.items.iter().any(|item| {
            item.class() == ClassId::Deny && normalize_identifier(&item.name) == me
        });
        if blocks_self {
            return Ok(error_body(foodgroup::FEEDBAG, ErrorCode::NotSupportedByHost));
        }

        self.feedbag.feedbag_upsert(ctx, me, &body.items).await?;

        for item in &body.items {
            ensure_live(ctx)?;
            match item.class() {
                ClassId::Buddy => {
                    let buddy = normalize_identifier(&item.name);
                    if let Some(buddy_sess) = self.registry.retrieve(&buddy) {
                        self.broadcaster.unicast_arrival(ctx, &buddy_sess, sess).await?;
                    }
                },
                ClassId::Deny => {
                    let them = normalize_identifier(&item.name);
                    if let Some(them_sess) = self.registry.retrieve(&them)
                        && !sess.is_invisible()
                    {
                        // Block while both online: each side sees the other
                        // depart, exactly once.
                        self.broadcaster.unicast_departure(ctx, sess, &them_sess).await?;
                        self.broadcaster.unicast_departure(ctx, &them_sess, sess).await?;
                    }
                },
                ClassId::Bart => {
                    self.apply_bart_item(ctx, sess, item).await?;
                },
                _ => {},
            }
        }

        Ok(FeedbagStatus::success(body.items.len()).into())
    }

    /// Feedbag icon reference changed. Known hashes go live immediately;
    /// unknown ones ask the client to upload first.
    async fn apply_bart_item(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        item: &FeedbagItem,
    ) -> Result<()> {
        let Some(tlv) = item.attributes.first(attr::BART_INFO) else {
            return Ok(());
        };
        let Ok(mut id) = BartId::decode(tlv.value.clone()) else {
            debug!(identifier = %sess.identifier(), "undecodable bart attribute, passing through");
            return Ok(());
        };

        if id.is_clear_icon() {
            id.flags = BartFlags::KNOWN;
            sess.set_bart_icon(Some(id.clone()));
            sess.relay(ServerMessage::notification(OServiceBartReply { id }));
            self.broadcaster.broadcast_arrival(ctx, sess).await?;
            return Ok(());
        }

        if self.bart.bart_item_exists(ctx, &id.hash).await? {
            id.flags = BartFlags::CUSTOM;
            sess.set_bart_icon(Some(id.clone()));
            sess.relay(ServerMessage::notification(OServiceBartReply { id }));
            self.broadcaster.broadcast_arrival(ctx, sess).await?;
        } else {
            id.flags = BartFlags::CUSTOM | BartFlags::UNKNOWN;
            sess.relay(ServerMessage::notification(OServiceBartReply { id }));
        }
        Ok(())
    }

    pub async fn delete_item(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &FeedbagDeleteItem,
    ) -> Result<SnacBody> {
        let me = sess.identifier();
        self.feedbag.feedbag_delete(ctx, me, &body.items).await?;

        for item in &body.items {
            ensure_live(ctx)?;
            if item.class() != ClassId::Deny {
                continue;
            }
            let them = normalize_identifier(&item.name);
            if let Some(them_sess) = self.registry.retrieve(&them)
                && !sess.is_invisible()
            {
                // Unblock while both online: mutual arrival, exactly once
                // per direction. An invisible unblocker stays silent.
                self.broadcaster.unicast_arrival(ctx, sess, &them_sess).await?;
                self.broadcaster.unicast_arrival(ctx, &them_sess, sess).await?;
            }
        }

        Ok(FeedbagStatus::success(body.items.len()).into())
    }

    /// Signon-complete hook: populate the client's initial presence view,
    /// announce the arrival to watchers, and flush any queued offline
    /// messages.
    pub async fn use_feedbag(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
    ) -> Result<()> {
        let me = sess.identifier();
        let first = sess.mark_signon_complete();

        for buddy in self.feedbag.buddies(ctx, me).await? {
            ensure_live(ctx)?;
            if let Some(buddy_sess) = self.registry.retrieve(&buddy) {
                self.broadcaster.unicast_arrival(ctx, &buddy_sess, sess).await?;
            }
        }

        if first {
            self.broadcaster.broadcast_arrival(ctx, sess).await?;
            self.deliver_offline_messages(ctx, sess).await?;
        }
        Ok(())
    }

    async fn deliver_offline_messages(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
    ) -> Result<()> {
        let me = sess.identifier();
        let queued = self.offline.load_messages(ctx, me).await?;
        if queued.is_empty() {
            return Ok(());
        }

        debug!(identifier = %me, count = queued.len(), "delivering queued offline messages");
        for stored in &queued {
            let sender = self
                .registry
                .retrieve(&stored.sender)
                .map(|s| s.user_info())
                .unwrap_or_else(|| TlvUserInfo::bare(&stored.sender));
            sess.relay(ServerMessage::notification(IcbmChannelMsgToClient {
                cookie: stored.message.cookie,
                channel: stored.message.channel,
                sender,
                tlvs: crate::handlers::icbm::forward_tlvs(&stored.message.tlvs),
            }));
        }
        self.offline.delete_messages(ctx, me).await
    }
}
