// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! ICBM food group: message delivery, typing events, warning requests and
//! rendezvous relay.

use std::{net::IpAddr, sync::Arc};

use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    broadcast::BuddyBroadcaster,
    handlers::common::error_body,
    models::{
        icbm::{
            IcbmChannelMsgToClient, IcbmChannelMsgToHost, IcbmClientErr,
            IcbmClientEvent, IcbmEvilReply, IcbmEvilRequest, IcbmHostAck,
            IcbmParameterReply, Rendezvous, channel, rendezvous_kind, rendezvous_tag,
            tag,
        },
        oservice::OServiceEvilNotification,
        parse::SnacBody,
        snac::{ErrorCode, foodgroup},
        tlv::{Tlv, TlvBlock},
        user_info::{CAP_DIRECT_CONNECT, CAP_SEND_FILE},
    },
    relationship::RelationshipFetcher,
    session::{common::ServerMessage, registry::SessionRegistry, session::Session},
    store::traits::{OfflineMessage, OfflineMessageManager},
    utils::normalize_identifier,
};

/// Warning applied by an anonymous request.
const EVIL_DELTA_ANONYMOUS: u16 = 30;
/// Base warning for an identified request, before sender-level scaling.
const EVIL_DELTA_IDENTIFIED: u32 = 100;

/// Body TLVs forwarded from submission to delivery: the payload itself,
/// plus an empty want-events marker when the sender asked for typing
/// events. Host-only tags (ack request, offline store) stay behind.
pub(crate) fn forward_tlvs(inbound: &TlvBlock) -> TlvBlock {
    let mut out = TlvBlock::new();
    for t in [tag::DATA, tag::RENDEZVOUS] {
        if let Some(tlv) = inbound.first(t) {
            out.push(tlv.clone());
        }
    }
    if inbound.has(tag::WANT_EVENTS) {
        out.push(Tlv::empty(tag::WANT_EVENTS));
    }
    out
}

pub struct IcbmService {
    registry: Arc<SessionRegistry>,
    relationships: Arc<dyn RelationshipFetcher>,
    offline: Arc<dyn OfflineMessageManager>,
    broadcaster: Arc<BuddyBroadcaster>,
}

impl IcbmService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        relationships: Arc<dyn RelationshipFetcher>,
        offline: Arc<dyn OfflineMessageManager>,
        broadcaster: Arc<BuddyBroadcaster>,
    ) -> Self {
        Self { registry, relationships, offline, broadcaster }
    }

    pub fn parameter_reply(&self) -> IcbmParameterReply {
        IcbmParameterReply {
            max_slots: 100,
            icbm_flags: 3,
            max_incoming_icbm_len: 512,
            max_source_evil: 999,
            max_destination_evil: 999,
            min_inter_icbm_interval: 0,
        }
    }

    /// Deliver a message to its recipient, or queue it for an offline ICQ
    /// recipient that asked for storage.
    pub async fn channel_msg_to_host(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &IcbmChannelMsgToHost,
    ) -> Result<Option<SnacBody>> {
        let me = sess.identifier();
        let them = normalize_identifier(&body.screen_name);

        let rel = self.relationships.relationship(ctx, me, &them).await?;
        if rel.you_block {
            return Ok(Some(error_body(foodgroup::ICBM, ErrorCode::InLocalPermitDeny)));
        }
        if rel.blocks_you {
            return Ok(Some(error_body(foodgroup::ICBM, ErrorCode::NotLoggedOn)));
        }

        let Some(recipient) = self.registry.retrieve(&them) else {
            if body.tlvs.has(tag::STORE) {
                self.offline
                    .save_message(ctx, OfflineMessage {
                        sender: me.to_owned(),
                        recipient: them,
                        sent: Utc::now(),
                        message: body.clone(),
                    })
                    .await?;
            }
            return Ok(Some(error_body(foodgroup::ICBM, ErrorCode::NotLoggedOn)));
        };

        let mut tlvs = forward_tlvs(&body.tlvs);
        if body.channel == channel::RENDEZVOUS
            && self.rewrite_rendezvous(sess, &mut tlvs).is_err()
        {
            return Ok(Some(error_body(foodgroup::ICBM, ErrorCode::InvalidSnac)));
        }

        recipient.relay(ServerMessage::notification(IcbmChannelMsgToClient {
            cookie: body.cookie,
            channel: body.channel,
            sender: sess.user_info(),
            tlvs,
        }));

        if body.tlvs.has(tag::REQUEST_HOST_ACK) {
            return Ok(Some(
                IcbmHostAck {
                    cookie: body.cookie,
                    channel: body.channel,
                    screen_name: body.screen_name.clone(),
                }
                .into(),
            ));
        }
        Ok(None)
    }

    /// On a file-transfer propose, overwrite the requester address with the
    /// one the server observed and append a verified copy, so peers behind
    /// NAT exchange a routable address.
    fn rewrite_rendezvous(&self, sess: &Arc<Session>, tlvs: &mut TlvBlock) -> Result<()> {
        let Some(raw) = tlvs.first(tag::RENDEZVOUS) else {
            return Ok(());
        };
        let mut rdv = Rendezvous::decode(raw.value.clone())?;
        if rdv.kind != rendezvous_kind::PROPOSE
            || !(rdv.capability == CAP_SEND_FILE || rdv.capability == CAP_DIRECT_CONNECT)
        {
            return Ok(());
        }
        let Some(addr) = sess.remote_addr() else {
            return Ok(());
        };
        let IpAddr::V4(ip) = addr.ip() else {
            return Ok(());
        };

        let ip = u32::from(ip);
        rdv.tlvs.replace_or_append(Tlv::u32(rendezvous_tag::REQUESTER_IP, ip));
        rdv.tlvs.push(Tlv::u32(rendezvous_tag::VERIFIED_IP, ip));
        tlvs.replace_or_append(Tlv::new(tag::RENDEZVOUS, rdv.encode()));
        Ok(())
    }

    /// Forward a typing event unless either side blocks. Never replies.
    pub async fn client_event(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &IcbmClientEvent,
    ) -> Result<()> {
        let them = normalize_identifier(&body.screen_name);
        let rel = self
            .relationships
            .relationship(ctx, sess.identifier(), &them)
            .await?;
        if !rel.mutually_visible() {
            return Ok(());
        }

        self.registry.relay_to_identifier(
            &them,
            ServerMessage::notification(IcbmClientEvent {
                cookie: body.cookie,
                channel: body.channel,
                screen_name: sess.display_name().to_owned(),
                event: body.event,
            }),
        );
        Ok(())
    }

    /// Forward a client-side delivery error, renaming it to the sender.
    pub fn client_err(&self, sess: &Arc<Session>, body: &IcbmClientErr) {
        let them = normalize_identifier(&body.screen_name);
        self.registry.relay_to_identifier(
            &them,
            ServerMessage::notification(IcbmClientErr {
                cookie: body.cookie,
                channel: body.channel,
                screen_name: sess.display_name().to_owned(),
                code: body.code,
            }),
        );
    }

    /// Raise the target's warning level and tell everyone who can see them.
    pub async fn evil_request(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &IcbmEvilRequest,
    ) -> Result<SnacBody> {
        let me = sess.identifier();
        let them = normalize_identifier(&body.screen_name);

        if them == me {
            return Ok(error_body(foodgroup::ICBM, ErrorCode::NotSupportedByHost));
        }

        let rel = self.relationships.relationship(ctx, me, &them).await?;
        if !rel.mutually_visible() {
            return Ok(error_body(foodgroup::ICBM, ErrorCode::NotLoggedOn));
        }
        let Some(target) = self.registry.retrieve(&them) else {
            return Ok(error_body(foodgroup::ICBM, ErrorCode::NotLoggedOn));
        };

        let delta = if body.is_anonymous() {
            EVIL_DELTA_ANONYMOUS
        } else {
            // Identified warnings scale with the sender's own level.
            let scaled = EVIL_DELTA_IDENTIFIED
                * (u32::from(sess.warning_level()) + 100)
                / 100;
            scaled as u16
        };
        let (applied, new_total) = target.apply_warning(delta);
        debug!(target = %them, applied, new_total, "warning applied");

        let snitcher = (!body.is_anonymous()).then(|| sess.user_info());
        target.relay(ServerMessage::notification(OServiceEvilNotification {
            new_evil: new_total,
            snitcher,
        }));

        self.broadcaster.broadcast_arrival(ctx, &target).await?;

        Ok(IcbmEvilReply {
            evil_delta_applied: applied,
            updated_evil_value: new_total,
        }
        .into())
    }
}
