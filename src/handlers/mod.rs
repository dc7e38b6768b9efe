//! This module contains the per-food-group services and the dispatch table
//! that routes inbound SNACs to them.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

pub mod bart;
pub mod buddy;
pub mod common;
pub mod feedbag;
pub mod icbm;
pub mod locate;
pub mod permit_deny;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    handlers::{
        bart::BartService,
        buddy::{BuddyService, StatsService},
        common::error_body,
        feedbag::FeedbagService,
        icbm::IcbmService,
        locate::LocateService,
        permit_deny::PermitDenyService,
    },
    models::{
        parse::SnacBody,
        snac::{ErrorCode, SnacFrame, UnsupportedSnac, foodgroup},
    },
    session::{common::ServerMessage, session::Session},
    utils::ensure_live,
};

/// Two-level routing: food group first, then the typed body within it. A
/// body arriving under the wrong food group is a protocol error, answered
/// on that group's error subgroup with the connection kept open.
pub struct Dispatcher {
    pub locate: LocateService,
    pub buddy: BuddyService,
    pub icbm: IcbmService,
    pub permit_deny: PermitDenyService,
    pub stats: StatsService,
    pub bart: BartService,
    pub feedbag: FeedbagService,
}

impl Dispatcher {
    /// Routes one inbound SNAC. Returned messages are replies for the
    /// originating connection, each echoing the request-id; fan-out to
    /// other sessions happens inside the services.
    pub async fn dispatch(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        frame: SnacFrame,
        body: SnacBody,
    ) -> Result<Vec<ServerMessage>> {
        ensure_live(ctx)?;
        let request_id = frame.request_id.get();
        let fg = frame.foodgroup.get();

        let reply = |body: SnacBody| vec![ServerMessage::reply(request_id, body)];
        let unsupported = || {
            let err = UnsupportedSnac { foodgroup: fg, subgroup: frame.subgroup.get() };
            debug!(%err, identifier = %sess.identifier(), "unroutable snac");
            reply(error_body(fg, ErrorCode::InvalidSnac))
        };

        Ok(match fg {
            foodgroup::OSERVICE => match body {
                SnacBody::OServiceIdleNotification(b) => {
                    let since = (b.idle_time > 0).then(|| {
                        chrono::Utc::now() - chrono::Duration::seconds(i64::from(b.idle_time))
                    });
                    sess.set_idle_since(since);
                    Vec::new()
                },
                _ => unsupported(),
            },

            foodgroup::LOCATE => match body {
                SnacBody::LocateRightsQuery(_) => reply(self.locate.rights_query().into()),
                SnacBody::LocateSetInfo(b) => self
                    .locate
                    .set_info(ctx, sess, &b)
                    .await?
                    .map(reply)
                    .unwrap_or_default(),
                SnacBody::LocateUserInfoQuery(b) => {
                    reply(self.locate.user_info_query(ctx, sess, &b).await?)
                },
                SnacBody::LocateSetDirInfo(b) => {
                    reply(self.locate.set_dir_info(ctx, sess, &b).await?.into())
                },
                SnacBody::LocateGetDirInfo(b) => {
                    reply(self.locate.get_dir_info(ctx, &b).await?.into())
                },
                SnacBody::LocateSetKeywordInfo(b) => {
                    reply(self.locate.set_keyword_info(ctx, sess, &b).await?.into())
                },
                _ => unsupported(),
            },

            foodgroup::BUDDY => match body {
                SnacBody::BuddyRightsQuery(_) => reply(self.buddy.rights_query().into()),
                _ => unsupported(),
            },

            foodgroup::ICBM => match body {
                SnacBody::IcbmParameterQuery(_) => {
                    reply(self.icbm.parameter_reply().into())
                },
                SnacBody::IcbmParameterSet(_) => Vec::new(),
                SnacBody::IcbmChannelMsgToHost(b) => self
                    .icbm
                    .channel_msg_to_host(ctx, sess, &b)
                    .await?
                    .map(reply)
                    .unwrap_or_default(),
                SnacBody::IcbmEvilRequest(b) => {
                    reply(self.icbm.evil_request(ctx, sess, &b).await?)
                },
                SnacBody::IcbmClientEvent(b) => {
                    self.icbm.client_event(ctx, sess, &b).await?;
                    Vec::new()
                },
                SnacBody::IcbmClientErr(b) => {
                    self.icbm.client_err(sess, &b);
                    Vec::new()
                },
                _ => unsupported(),
            },

            foodgroup::PERMIT_DENY => match body {
                SnacBody::PdRightsQuery(_) => reply(self.permit_deny.rights_query().into()),
                SnacBody::PdAddPermListEntries(b) => {
                    self.permit_deny.add_permit_entries(ctx, sess, &b.users).await?;
                    Vec::new()
                },
                SnacBody::PdDelPermListEntries(b) => {
                    self.permit_deny.del_permit_entries(ctx, sess, &b.users).await?;
                    Vec::new()
                },
                SnacBody::PdAddDenyListEntries(b) => {
                    self.permit_deny.add_deny_entries(ctx, sess, &b.users).await?;
                    Vec::new()
                },
                SnacBody::PdDelDenyListEntries(b) => {
                    self.permit_deny.del_deny_entries(ctx, sess, &b.users).await?;
                    Vec::new()
                },
                _ => unsupported(),
            },

            foodgroup::STATS => match body {
                SnacBody::StatsReportEvents(_) => reply(self.stats.report_events().into()),
                _ => unsupported(),
            },

            foodgroup::BART => match body {
                SnacBody::BartUploadQuery(b) => {
                    reply(self.bart.upload(ctx, sess, &b).await?.into())
                },
                SnacBody::BartDownloadQuery(b) => {
                    reply(self.bart.download(ctx, &b).await?.into())
                },
                SnacBody::BartDownload2Query(b) => self
                    .bart
                    .download2(ctx, &b)
                    .await?
                    .into_iter()
                    .map(|r| ServerMessage::reply(request_id, r))
                    .collect(),
                _ => unsupported(),
            },

            foodgroup::FEEDBAG => match body {
                SnacBody::FeedbagRightsQuery(_) => reply(self.feedbag.rights_query().into()),
                SnacBody::FeedbagQuery(_) => {
                    reply(self.feedbag.query(ctx, sess).await?.into())
                },
                SnacBody::FeedbagQueryIfModified(b) => {
                    reply(self.feedbag.query_if_modified(ctx, sess, &b).await?)
                },
                SnacBody::FeedbagUpsertItem(b) => {
                    reply(self.feedbag.upsert_item(ctx, sess, &b).await?)
                },
                SnacBody::FeedbagDeleteItem(b) => {
                    reply(self.feedbag.delete_item(ctx, sess, &b).await?)
                },
                SnacBody::FeedbagUse(_) => {
                    self.feedbag.use_feedbag(ctx, sess).await?;
                    Vec::new()
                },
                SnacBody::FeedbagStartCluster(_) | SnacBody::FeedbagEndCluster(_) => {
                    Vec::new()
                },
                _ => unsupported(),
            },

            _ => unsupported(),
        })
    }
}
