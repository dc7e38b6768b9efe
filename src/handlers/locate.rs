// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Locate food group: profiles, away messages, capabilities, directory
//! info.

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::{
    broadcast::BuddyBroadcaster,
    handlers::common::error_body,
    models::{
        locate::{
            AOLRTF_MIME, DirectoryInfo, Keywords, LocateGetDirInfo, LocateGetDirReply,
            LocateRightsReply, LocateSetDirInfo, LocateSetDirReply, LocateSetInfo,
            LocateSetKeywordInfo, LocateSetKeywordReply, LocateType,
            LocateUserInfoQuery, LocateUserInfoReply, dir_tag, tag,
        },
        parse::SnacBody,
        snac::{ErrorCode, foodgroup},
        tlv::Tlv,
        user_info::parse_capabilities,
    },
    relationship::RelationshipFetcher,
    session::{registry::SessionRegistry, session::Session},
    store::traits::ProfileManager,
    utils::normalize_identifier,
};

const TAG_MAX_SIG_LEN: u16 = 0x0001;
const TAG_MAX_CAPS: u16 = 0x0002;

const MAX_SIG_LEN: u16 = 1024;
const MAX_CAPS: u16 = 32;

const DIR_RESULT_SUCCESS: u16 = 0x0001;

pub struct LocateService {
    profiles: Arc<dyn ProfileManager>,
    relationships: Arc<dyn RelationshipFetcher>,
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<BuddyBroadcaster>,
}

impl LocateService {
    pub fn new(
        profiles: Arc<dyn ProfileManager>,
        relationships: Arc<dyn RelationshipFetcher>,
        registry: Arc<SessionRegistry>,
        broadcaster: Arc<BuddyBroadcaster>,
    ) -> Self {
        Self { profiles, relationships, registry, broadcaster }
    }

    pub fn rights_query(&self) -> LocateRightsReply {
        let mut reply = LocateRightsReply::default();
        reply.tlvs.push(Tlv::u16(TAG_MAX_SIG_LEN, MAX_SIG_LEN));
        reply.tlvs.push(Tlv::u16(TAG_MAX_CAPS, MAX_CAPS));
        reply
    }

    /// Applies the optional profile / away / capability TLVs. The
    /// capability list is validated before anything is touched, so a
    /// malformed payload leaves both the session and the store unchanged.
    pub async fn set_info(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &LocateSetInfo,
    ) -> Result<Option<SnacBody>> {
        let caps = match body.tlvs.first(tag::CAPABILITIES) {
            Some(tlv) => match parse_capabilities(&tlv.value) {
                Ok(caps) => Some(caps),
                Err(_) => {
                    return Ok(Some(error_body(foodgroup::LOCATE, ErrorCode::InvalidSnac)));
                },
            },
            None => None,
        };

        if let Some(profile) = body.tlvs.first(tag::SIG_DATA) {
            let text = String::from_utf8_lossy(&profile.value);
            self.profiles.set_profile(ctx, sess.identifier(), &text).await?;
        }

        let mut presence_changed = false;
        if let Some(away) = body.tlvs.first(tag::UNAVAILABLE_DATA) {
            sess.set_away_message(&String::from_utf8_lossy(&away.value));
            presence_changed = true;
        }
        if let Some(caps) = caps {
            sess.set_caps(caps);
            presence_changed = true;
        }

        if presence_changed && sess.is_signon_complete() {
            self.broadcaster.broadcast_arrival(ctx, sess).await?;
        }
        Ok(None)
    }

    /// Presence-safe user lookup: a blocked or offline target looks the
    /// same to the caller.
    pub async fn user_info_query(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &LocateUserInfoQuery,
    ) -> Result<SnacBody> {
        let them = normalize_identifier(&body.screen_name);
        let rel = self
            .relationships
            .relationship(ctx, sess.identifier(), &them)
            .await?;
        if !rel.mutually_visible() {
            return Ok(error_body(foodgroup::LOCATE, ErrorCode::NotLoggedOn));
        }
        let Some(target) = self.registry.retrieve(&them) else {
            return Ok(error_body(foodgroup::LOCATE, ErrorCode::NotLoggedOn));
        };

        let mut reply = LocateUserInfoReply {
            user_info: target.user_info(),
            ..LocateUserInfoReply::default()
        };
        if body.wants(LocateType::SIG) {
            let profile = self.profiles.profile(ctx, &them).await?;
            reply.locate_tlvs.push(Tlv::string(tag::SIG_MIME, AOLRTF_MIME));
            reply.locate_tlvs.push(Tlv::string(tag::SIG_DATA, &profile));
        }
        if body.wants(LocateType::UNAVAILABLE) {
            reply
                .locate_tlvs
                .push(Tlv::string(tag::UNAVAILABLE_MIME, AOLRTF_MIME));
            reply
                .locate_tlvs
                .push(Tlv::string(tag::UNAVAILABLE_DATA, &target.away_message()));
        }
        Ok(reply.into())
    }

    pub async fn set_dir_info(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &LocateSetDirInfo,
    ) -> Result<LocateSetDirReply> {
        let dir = DirectoryInfo::from_tlvs(&body.tlvs);
        self.profiles
            .set_directory_info(ctx, sess.identifier(), &dir)
            .await?;
        Ok(LocateSetDirReply { result: DIR_RESULT_SUCCESS })
    }

    pub async fn set_keyword_info(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &LocateSetKeywordInfo,
    ) -> Result<LocateSetKeywordReply> {
        let mut keywords = Keywords::default();
        for (slot, tlv) in keywords
            .iter_mut()
            .zip(body.tlvs.iter().filter(|t| t.tag == dir_tag::INTEREST))
        {
            *slot = String::from_utf8_lossy(&tlv.value).into_owned();
        }
        self.profiles
            .set_keywords(ctx, sess.identifier(), &keywords)
            .await?;
        Ok(LocateSetKeywordReply { result: DIR_RESULT_SUCCESS })
    }

    pub async fn get_dir_info(
        &self,
        ctx: &CancellationToken,
        body: &LocateGetDirInfo,
    ) -> Result<LocateGetDirReply> {
        let them = normalize_identifier(&body.screen_name);
        let tlvs = self
            .profiles
            .user(ctx, &them)
            .await?
            .map(|user| user.directory.to_tlvs())
            .unwrap_or_default();
        Ok(LocateGetDirReply { status: DIR_RESULT_SUCCESS, tlvs })
    }
}
