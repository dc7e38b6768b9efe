// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! BART food group: content-addressed icon upload and retrieval.

use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    broadcast::BuddyBroadcaster,
    models::bart::{
        BART_UPLOAD_SUCCESS, BartDownload2Query, BartDownload2Reply, BartDownloadQuery,
        BartDownloadReply, BartFlags, BartId, BartUploadQuery, BartUploadReply,
        blank_gif, hash_item,
    },
    session::session::Session,
    store::traits::BartItemManager,
    utils::ensure_live,
};

pub struct BartService {
    bart: Arc<dyn BartItemManager>,
    broadcaster: Arc<BuddyBroadcaster>,
}

impl BartService {
    pub fn new(bart: Arc<dyn BartItemManager>, broadcaster: Arc<BuddyBroadcaster>) -> Self {
        Self { bart, broadcaster }
    }

    /// Stores the blob under its MD5 and announces the uploader so peers
    /// refetch the icon. Re-uploading identical bytes is success.
    pub async fn upload(
        &self,
        ctx: &CancellationToken,
        sess: &Arc<Session>,
        body: &BartUploadQuery,
    ) -> Result<BartUploadReply> {
        let hash = hash_item(&body.data);
        self.bart
            .insert_bart_item(ctx, &hash, &body.data, body.bart_type)
            .await?;
        debug!(identifier = %sess.identifier(), hash = %hex::encode(hash), "bart item stored");

        self.broadcaster.broadcast_arrival(ctx, sess).await?;

        Ok(BartUploadReply {
            code: BART_UPLOAD_SUCCESS,
            id: BartId::new(body.bart_type, BartFlags::KNOWN, hash.to_vec()),
        })
    }

    async fn fetch(&self, ctx: &CancellationToken, id: &BartId) -> Result<Bytes> {
        if id.is_clear_icon() {
            return Ok(Bytes::from_static(blank_gif()));
        }
        self.bart.bart_retrieve(ctx, &id.hash).await
    }

    pub async fn download(
        &self,
        ctx: &CancellationToken,
        body: &BartDownloadQuery,
    ) -> Result<BartDownloadReply> {
        let data = self.fetch(ctx, &body.id).await?;
        Ok(BartDownloadReply {
            screen_name: body.screen_name.clone(),
            id: body.id.clone(),
            data,
        })
    }

    /// Batched download: one reply per requested id, input order preserved.
    pub async fn download2(
        &self,
        ctx: &CancellationToken,
        body: &BartDownload2Query,
    ) -> Result<Vec<BartDownload2Reply>> {
        let mut replies = Vec::with_capacity(body.ids.len());
        for id in &body.ids {
            ensure_live(ctx)?;
            replies.push(BartDownload2Reply {
                screen_name: body.screen_name.clone(),
                id: id.clone(),
                data: self.fetch(ctx, id).await?,
            });
        }
        Ok(replies)
    }
}
