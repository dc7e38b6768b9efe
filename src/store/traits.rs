// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Persistence seams the service layer consumes. Durable backends live
//! outside this crate; every implementation is expected to serialize its
//! own writes and to honor the caller's cancellation token.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::models::{
    feedbag::{FeedbagItem, PdMode},
    icbm::IcbmChannelMsgToHost,
    locate::{DirectoryInfo, Keywords},
};

/// Block verdict between an ordered pair, derived from one user's feedbag
/// (deny rows plus the PDInfo mode).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockedState {
    pub a_blocks_b: bool,
    pub b_blocks_a: bool,
}

/// A registered user, whether or not they are online.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    pub identifier: String,
    pub display_name: String,
    pub directory: DirectoryInfo,
}

/// Server-stored buddy lists.
#[async_trait]
pub trait FeedbagManager: Send + Sync {
    async fn feedbag(&self, ctx: &CancellationToken, id: &str) -> Result<Vec<FeedbagItem>>;

    /// Unix timestamp of the last write; 0 for a user with no feedbag.
    async fn feedbag_last_modified(&self, ctx: &CancellationToken, id: &str)
    -> Result<u32>;

    async fn feedbag_upsert(
        &self,
        ctx: &CancellationToken,
        id: &str,
        items: &[FeedbagItem],
    ) -> Result<()>;

    async fn feedbag_delete(
        &self,
        ctx: &CancellationToken,
        id: &str,
        items: &[FeedbagItem],
    ) -> Result<()>;

    /// Identifiers of `id`'s buddy-class rows.
    async fn buddies(&self, ctx: &CancellationToken, id: &str) -> Result<Vec<String>>;

    /// Identifiers of users whose feedbag references `id`.
    async fn adjacent_users(&self, ctx: &CancellationToken, id: &str)
    -> Result<Vec<String>>;

    /// Feedbag-subsystem verdict for the ordered pair `(a, b)`.
    async fn blocked_state(
        &self,
        ctx: &CancellationToken,
        a: &str,
        b: &str,
    ) -> Result<BlockedState>;
}

/// Profiles, directory info and interest keywords.
#[async_trait]
pub trait ProfileManager: Send + Sync {
    /// Empty string for a user who never set a profile.
    async fn profile(&self, ctx: &CancellationToken, id: &str) -> Result<String>;

    async fn set_profile(&self, ctx: &CancellationToken, id: &str, text: &str)
    -> Result<()>;

    async fn set_directory_info(
        &self,
        ctx: &CancellationToken,
        id: &str,
        dir: &DirectoryInfo,
    ) -> Result<()>;

    async fn set_keywords(
        &self,
        ctx: &CancellationToken,
        id: &str,
        keywords: &Keywords,
    ) -> Result<()>;

    async fn user(&self, ctx: &CancellationToken, id: &str)
    -> Result<Option<UserRecord>>;
}

/// Content-addressed blob store for buddy art.
#[async_trait]
pub trait BartItemManager: Send + Sync {
    /// Inserting a hash that already exists is success, not conflict.
    async fn insert_bart_item(
        &self,
        ctx: &CancellationToken,
        hash: &[u8],
        data: &Bytes,
        bart_type: u16,
    ) -> Result<()>;

    async fn bart_item_exists(&self, ctx: &CancellationToken, hash: &[u8])
    -> Result<bool>;

    /// Stored bytes as-is; empty when the hash is unknown.
    async fn bart_retrieve(&self, ctx: &CancellationToken, hash: &[u8]) -> Result<Bytes>;
}

/// Pre-feedbag permit/deny lists and mode.
#[async_trait]
pub trait LocalBuddyListManager: Send + Sync {
    async fn pd_mode(&self, ctx: &CancellationToken, id: &str) -> Result<PdMode>;

    async fn set_pd_mode(
        &self,
        ctx: &CancellationToken,
        id: &str,
        mode: PdMode,
    ) -> Result<()>;

    async fn permit_buddy(&self, ctx: &CancellationToken, id: &str, buddy: &str)
    -> Result<()>;

    async fn deny_buddy(&self, ctx: &CancellationToken, id: &str, buddy: &str)
    -> Result<()>;

    async fn remove_permit_buddy(
        &self,
        ctx: &CancellationToken,
        id: &str,
        buddy: &str,
    ) -> Result<()>;

    async fn remove_deny_buddy(
        &self,
        ctx: &CancellationToken,
        id: &str,
        buddy: &str,
    ) -> Result<()>;

    async fn permit_list(&self, ctx: &CancellationToken, id: &str)
    -> Result<Vec<String>>;

    async fn deny_list(&self, ctx: &CancellationToken, id: &str) -> Result<Vec<String>>;
}

/// One queued message for an offline ICQ recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineMessage {
    pub sender: String,
    pub recipient: String,
    pub sent: DateTime<Utc>,
    pub message: IcbmChannelMsgToHost,
}

/// FIFO per-recipient offline-message queue.
#[async_trait]
pub trait OfflineMessageManager: Send + Sync {
    async fn save_message(&self, ctx: &CancellationToken, msg: OfflineMessage)
    -> Result<()>;

    async fn load_messages(
        &self,
        ctx: &CancellationToken,
        recipient: &str,
    ) -> Result<Vec<OfflineMessage>>;

    async fn delete_messages(&self, ctx: &CancellationToken, recipient: &str)
    -> Result<()>;
}
