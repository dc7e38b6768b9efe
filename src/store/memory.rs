// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! In-memory implementation of every persistence seam. Backs the test
//! suite and single-node deployments; writes are serialized per entry by
//! the underlying concurrent map.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::{
    models::{
        feedbag::{ClassId, FeedbagItem, PdMode},
        locate::{DirectoryInfo, Keywords},
    },
    store::traits::{
        BartItemManager, BlockedState, FeedbagManager, LocalBuddyListManager,
        OfflineMessage, OfflineMessageManager, ProfileManager, UserRecord,
    },
    utils::{ensure_live, normalize_identifier},
};

#[derive(Debug, Default)]
struct FeedbagRecord {
    items: Vec<FeedbagItem>,
    last_modified: u32,
}

#[derive(Debug, Default)]
struct ProfileRecord {
    profile: String,
    keywords: Keywords,
}

#[derive(Debug)]
struct BartRecord {
    bart_type: u16,
    data: Bytes,
}

#[derive(Debug, Default)]
struct PdRecord {
    mode: PdMode,
    permit: Vec<String>,
    deny: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    feedbags: DashMap<String, FeedbagRecord>,
    profiles: DashMap<String, ProfileRecord>,
    users: DashMap<String, UserRecord>,
    bart: DashMap<Vec<u8>, BartRecord>,
    pd: DashMap<String, PdRecord>,
    offline: DashMap<String, Vec<OfflineMessage>>,
}

/// Feedbag-side block verdict: deny row, or the PDInfo mode excludes the
/// peer. Mode defaults to permit-all when no PDInfo row exists.
fn feedbag_blocks(items: &[FeedbagItem], peer: &str) -> bool {
    let denied = items.iter().any(|item| {
        item.class() == ClassId::Deny && normalize_identifier(&item.name) == peer
    });
    if denied {
        return true;
    }

    let mode = items
        .iter()
        .find(|item| item.class() == ClassId::PdInfo)
        .and_then(FeedbagItem::pd_mode)
        .unwrap_or_default();
    match mode {
        PdMode::PermitAll => false,
        PdMode::DenyAll => true,
        PdMode::PermitSome => !items.iter().any(|item| {
            item.class() == ClassId::Permit && normalize_identifier(&item.name) == peer
        }),
        PdMode::DenySome => false,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user so directory queries can find them. Identifier is
    /// derived from the display name.
    pub fn upsert_user(&self, display_name: &str) {
        let identifier = normalize_identifier(display_name);
        self.users
            .entry(identifier.clone())
            .or_insert_with(|| UserRecord {
                identifier,
                display_name: display_name.to_owned(),
                directory: DirectoryInfo::default(),
            });
    }

    fn bump_last_modified(record: &mut FeedbagRecord) {
        let now = Utc::now().timestamp() as u32;
        record.last_modified = now.max(record.last_modified + 1);
    }
}

#[async_trait]
impl FeedbagManager for MemoryStore {
    async fn feedbag(&self, ctx: &CancellationToken, id: &str) -> Result<Vec<FeedbagItem>> {
        ensure_live(ctx)?;
        Ok(self
            .feedbags
            .get(id)
            .map(|r| r.items.clone())
            .unwrap_or_default())
    }

    async fn feedbag_last_modified(
        &self,
        ctx: &CancellationToken,
        id: &str,
    ) -> Result<u32> {
        ensure_live(ctx)?;
        Ok(self.feedbags.get(id).map(|r| r.last_modified).unwrap_or(0))
    }

    async fn feedbag_upsert(
        &self,
        ctx: &CancellationToken,
        id: &str,
        items: &[FeedbagItem],
    ) -> Result<()> {
        ensure_live(ctx)?;
        let mut record = self.feedbags.entry(id.to_owned()).or_default();
        for item in items {
            let slot = record.items.iter_mut().find(|row| match item.class() {
                // Singletons: one PDInfo per user, one BART row per name.
                ClassId::PdInfo => row.class() == ClassId::PdInfo,
                ClassId::Bart => row.class() == ClassId::Bart && row.name == item.name,
                _ => {
                    row.class_id == item.class_id
                        && row.group_id == item.group_id
                        && row.item_id == item.item_id
                        && row.name == item.name
                },
            });
            match slot {
                Some(row) => *row = item.clone(),
                None => record.items.push(item.clone()),
            }
        }
        Self::bump_last_modified(&mut record);
        Ok(())
    }

    async fn feedbag_delete(
        &self,
        ctx: &CancellationToken,
        id: &str,
        items: &[FeedbagItem],
    ) -> Result<()> {
        ensure_live(ctx)?;
        let mut record = self.feedbags.entry(id.to_owned()).or_default();
        for item in items {
            record.items.retain(|row| {
                if row.class_id != item.class_id {
                    return true;
                }
                if item.name.is_empty() {
                    !(row.group_id == item.group_id && row.item_id == item.item_id)
                } else {
                    normalize_identifier(&row.name) != normalize_identifier(&item.name)
                }
            });
        }
        Self::bump_last_modified(&mut record);
        Ok(())
    }

    async fn buddies(&self, ctx: &CancellationToken, id: &str) -> Result<Vec<String>> {
        ensure_live(ctx)?;
        Ok(self
            .feedbags
            .get(id)
            .map(|r| {
                r.items
                    .iter()
                    .filter(|item| item.class() == ClassId::Buddy)
                    .map(|item| normalize_identifier(&item.name))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn adjacent_users(
        &self,
        ctx: &CancellationToken,
        id: &str,
    ) -> Result<Vec<String>> {
        ensure_live(ctx)?;
        Ok(self
            .feedbags
            .iter()
            .filter(|entry| entry.key() != id)
            .filter(|entry| {
                entry.items.iter().any(|item| {
                    matches!(
                        item.class(),
                        ClassId::Buddy | ClassId::Permit | ClassId::Deny
                    ) && normalize_identifier(&item.name) == id
                })
            })
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn blocked_state(
        &self,
        ctx: &CancellationToken,
        a: &str,
        b: &str,
    ) -> Result<BlockedState> {
        ensure_live(ctx)?;
        let a_items = self.feedbags.get(a).map(|r| r.items.clone()).unwrap_or_default();
        let b_items = self.feedbags.get(b).map(|r| r.items.clone()).unwrap_or_default();
        Ok(BlockedState {
            a_blocks_b: feedbag_blocks(&a_items, b),
            b_blocks_a: feedbag_blocks(&b_items, a),
        })
    }
}

#[async_trait]
impl ProfileManager for MemoryStore {
    async fn profile(&self, ctx: &CancellationToken, id: &str) -> Result<String> {
        ensure_live(ctx)?;
        Ok(self
            .profiles
            .get(id)
            .map(|r| r.profile.clone())
            .unwrap_or_default())
    }

    async fn set_profile(
        &self,
        ctx: &CancellationToken,
        id: &str,
        text: &str,
    ) -> Result<()> {
        ensure_live(ctx)?;
        self.profiles.entry(id.to_owned()).or_default().profile = text.to_owned();
        Ok(())
    }

    async fn set_directory_info(
        &self,
        ctx: &CancellationToken,
        id: &str,
        dir: &DirectoryInfo,
    ) -> Result<()> {
        ensure_live(ctx)?;
        self.users
            .entry(id.to_owned())
            .or_insert_with(|| UserRecord {
                identifier: id.to_owned(),
                display_name: id.to_owned(),
                directory: DirectoryInfo::default(),
            })
            .directory = dir.clone();
        Ok(())
    }

    async fn set_keywords(
        &self,
        ctx: &CancellationToken,
        id: &str,
        keywords: &Keywords,
    ) -> Result<()> {
        ensure_live(ctx)?;
        self.profiles.entry(id.to_owned()).or_default().keywords = keywords.clone();
        Ok(())
    }

    async fn user(
        &self,
        ctx: &CancellationToken,
        id: &str,
    ) -> Result<Option<UserRecord>> {
        ensure_live(ctx)?;
        Ok(self.users.get(id).map(|r| r.clone()))
    }
}

#[async_trait]
impl BartItemManager for MemoryStore {
    async fn insert_bart_item(
        &self,
        ctx: &CancellationToken,
        hash: &[u8],
        data: &Bytes,
        bart_type: u16,
    ) -> Result<()> {
        ensure_live(ctx)?;
        // Content-addressed: same hash means same bytes, duplicate is success.
        self.bart
            .entry(hash.to_vec())
            .or_insert_with(|| BartRecord { bart_type, data: data.clone() });
        Ok(())
    }

    async fn bart_item_exists(
        &self,
        ctx: &CancellationToken,
        hash: &[u8],
    ) -> Result<bool> {
        ensure_live(ctx)?;
        Ok(self.bart.contains_key(hash))
    }

    async fn bart_retrieve(&self, ctx: &CancellationToken, hash: &[u8]) -> Result<Bytes> {
        ensure_live(ctx)?;
        Ok(self
            .bart
            .get(hash)
            .map(|r| r.data.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl LocalBuddyListManager for MemoryStore {
    async fn pd_mode(&self, ctx: &CancellationToken, id: &str) -> Result<PdMode> {
        ensure_live(ctx)?;
        Ok(self.pd.get(id).map(|r| r.mode).unwrap_or_default())
    }

    async fn set_pd_mode(
        &self,
        ctx: &CancellationToken,
        id: &str,
        mode: PdMode,
    ) -> Result<()> {
        ensure_live(ctx)?;
        self.pd.entry(id.to_owned()).or_default().mode = mode;
        Ok(())
    }

    async fn permit_buddy(
        &self,
        ctx: &CancellationToken,
        id: &str,
        buddy: &str,
    ) -> Result<()> {
        ensure_live(ctx)?;
        let mut record = self.pd.entry(id.to_owned()).or_default();
        let buddy = normalize_identifier(buddy);
        if !record.permit.contains(&buddy) {
            record.permit.push(buddy);
        }
        Ok(())
    }

    async fn deny_buddy(
        &self,
        ctx: &CancellationToken,
        id: &str,
        buddy: &str,
    ) -> Result<()> {
        ensure_live(ctx)?;
        let mut record = self.pd.entry(id.to_owned()).or_default();
        let buddy = normalize_identifier(buddy);
        if !record.deny.contains(&buddy) {
            record.deny.push(buddy);
        }
        Ok(())
    }

    async fn remove_permit_buddy(
        &self,
        ctx: &CancellationToken,
        id: &str,
        buddy: &str,
    ) -> Result<()> {
        ensure_live(ctx)?;
        let buddy = normalize_identifier(buddy);
        if let Some(mut record) = self.pd.get_mut(id) {
            record.permit.retain(|b| *b != buddy);
        }
        Ok(())
    }

    async fn remove_deny_buddy(
        &self,
        ctx: &CancellationToken,
        id: &str,
        buddy: &str,
    ) -> Result<()> {
        ensure_live(ctx)?;
        let buddy = normalize_identifier(buddy);
        if let Some(mut record) = self.pd.get_mut(id) {
            record.deny.retain(|b| *b != buddy);
        }
        Ok(())
    }

    async fn permit_list(&self, ctx: &CancellationToken, id: &str) -> Result<Vec<String>> {
        ensure_live(ctx)?;
        Ok(self.pd.get(id).map(|r| r.permit.clone()).unwrap_or_default())
    }

    async fn deny_list(&self, ctx: &CancellationToken, id: &str) -> Result<Vec<String>> {
        ensure_live(ctx)?;
        Ok(self.pd.get(id).map(|r| r.deny.clone()).unwrap_or_default())
    }
}

#[async_trait]
impl OfflineMessageManager for MemoryStore {
    async fn save_message(
        &self,
        ctx: &CancellationToken,
        msg: OfflineMessage,
    ) -> Result<()> {
        ensure_live(ctx)?;
        self.offline
            .entry(msg.recipient.clone())
            .or_default()
            .push(msg);
        Ok(())
    }

    async fn load_messages(
        &self,
        ctx: &CancellationToken,
        recipient: &str,
    ) -> Result<Vec<OfflineMessage>> {
        ensure_live(ctx)?;
        Ok(self
            .offline
            .get(recipient)
            .map(|q| q.clone())
            .unwrap_or_default())
    }

    async fn delete_messages(
        &self,
        ctx: &CancellationToken,
        recipient: &str,
    ) -> Result<()> {
        ensure_live(ctx)?;
        self.offline.remove(recipient);
        Ok(())
    }
}
