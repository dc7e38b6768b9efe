// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Feedbag (server-stored buddy list) items and the request/reply bodies of
//! food group 0x13.

use bytes::Bytes;

use crate::models::tlv::{Tlv, TlvBlock};

/// Feedbag item class ids. Unknown classes travel through untouched, so the
/// raw value is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassId {
    Buddy,
    Group,
    Permit,
    Deny,
    PdInfo,
    ClientPrefs,
    Bart,
    Other(u16),
}

impl ClassId {
    pub fn from_u16(v: u16) -> Self {
        match v {
            0x0000 => Self::Buddy,
            0x0001 => Self::Group,
            0x0002 => Self::Permit,
            0x0003 => Self::Deny,
            0x0004 => Self::PdInfo,
            0x0005 => Self::ClientPrefs,
            0x0014 => Self::Bart,
            other => Self::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::Buddy => 0x0000,
            Self::Group => 0x0001,
            Self::Permit => 0x0002,
            Self::Deny => 0x0003,
            Self::PdInfo => 0x0004,
            Self::ClientPrefs => 0x0005,
            Self::Bart => 0x0014,
            Self::Other(v) => v,
        }
    }
}

/// Permit/deny visibility modes. Stored in the PDInfo item's
/// [`attr::PD_MODE`] attribute and mirrored by the pre-feedbag
/// permit-deny food group.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdMode {
    #[default]
    PermitAll = 0x01,
    DenyAll = 0x02,
    PermitSome = 0x03,
    DenySome = 0x04,
}

impl PdMode {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0x01 => Self::PermitAll,
            0x02 => Self::DenyAll,
            0x03 => Self::PermitSome,
            0x04 => Self::DenySome,
            _ => return None,
        })
    }
}

/// Item attribute tags.
pub mod attr {
    /// PD mode byte inside a `PdInfo` item.
    pub const PD_MODE: u16 = 0x00CA;
    /// BART id payload inside a `Bart` item.
    pub const BART_INFO: u16 = 0x00D5;
}

/// One server-stored buddy-list row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbagItem {
    pub name: String,
    pub group_id: u16,
    pub item_id: u16,
    pub class_id: u16,
    pub attributes: TlvBlock,
}

impl FeedbagItem {
    pub fn class(&self) -> ClassId {
        ClassId::from_u16(self.class_id)
    }

    pub fn buddy(name: &str, group_id: u16, item_id: u16) -> Self {
        Self {
            name: name.to_owned(),
            group_id,
            item_id,
            class_id: ClassId::Buddy.as_u16(),
            attributes: TlvBlock::new(),
        }
    }

    pub fn deny(name: &str, item_id: u16) -> Self {
        Self {
            name: name.to_owned(),
            group_id: 0,
            item_id,
            class_id: ClassId::Deny.as_u16(),
            attributes: TlvBlock::new(),
        }
    }

    pub fn permit(name: &str, item_id: u16) -> Self {
        Self {
            name: name.to_owned(),
            group_id: 0,
            item_id,
            class_id: ClassId::Permit.as_u16(),
            attributes: TlvBlock::new(),
        }
    }

    pub fn pd_info(mode: PdMode) -> Self {
        Self {
            name: String::new(),
            group_id: 0,
            item_id: 0,
            class_id: ClassId::PdInfo.as_u16(),
            attributes: TlvBlock::new().with(Tlv::new(attr::PD_MODE, vec![mode as u8])),
        }
    }

    pub fn bart_icon(item_id: u16, bart_payload: impl Into<Bytes>) -> Self {
        Self {
            name: "1".to_owned(),
            group_id: 0,
            item_id,
            class_id: ClassId::Bart.as_u16(),
            attributes: TlvBlock::new().with(Tlv::new(attr::BART_INFO, bart_payload)),
        }
    }

    pub fn pd_mode(&self) -> Option<PdMode> {
        let tlv = self.attributes.first(attr::PD_MODE)?;
        PdMode::from_u8(*tlv.value.first()?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbagRightsQuery;

/// Canned maxima advertised to every client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbagRightsReply {
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbagQuery;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbagQueryIfModified {
    /// Client's last cached feedbag timestamp, unix seconds.
    pub last_update: u32,
    pub count: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbagReply {
    pub version: u8,
    pub items: Vec<FeedbagItem>,
    pub last_update: u32,
}

/// "Not modified" answer to [`FeedbagQueryIfModified`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbagReplyNotModified {
    pub last_update: u32,
    pub count: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbagUpsertItem {
    pub items: Vec<FeedbagItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbagDeleteItem {
    pub items: Vec<FeedbagItem>,
}

/// Per-item result vector, positionally aligned with the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbagStatus {
    pub results: Vec<u16>,
}

impl FeedbagStatus {
    pub fn success(n: usize) -> Self {
        Self { results: vec![0x0000; n] }
    }
}

/// Signon-complete hook; empty body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbagUse;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbagStartCluster {
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbagEndCluster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbagErr {
    pub code: u16,
}
