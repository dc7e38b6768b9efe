// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Locate bodies (food group 0x02): profiles, away messages, capability
//! registration, directory info.

use bitflags::bitflags;

use crate::models::{tlv::{Tlv, TlvBlock}, user_info::TlvUserInfo};

/// MIME type prefixed to profile and away-message payloads.
pub const AOLRTF_MIME: &str = "text/aolrtf; charset=\"us-ascii\"";

/// Fixed profile MIME every session reports.
pub mod tag {
    /// Profile MIME type.
    pub const SIG_MIME: u16 = 0x0001;
    /// Profile text.
    pub const SIG_DATA: u16 = 0x0002;
    /// Away-message MIME type.
    pub const UNAVAILABLE_MIME: u16 = 0x0003;
    /// Away-message text.
    pub const UNAVAILABLE_DATA: u16 = 0x0004;
    /// Capability UUID concatenation.
    pub const CAPABILITIES: u16 = 0x0005;
}

bitflags! {
    /// Which sections a [`LocateUserInfoQuery`] asks for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LocateType: u16 {
        const SIG = 0x0001;
        const UNAVAILABLE = 0x0002;
        const CAPABILITIES = 0x0004;
        const CERTS = 0x0008;
    }
}

/// Directory-info field tags used by [`LocateGetDirReply`].
pub mod dir_tag {
    pub const FIRST_NAME: u16 = 0x0001;
    pub const LAST_NAME: u16 = 0x0002;
    pub const MIDDLE_NAME: u16 = 0x0003;
    pub const MAIDEN_NAME: u16 = 0x0004;
    pub const COUNTRY: u16 = 0x0006;
    pub const STATE: u16 = 0x0007;
    pub const CITY: u16 = 0x0008;
    /// Interest keyword; repeats once per keyword.
    pub const INTEREST: u16 = 0x000B;
    pub const NICKNAME: u16 = 0x000C;
    pub const ZIP: u16 = 0x000D;
    pub const ADDRESS: u16 = 0x0021;
}

/// Searchable directory fields attached to a user. Absent fields are
/// omitted from replies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub maiden_name: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub nickname: Option<String>,
    pub zip: Option<String>,
    pub address: Option<String>,
}

impl DirectoryInfo {
    /// Per-field TLVs in protocol tag order, skipping empty fields.
    pub fn to_tlvs(&self) -> TlvBlock {
        let fields = [
            (dir_tag::FIRST_NAME, &self.first_name),
            (dir_tag::LAST_NAME, &self.last_name),
            (dir_tag::MIDDLE_NAME, &self.middle_name),
            (dir_tag::MAIDEN_NAME, &self.maiden_name),
            (dir_tag::COUNTRY, &self.country),
            (dir_tag::STATE, &self.state),
            (dir_tag::CITY, &self.city),
            (dir_tag::NICKNAME, &self.nickname),
            (dir_tag::ZIP, &self.zip),
            (dir_tag::ADDRESS, &self.address),
        ];
        fields
            .into_iter()
            .filter_map(|(tag, field)| field.as_deref().map(|v| Tlv::string(tag, v)))
            .collect()
    }

    pub fn from_tlvs(tlvs: &TlvBlock) -> Self {
        let get = |tag| {
            tlvs.first(tag)
                .map(|t: &Tlv| String::from_utf8_lossy(&t.value).into_owned())
        };
        Self {
            first_name: get(dir_tag::FIRST_NAME),
            last_name: get(dir_tag::LAST_NAME),
            middle_name: get(dir_tag::MIDDLE_NAME),
            maiden_name: get(dir_tag::MAIDEN_NAME),
            country: get(dir_tag::COUNTRY),
            state: get(dir_tag::STATE),
            city: get(dir_tag::CITY),
            nickname: get(dir_tag::NICKNAME),
            zip: get(dir_tag::ZIP),
            address: get(dir_tag::ADDRESS),
        }
    }
}

/// Five free-form interest keywords per user.
pub type Keywords = [String; 5];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocateRightsQuery;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateRightsReply {
    pub tlvs: TlvBlock,
}

/// Profile / away-message / capability upload. Every TLV is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateSetInfo {
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateUserInfoQuery {
    pub locate_type: u16,
    pub screen_name: String,
}

impl LocateUserInfoQuery {
    pub fn wants(&self, section: LocateType) -> bool {
        LocateType::from_bits_truncate(self.locate_type).contains(section)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateUserInfoReply {
    pub user_info: TlvUserInfo,
    /// Profile / away sections, each prefixed by its MIME TLV.
    pub locate_tlvs: TlvBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateSetDirInfo {
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateSetDirReply {
    pub result: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateGetDirInfo {
    pub screen_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateGetDirReply {
    pub status: u16,
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateSetKeywordInfo {
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateSetKeywordReply {
    pub result: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateErr {
    pub code: u16,
}
