// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Buddy bodies (food group 0x03): presence notifications and rights.

use crate::models::{tlv::TlvBlock, user_info::TlvUserInfo};

/// Peer became visible; carries their full presence snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuddyArrived {
    pub user_info: TlvUserInfo,
}

/// Peer went away; identity only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuddyDeparted {
    pub user_info: TlvUserInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuddyRightsQuery {
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuddyRightsReply {
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuddyErr {
    pub code: u16,
}
