// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Permit/deny bodies (food group 0x09), the pre-feedbag visibility lists.

use crate::models::tlv::TlvBlock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdRightsQuery;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdRightsReply {
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdAddPermListEntries {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdDelPermListEntries {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdAddDenyListEntries {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdDelDenyListEntries {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdErr {
    pub code: u16,
}
