// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Stats bodies (food group 0x0B). Usage reports are acknowledged and
//! dropped.

use crate::models::tlv::TlvBlock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsReportEvents {
    pub tlvs: TlvBlock,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsReportAck;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsErr {
    pub code: u16,
}
