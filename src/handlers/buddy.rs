// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Buddy and stats food groups: fixed replies. They live here because they
//! share the dispatch table, not because they hold state.

use crate::models::{
    buddy::BuddyRightsReply,
    stats::StatsReportAck,
    tlv::Tlv,
};

const TAG_MAX_BUDDIES: u16 = 0x0001;
const TAG_MAX_WATCHERS: u16 = 0x0002;
const TAG_MAX_ICQ_BROADCAST: u16 = 0x0003;

const MAX_BUDDIES: u16 = 500;
const MAX_WATCHERS: u16 = 3000;
const MAX_ICQ_BROADCAST: u16 = 20;

#[derive(Debug, Default)]
pub struct BuddyService;

impl BuddyService {
    pub fn rights_query(&self) -> BuddyRightsReply {
        let mut reply = BuddyRightsReply::default();
        reply.tlvs.push(Tlv::u16(TAG_MAX_BUDDIES, MAX_BUDDIES));
        reply.tlvs.push(Tlv::u16(TAG_MAX_WATCHERS, MAX_WATCHERS));
        reply.tlvs.push(Tlv::u16(TAG_MAX_ICQ_BROADCAST, MAX_ICQ_BROADCAST));
        reply
    }
}

#[derive(Debug, Default)]
pub struct StatsService;

impl StatsService {
    pub fn report_events(&self) -> StatsReportAck {
        StatsReportAck
    }
}
