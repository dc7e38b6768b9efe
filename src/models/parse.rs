// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The typed-body union handed across the codec boundary, plus the
//! `SnacInfo` trait that pins every body to its fixed
//! `(food-group, subgroup)` pair.

use enum_dispatch::enum_dispatch;

use crate::models::{
    bart::{
        BartDownload2Query, BartDownload2Reply, BartDownloadQuery, BartDownloadReply,
        BartErr, BartUploadQuery, BartUploadReply,
    },
    buddy::{BuddyArrived, BuddyDeparted, BuddyErr, BuddyRightsQuery, BuddyRightsReply},
    feedbag::{
        FeedbagDeleteItem, FeedbagEndCluster, FeedbagErr, FeedbagQuery,
        FeedbagQueryIfModified, FeedbagReply, FeedbagReplyNotModified,
        FeedbagRightsQuery, FeedbagRightsReply, FeedbagStartCluster, FeedbagStatus,
        FeedbagUpsertItem, FeedbagUse,
    },
    icbm::{
        IcbmChannelMsgToClient, IcbmChannelMsgToHost, IcbmClientErr, IcbmClientEvent,
        IcbmErr, IcbmEvilReply, IcbmEvilRequest, IcbmHostAck, IcbmParameterQuery,
        IcbmParameterReply, IcbmParameterSet,
    },
    locate::{
        LocateErr, LocateGetDirInfo, LocateGetDirReply, LocateRightsQuery,
        LocateRightsReply, LocateSetDirInfo, LocateSetDirReply, LocateSetInfo,
        LocateSetKeywordInfo, LocateSetKeywordReply, LocateUserInfoQuery,
        LocateUserInfoReply,
    },
    oservice::{
        OServiceBartReply, OServiceErr, OServiceEvilNotification,
        OServiceIdleNotification,
    },
    pd::{
        PdAddDenyListEntries, PdAddPermListEntries, PdDelDenyListEntries,
        PdDelPermListEntries, PdErr, PdRightsQuery, PdRightsReply,
    },
    snac::{foodgroup, subgroup},
    stats::{StatsErr, StatsReportAck, StatsReportEvents},
};

/// Fixed frame numbers of a typed body. The codec uses these to stamp
/// outbound frames; the numbers are protocol constants and never vary per
/// instance.
#[enum_dispatch]
pub trait SnacInfo {
    fn foodgroup(&self) -> u16;
    fn subgroup(&self) -> u16;
}

macro_rules! snac_info {
    ($($body:ty => ($fg:expr, $sub:expr);)+) => {
        $(impl SnacInfo for $body {
            fn foodgroup(&self) -> u16 {
                $fg
            }

            fn subgroup(&self) -> u16 {
                $sub
            }
        })+
    };
}

snac_info! {
    OServiceErr => (foodgroup::OSERVICE, subgroup::ERR);
    OServiceEvilNotification => (foodgroup::OSERVICE, subgroup::oservice::EVIL_NOTIFICATION);
    OServiceIdleNotification => (foodgroup::OSERVICE, subgroup::oservice::IDLE_NOTIFICATION);
    OServiceBartReply => (foodgroup::OSERVICE, subgroup::oservice::BART_REPLY);

    LocateErr => (foodgroup::LOCATE, subgroup::ERR);
    LocateRightsQuery => (foodgroup::LOCATE, subgroup::locate::RIGHTS_QUERY);
    LocateRightsReply => (foodgroup::LOCATE, subgroup::locate::RIGHTS_REPLY);
    LocateSetInfo => (foodgroup::LOCATE, subgroup::locate::SET_INFO);
    LocateUserInfoQuery => (foodgroup::LOCATE, subgroup::locate::USER_INFO_QUERY);
    LocateUserInfoReply => (foodgroup::LOCATE, subgroup::locate::USER_INFO_REPLY);
    LocateSetDirInfo => (foodgroup::LOCATE, subgroup::locate::SET_DIR_INFO);
    LocateSetDirReply => (foodgroup::LOCATE, subgroup::locate::SET_DIR_REPLY);
    LocateGetDirInfo => (foodgroup::LOCATE, subgroup::locate::GET_DIR_INFO);
    LocateGetDirReply => (foodgroup::LOCATE, subgroup::locate::GET_DIR_REPLY);
    LocateSetKeywordInfo => (foodgroup::LOCATE, subgroup::locate::SET_KEYWORD_INFO);
    LocateSetKeywordReply => (foodgroup::LOCATE, subgroup::locate::SET_KEYWORD_REPLY);

    BuddyErr => (foodgroup::BUDDY, subgroup::ERR);
    BuddyRightsQuery => (foodgroup::BUDDY, subgroup::buddy::RIGHTS_QUERY);
    BuddyRightsReply => (foodgroup::BUDDY, subgroup::buddy::RIGHTS_REPLY);
    BuddyArrived => (foodgroup::BUDDY, subgroup::buddy::ARRIVED);
    BuddyDeparted => (foodgroup::BUDDY, subgroup::buddy::DEPARTED);

    IcbmErr => (foodgroup::ICBM, subgroup::ERR);
    IcbmParameterSet => (foodgroup::ICBM, subgroup::icbm::ADD_PARAMETERS);
    IcbmParameterQuery => (foodgroup::ICBM, subgroup::icbm::PARAMETER_QUERY);
    IcbmParameterReply => (foodgroup::ICBM, subgroup::icbm::PARAMETER_REPLY);
    IcbmChannelMsgToHost => (foodgroup::ICBM, subgroup::icbm::CHANNEL_MSG_TO_HOST);
    IcbmChannelMsgToClient => (foodgroup::ICBM, subgroup::icbm::CHANNEL_MSG_TO_CLIENT);
    IcbmEvilRequest => (foodgroup::ICBM, subgroup::icbm::EVIL_REQUEST);
    IcbmEvilReply => (foodgroup::ICBM, subgroup::icbm::EVIL_REPLY);
    IcbmClientErr => (foodgroup::ICBM, subgroup::icbm::CLIENT_ERR);
    IcbmHostAck => (foodgroup::ICBM, subgroup::icbm::HOST_ACK);
    IcbmClientEvent => (foodgroup::ICBM, subgroup::icbm::CLIENT_EVENT);

    PdErr => (foodgroup::PERMIT_DENY, subgroup::ERR);
    PdRightsQuery => (foodgroup::PERMIT_DENY, subgroup::permit_deny::RIGHTS_QUERY);
    PdRightsReply => (foodgroup::PERMIT_DENY, subgroup::permit_deny::RIGHTS_REPLY);
    PdAddPermListEntries => (foodgroup::PERMIT_DENY, subgroup::permit_deny::ADD_PERM_LIST_ENTRIES);
    PdDelPermListEntries => (foodgroup::PERMIT_DENY, subgroup::permit_deny::DEL_PERM_LIST_ENTRIES);
    PdAddDenyListEntries => (foodgroup::PERMIT_DENY, subgroup::permit_deny::ADD_DENY_LIST_ENTRIES);
    PdDelDenyListEntries => (foodgroup::PERMIT_DENY, subgroup::permit_deny::DEL_DENY_LIST_ENTRIES);

    StatsErr => (foodgroup::STATS, subgroup::ERR);
    StatsReportEvents => (foodgroup::STATS, subgroup::stats::REPORT_EVENTS);
    StatsReportAck => (foodgroup::STATS, subgroup::stats::REPORT_ACK);

    BartErr => (foodgroup::BART, subgroup::ERR);
    BartUploadQuery => (foodgroup::BART, subgroup::bart::UPLOAD_QUERY);
    BartUploadReply => (foodgroup::BART, subgroup::bart::UPLOAD_REPLY);
    BartDownloadQuery => (foodgroup::BART, subgroup::bart::DOWNLOAD_QUERY);
    BartDownloadReply => (foodgroup::BART, subgroup::bart::DOWNLOAD_REPLY);
    BartDownload2Query => (foodgroup::BART, subgroup::bart::DOWNLOAD2_QUERY);
    BartDownload2Reply => (foodgroup::BART, subgroup::bart::DOWNLOAD2_REPLY);

    FeedbagErr => (foodgroup::FEEDBAG, subgroup::ERR);
    FeedbagRightsQuery => (foodgroup::FEEDBAG, subgroup::feedbag::RIGHTS_QUERY);
    FeedbagRightsReply => (foodgroup::FEEDBAG, subgroup::feedbag::RIGHTS_REPLY);
    FeedbagQuery => (foodgroup::FEEDBAG, subgroup::feedbag::QUERY);
    FeedbagQueryIfModified => (foodgroup::FEEDBAG, subgroup::feedbag::QUERY_IF_MODIFIED);
    FeedbagReply => (foodgroup::FEEDBAG, subgroup::feedbag::REPLY);
    FeedbagReplyNotModified => (foodgroup::FEEDBAG, subgroup::feedbag::REPLY_NOT_MODIFIED);
    FeedbagUse => (foodgroup::FEEDBAG, subgroup::feedbag::USE);
    FeedbagUpsertItem => (foodgroup::FEEDBAG, subgroup::feedbag::INSERT_ITEM);
    FeedbagDeleteItem => (foodgroup::FEEDBAG, subgroup::feedbag::DELETE_ITEM);
    FeedbagStatus => (foodgroup::FEEDBAG, subgroup::feedbag::STATUS);
    FeedbagStartCluster => (foodgroup::FEEDBAG, subgroup::feedbag::START_CLUSTER);
    FeedbagEndCluster => (foodgroup::FEEDBAG, subgroup::feedbag::END_CLUSTER);
}

/// Every typed body the service layer consumes or produces.
#[enum_dispatch(SnacInfo)]
#[derive(Debug, Clone, PartialEq)]
pub enum SnacBody {
    OServiceErr,
    OServiceEvilNotification,
    OServiceIdleNotification,
    OServiceBartReply,

    LocateErr,
    LocateRightsQuery,
    LocateRightsReply,
    LocateSetInfo,
    LocateUserInfoQuery,
    LocateUserInfoReply,
    LocateSetDirInfo,
    LocateSetDirReply,
    LocateGetDirInfo,
    LocateGetDirReply,
    LocateSetKeywordInfo,
    LocateSetKeywordReply,

    BuddyErr,
    BuddyRightsQuery,
    BuddyRightsReply,
    BuddyArrived,
    BuddyDeparted,

    IcbmErr,
    IcbmParameterSet,
    IcbmParameterQuery,
    IcbmParameterReply,
    IcbmChannelMsgToHost,
    IcbmChannelMsgToClient,
    IcbmEvilRequest,
    IcbmEvilReply,
    IcbmClientErr,
    IcbmHostAck,
    IcbmClientEvent,

    PdErr,
    PdRightsQuery,
    PdRightsReply,
    PdAddPermListEntries,
    PdDelPermListEntries,
    PdAddDenyListEntries,
    PdDelDenyListEntries,

    StatsErr,
    StatsReportEvents,
    StatsReportAck,

    BartErr,
    BartUploadQuery,
    BartUploadReply,
    BartDownloadQuery,
    BartDownloadReply,
    BartDownload2Query,
    BartDownload2Reply,

    FeedbagErr,
    FeedbagRightsQuery,
    FeedbagRightsReply,
    FeedbagQuery,
    FeedbagQueryIfModified,
    FeedbagReply,
    FeedbagReplyNotModified,
    FeedbagUse,
    FeedbagUpsertItem,
    FeedbagDeleteItem,
    FeedbagStatus,
    FeedbagStartCluster,
    FeedbagEndCluster,
}
