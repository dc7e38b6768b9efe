// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::models::{
    bart::BartErr,
    buddy::BuddyErr,
    feedbag::FeedbagErr,
    icbm::IcbmErr,
    locate::LocateErr,
    oservice::OServiceErr,
    parse::SnacBody,
    pd::PdErr,
    snac::{ErrorCode, foodgroup},
    stats::StatsErr,
};

/// Error SNAC for the given food group's error subgroup. Unknown food
/// groups fall back to the OService error shape.
pub fn error_body(fg: u16, code: ErrorCode) -> SnacBody {
    let code = u16::from(code);
    match fg {
        foodgroup::LOCATE => LocateErr { code }.into(),
        foodgroup::BUDDY => BuddyErr { code }.into(),
        foodgroup::ICBM => IcbmErr { code }.into(),
        foodgroup::PERMIT_DENY => PdErr { code }.into(),
        foodgroup::STATS => StatsErr { code }.into(),
        foodgroup::BART => BartErr { code }.into(),
        foodgroup::FEEDBAG => FeedbagErr { code }.into(),
        _ => OServiceErr { code }.into(),
    }
}
