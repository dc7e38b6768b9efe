// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! OService bodies this layer originates: warning notifications and
//! self-BART acknowledgements.

use crate::models::{bart::BartId, user_info::TlvUserInfo};

/// Tells a user their warning level rose. `snitcher` is present only for
/// identified warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OServiceEvilNotification {
    pub new_evil: u16,
    pub snitcher: Option<TlvUserInfo>,
}

/// Echo of the user's own BART selection; flags tell the client whether an
/// upload is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OServiceBartReply {
    pub id: BartId,
}

/// Client-reported idle time in seconds; zero means active again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OServiceIdleNotification {
    pub idle_time: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OServiceErr {
    pub code: u16,
}
