// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::models::{
    parse::{SnacBody, SnacInfo},
    snac::SnacFrame,
};

/// Why a session is being force-closed. The transport maps this onto its
/// close frame; it never travels as a SNAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickReason {
    /// Same identifier signed on from another connection.
    SignedOnElsewhere,
}

/// Unit of outbound delivery: either a framed SNAC or a transport-level
/// kick.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Snac { frame: SnacFrame, body: SnacBody },
    Kick(KickReason),
}

impl ServerMessage {
    /// Server-initiated notification; request-id 0.
    pub fn notification(body: impl Into<SnacBody>) -> Self {
        let body = body.into();
        let frame = SnacFrame::server_initiated(body.foodgroup(), body.subgroup());
        Self::Snac { frame, body }
    }

    /// Reply to a client request; echoes the request-id.
    pub fn reply(request_id: u32, body: impl Into<SnacBody>) -> Self {
        let body = body.into();
        let frame = SnacFrame::new(body.foodgroup(), body.subgroup(), request_id);
        Self::Snac { frame, body }
    }

    pub fn body(&self) -> Option<&SnacBody> {
        match self {
            Self::Snac { body, .. } => Some(body),
            Self::Kick(_) => None,
        }
    }
}
