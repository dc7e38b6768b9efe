// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-user presence snapshot (`TlvUserInfo`) and the flag/capability
//! vocabulary it carries. Arrived/departed notifications, locate replies
//! and inbound instant messages all embed this block.

use anyhow::{Result, bail};
use bitflags::bitflags;
use hex_literal::hex;

use crate::models::tlv::{Tlv, TlvBlock};

/// User-info appendage tags.
pub mod tag {
    /// User class bitmask ([`UserFlags`]).
    pub const USER_FLAGS: u16 = 0x0001;
    /// Signon time, unix seconds.
    pub const SIGNON_TIME: u16 = 0x0003;
    /// Idle time in minutes; absent when active.
    pub const IDLE_TIME: u16 = 0x0004;
    /// Capability UUID concatenation.
    pub const CAPABILITIES: u16 = 0x000D;
    /// BART id of the user's current icon.
    pub const BART_INFO: u16 = 0x001D;
}

bitflags! {
    /// User-class bits carried in the [`tag::USER_FLAGS`] TLV.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UserFlags: u16 {
        const UNCONFIRMED = 0x0001;
        const ADMINISTRATOR = 0x0002;
        const AOL = 0x0004;
        const OSCAR_PAY = 0x0008;
        const OSCAR_FREE = 0x0010;
        const UNAVAILABLE = 0x0020;
        const ICQ = 0x0040;
        const WIRELESS = 0x0080;
        const INVISIBLE = 0x0100;
        const BOT = 0x0400;
    }
}

/// A 16-byte capability UUID.
pub type Capability = [u8; 16];

pub const CAP_VOICE_CHAT: Capability = hex!("09461341 4c7f 11d1 8222 444553540000");
pub const CAP_SEND_FILE: Capability = hex!("09461343 4c7f 11d1 8222 444553540000");
pub const CAP_DIRECT_CONNECT: Capability = hex!("09461344 4c7f 11d1 8222 444553540000");
pub const CAP_GAMES: Capability = hex!("0946134a 4c7f 11d1 8222 444553540000");
pub const CAP_ICQ_INTEROP: Capability = hex!("0946134d 4c7f 11d1 8222 444553540000");

/// Capabilities the server strips from every client-supplied list: the
/// corresponding services are not hosted here, so advertising them would
/// invite peer traffic that can never be satisfied.
pub const FILTERED_CAPS: [Capability; 3] = [CAP_GAMES, CAP_ICQ_INTEROP, CAP_VOICE_CHAT];

/// Splits a concatenation of 16-byte UUIDs, dropping [`FILTERED_CAPS`]
/// entries while preserving the order of the rest. Length must be a
/// multiple of 16.
pub fn parse_capabilities(raw: &[u8]) -> Result<Vec<Capability>> {
    if raw.len() % 16 != 0 {
        bail!("capability list length {} is not a multiple of 16", raw.len());
    }
    Ok(raw
        .chunks_exact(16)
        .map(|chunk| {
            let mut cap = [0u8; 16];
            cap.copy_from_slice(chunk);
            cap
        })
        .filter(|cap| !FILTERED_CAPS.contains(cap))
        .collect())
}

/// The `screen name + warning level + TLV appendages` block every presence
/// notification carries. Built from a session snapshot; never cached across
/// handler invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvUserInfo {
    pub screen_name: String,
    pub warning_level: u16,
    pub tlvs: TlvBlock,
}

impl TlvUserInfo {
    /// Minimal info block used by departures, which carry only identity.
    pub fn bare(screen_name: &str) -> Self {
        Self {
            screen_name: screen_name.to_owned(),
            warning_level: 0,
            tlvs: TlvBlock::new(),
        }
    }

    pub fn user_flags(&self) -> UserFlags {
        self.tlvs
            .first(tag::USER_FLAGS)
            .and_then(Tlv::value_u16)
            .map(UserFlags::from_bits_truncate)
            .unwrap_or_default()
    }
}
