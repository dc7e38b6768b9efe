// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Inter-client basic messages (food group 0x04): point-to-point IMs,
//! rendezvous proposals, typing events and warning ("evil") requests.

use anyhow::{Result, bail};
use bytes::{BufMut, Bytes, BytesMut};

use crate::models::{
    tlv::TlvBlock,
    user_info::{Capability, TlvUserInfo},
};

/// Message channels.
pub mod channel {
    /// Plain instant message.
    pub const IM: u16 = 0x0001;
    /// Out-of-band negotiation (file transfer, direct connect).
    pub const RENDEZVOUS: u16 = 0x0002;
    /// MIME-wrapped payloads, used by ICQ clients.
    pub const MIME: u16 = 0x0004;
}

/// Body-level TLV tags.
pub mod tag {
    /// Channel-1 message data.
    pub const DATA: u16 = 0x0002;
    /// Sender wants a host acknowledgement once the message is relayed.
    pub const REQUEST_HOST_ACK: u16 = 0x0003;
    /// Channel-2 rendezvous payload ([`super::Rendezvous`]).
    pub const RENDEZVOUS: u16 = 0x0005;
    /// ICQ offline-delivery request: queue when the target is offline.
    pub const STORE: u16 = 0x0006;
    /// Sender wants typing events from the peer.
    pub const WANT_EVENTS: u16 = 0x000B;
}

/// TLV tags nested inside a rendezvous payload.
pub mod rendezvous_tag {
    /// Proposer's address as the proposer sees it.
    pub const REQUESTER_IP: u16 = 0x0003;
    /// Proposer's address as the server sees it; appended by the host.
    pub const VERIFIED_IP: u16 = 0x0004;
    pub const PORT: u16 = 0x0005;
}

/// Rendezvous proposal kinds (first u16 of the payload).
pub mod rendezvous_kind {
    pub const PROPOSE: u16 = 0x0000;
    pub const CANCEL: u16 = 0x0001;
    pub const ACCEPT: u16 = 0x0002;
}

/// Decoded channel-2 rendezvous payload: fixed prefix (kind, cookie,
/// service capability) followed by a nested TLV block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendezvous {
    pub kind: u16,
    pub cookie: [u8; 8],
    pub capability: Capability,
    pub tlvs: TlvBlock,
}

impl Rendezvous {
    pub fn decode(raw: Bytes) -> Result<Self> {
        if raw.len() < 26 {
            bail!("rendezvous payload too short: {} bytes", raw.len());
        }
        let kind = u16::from_be_bytes([raw[0], raw[1]]);
        let mut cookie = [0u8; 8];
        cookie.copy_from_slice(&raw[2..10]);
        let mut capability = [0u8; 16];
        capability.copy_from_slice(&raw[10..26]);
        let tlvs = TlvBlock::decode(raw.slice(26..))?;
        Ok(Self { kind, cookie, capability, tlvs })
    }

    pub fn encode(&self) -> Bytes {
        let body = self.tlvs.encode();
        let mut buf = BytesMut::with_capacity(26 + body.len());
        buf.put_u16(self.kind);
        buf.put_slice(&self.cookie);
        buf.put_slice(&self.capability);
        buf.put_slice(&body);
        buf.freeze()
    }
}

/// Client → host message submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcbmChannelMsgToHost {
    pub cookie: [u8; 8],
    pub channel: u16,
    pub screen_name: String,
    pub tlvs: TlvBlock,
}

/// Host → recipient delivery, carrying the sender's presence block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcbmChannelMsgToClient {
    pub cookie: [u8; 8],
    pub channel: u16,
    pub sender: TlvUserInfo,
    pub tlvs: TlvBlock,
}

/// Host acknowledgement, sent back when the submission asked for one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcbmHostAck {
    pub cookie: [u8; 8],
    pub channel: u16,
    pub screen_name: String,
}

/// Typing / composing notification relayed between peers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcbmClientEvent {
    pub cookie: [u8; 8],
    pub channel: u16,
    pub screen_name: String,
    pub event: u16,
}

/// Client-side delivery error forwarded to the named peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcbmClientErr {
    pub cookie: [u8; 8],
    pub channel: u16,
    pub screen_name: String,
    pub code: u16,
}

/// Warning request. `send_as = 1` warns anonymously.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcbmEvilRequest {
    pub send_as: u16,
    pub screen_name: String,
}

impl IcbmEvilRequest {
    pub fn is_anonymous(&self) -> bool {
        self.send_as == 1
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IcbmEvilReply {
    pub evil_delta_applied: u16,
    pub updated_evil_value: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IcbmParameterQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcbmParameterReply {
    pub max_slots: u16,
    pub icbm_flags: u32,
    pub max_incoming_icbm_len: u16,
    pub max_source_evil: u16,
    pub max_destination_evil: u16,
    pub min_inter_icbm_interval: u32,
}

/// Client-pushed channel parameters; accepted and ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IcbmParameterSet {
    pub channel: u16,
    pub icbm_flags: u32,
    pub max_incoming_icbm_len: u16,
    pub max_source_evil: u16,
    pub max_destination_evil: u16,
    pub min_inter_icbm_interval: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcbmErr {
    pub code: u16,
}
