// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! BART (buddy art) bodies: content-addressed icon blobs keyed by MD5.

use anyhow::{Result, bail};
use bitflags::bitflags;
use bytes::{BufMut, Bytes, BytesMut};
use hex_literal::hex;
use md5::{Digest, Md5};

/// Well-known BART item types.
pub mod bart_type {
    pub const BUDDY_ICON_SMALL: u16 = 0x0000;
    pub const BUDDY_ICON: u16 = 0x0001;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BartFlags: u8 {
        /// Server recognizes the hash.
        const KNOWN = 0x00;
        const CUSTOM = 0x04;
        /// Hash not in the store; client should upload.
        const UNKNOWN = 0x40;
    }
}

/// Sentinel hash clients send to clear their icon. Never stored; resolves
/// to [`blank_gif`].
pub const CLEAR_ICON_HASH: [u8; 5] = hex!("0201d20472");

/// Placeholder rendered for a cleared icon: a blank 50×50 GIF.
pub fn blank_gif() -> &'static [u8] {
    static BLANK_GIF: &[u8] = &hex!(
        "474946383961"         // GIF89a
        "32003200"             // 50 x 50
        "800100"               // 2-color global palette
        "ffffff000000"
        "2c000000000032003200 00"
        "0230448cb9cbed0fa39c b4da8bb3debcfb0f86e2 4896e689a6eac6b6ee0b"
        "c7f24cd7f68ddfface00"
        "003b"
    );
    BLANK_GIF
}

/// Computes the content address of an uploaded blob.
pub fn hash_item(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// A BART reference: `(type u16, flags u8, hash-len u8, hash)`. Travels
/// inside feedbag `Bart` items and user-info appendages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BartId {
    pub bart_type: u16,
    pub flags: BartFlags,
    pub hash: Bytes,
}

impl BartId {
    pub fn new(bart_type: u16, flags: BartFlags, hash: impl Into<Bytes>) -> Self {
        Self { bart_type, flags, hash: hash.into() }
    }

    pub fn is_clear_icon(&self) -> bool {
        self.hash.as_ref() == CLEAR_ICON_HASH
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + self.hash.len());
        buf.put_u16(self.bart_type);
        buf.put_u8(self.flags.bits());
        buf.put_u8(self.hash.len() as u8);
        buf.put_slice(&self.hash);
        buf.freeze()
    }

    pub fn decode(raw: Bytes) -> Result<Self> {
        if raw.len() < 4 {
            bail!("bart id too short: {} bytes", raw.len());
        }
        let bart_type = u16::from_be_bytes([raw[0], raw[1]]);
        let flags = BartFlags::from_bits_truncate(raw[2]);
        let hash_len = raw[3] as usize;
        if raw.len() < 4 + hash_len {
            bail!("bart id hash truncated: want {hash_len}, have {}", raw.len() - 4);
        }
        Ok(Self {
            bart_type,
            flags,
            hash: raw.slice(4..4 + hash_len),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BartUploadQuery {
    pub bart_type: u16,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BartUploadReply {
    pub code: u8,
    pub id: BartId,
}

pub const BART_UPLOAD_SUCCESS: u8 = 0x00;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BartDownloadQuery {
    pub screen_name: String,
    pub id: BartId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BartDownloadReply {
    pub screen_name: String,
    pub id: BartId,
    pub data: Bytes,
}

/// Batched download; one reply per id, input order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BartDownload2Query {
    pub screen_name: String,
    pub ids: Vec<BartId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BartDownload2Reply {
    pub screen_name: String,
    pub id: BartId,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BartErr {
    pub code: u16,
}
