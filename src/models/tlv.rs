// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! TLV (tag, length, value) triples, the protocol's extensible field
//! format. Blocks preserve insertion order; lookups return the first
//! matching tag.

use anyhow::{Result, bail};
use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    pub tag: u16,
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self { tag, value: value.into() }
    }

    pub fn u16(tag: u16, value: u16) -> Self {
        Self::new(tag, value.to_be_bytes().to_vec())
    }

    pub fn u32(tag: u16, value: u32) -> Self {
        Self::new(tag, value.to_be_bytes().to_vec())
    }

    pub fn string(tag: u16, value: &str) -> Self {
        Self::new(tag, value.as_bytes().to_vec())
    }

    /// Zero-length marker TLV (presence is the payload).
    pub fn empty(tag: u16) -> Self {
        Self::new(tag, Bytes::new())
    }

    pub fn value_u16(&self) -> Option<u16> {
        let arr: [u8; 2] = self.value.as_ref().try_into().ok()?;
        Some(u16::from_be_bytes(arr))
    }

    pub fn value_u32(&self) -> Option<u32> {
        let arr: [u8; 4] = self.value.as_ref().try_into().ok()?;
        Some(u32::from_be_bytes(arr))
    }
}

/// Ordered TLV list. Both request bodies and nested blocks (rendezvous
/// payloads, feedbag item attributes, user-info appendages) use this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvBlock {
    tlvs: Vec<Tlv>,
}

impl TlvBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tlvs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tlvs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tlv> {
        self.tlvs.iter()
    }

    pub fn push(&mut self, tlv: Tlv) {
        self.tlvs.push(tlv);
    }

    pub fn with(mut self, tlv: Tlv) -> Self {
        self.tlvs.push(tlv);
        self
    }

    pub fn first(&self, tag: u16) -> Option<&Tlv> {
        self.tlvs.iter().find(|t| t.tag == tag)
    }

    pub fn has(&self, tag: u16) -> bool {
        self.first(tag).is_some()
    }

    /// Replace the first TLV with `tlv.tag` in place, or append when the tag
    /// is absent. Order of unrelated tags is preserved.
    pub fn replace_or_append(&mut self, tlv: Tlv) {
        match self.tlvs.iter_mut().find(|t| t.tag == tlv.tag) {
            Some(slot) => *slot = tlv,
            None => self.tlvs.push(tlv),
        }
    }

    pub fn remove(&mut self, tag: u16) {
        self.tlvs.retain(|t| t.tag != tag);
    }

    /// Wire encoding: `tag u16 BE, length u16 BE, value` per entry, no
    /// block-level length prefix.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(
            self.tlvs.iter().map(|t| 4 + t.value.len()).sum(),
        );
        for tlv in &self.tlvs {
            buf.put_u16(tlv.tag);
            buf.put_u16(tlv.value.len() as u16);
            buf.put_slice(&tlv.value);
        }
        buf.freeze()
    }

    /// Parses a byte run that must consist of whole TLV entries.
    pub fn decode(mut buf: Bytes) -> Result<Self> {
        let mut tlvs = Vec::new();
        while !buf.is_empty() {
            if buf.len() < 4 {
                bail!("truncated tlv header: {} trailing bytes", buf.len());
            }
            let tag = u16::from_be_bytes([buf[0], buf[1]]);
            let len = u16::from_be_bytes([buf[2], buf[3]]) as usize;
            if buf.len() < 4 + len {
                bail!("tlv 0x{tag:04x} claims {len} bytes, {} available", buf.len() - 4);
            }
            let value = buf.slice(4..4 + len);
            buf = buf.slice(4 + len..);
            tlvs.push(Tlv { tag, value });
        }
        Ok(Self { tlvs })
    }
}

impl FromIterator<Tlv> for TlvBlock {
    fn from_iter<I: IntoIterator<Item = Tlv>>(iter: I) -> Self {
        Self { tlvs: iter.into_iter().collect() }
    }
}

impl IntoIterator for TlvBlock {
    type IntoIter = std::vec::IntoIter<Tlv>;
    type Item = Tlv;

    fn into_iter(self) -> Self::IntoIter {
        self.tlvs.into_iter()
    }
}
