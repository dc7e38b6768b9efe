// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    models::{
        bart::BartId,
        tlv::Tlv,
        user_info::{Capability, TlvUserInfo, UserFlags, tag},
    },
    session::common::ServerMessage,
    utils::normalize_identifier,
};

/// Maximum warning level a user can reach.
pub const MAX_WARNING_LEVEL: u16 = 999;

/// Mutable per-session fields. Kept behind a std `RwLock`: snapshots are
/// brief and the lock is never held across an await.
#[derive(Debug, Default)]
struct SessionState {
    warning_level: u16,
    away_message: String,
    caps: Vec<Capability>,
    user_flags: UserFlags,
    invisible: bool,
    signon_complete: bool,
    idle_since: Option<DateTime<Utc>>,
    bart_icon: Option<BartId>,
}

/// One online user. Created at login, destroyed on disconnect; the
/// identifier never changes in between.
#[derive(Debug)]
pub struct Session {
    identifier: String,
    display_name: String,
    signon_time: DateTime<Utc>,
    remote_addr: Option<SocketAddr>,
    state: RwLock<SessionState>,
    outbound: mpsc::Sender<ServerMessage>,
    cancel: CancellationToken,
    /// Serializes presence fan-out where this session is the subject, so
    /// arrival/departure pairs reach every receiver in causal order.
    fanout: Mutex<()>,
}

impl Session {
    /// Builds a session and hands the outbound receiver to the transport.
    /// `queue_capacity` bounds the send buffer; overflow disconnects.
    pub fn new(
        display_name: &str,
        remote_addr: Option<SocketAddr>,
        queue_capacity: usize,
    ) -> (Arc<Session>, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let sess = Arc::new(Session {
            identifier: normalize_identifier(display_name),
            display_name: display_name.to_owned(),
            signon_time: Utc::now(),
            remote_addr,
            state: RwLock::new(SessionState {
                user_flags: UserFlags::OSCAR_FREE,
                ..SessionState::default()
            }),
            outbound: tx,
            cancel: CancellationToken::new(),
            fanout: Mutex::new(()),
        });
        (sess, rx)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn signon_time(&self) -> DateTime<Utc> {
        self.signon_time
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Force-closes the session. The transport observes the token and tears
    /// the connection down.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn fanout_lock(&self) -> &Mutex<()> {
        &self.fanout
    }

    /// Best-effort enqueue. A full buffer means the receiver stopped
    /// draining; the session is closed rather than blocking the sender.
    pub fn relay(&self, msg: ServerMessage) {
        use mpsc::error::TrySendError;

        match self.outbound.try_send(msg) {
            Ok(()) => {},
            Err(TrySendError::Full(_)) => {
                warn!(identifier = %self.identifier, "outbound queue overflow, closing session");
                self.close();
            },
            Err(TrySendError::Closed(_)) => {},
        }
    }

    pub fn warning_level(&self) -> u16 {
        self.read().warning_level
    }

    /// Raises the warning level by `delta`, clamped to
    /// [`MAX_WARNING_LEVEL`]. Returns the delta actually applied and the
    /// new total.
    pub fn apply_warning(&self, delta: u16) -> (u16, u16) {
        let mut st = self.write();
        let old = st.warning_level;
        st.warning_level = old.saturating_add(delta).min(MAX_WARNING_LEVEL);
        (st.warning_level - old, st.warning_level)
    }

    pub fn away_message(&self) -> String {
        self.read().away_message.clone()
    }

    pub fn set_away_message(&self, text: &str) {
        self.write().away_message = text.to_owned();
    }

    pub fn is_away(&self) -> bool {
        !self.read().away_message.is_empty()
    }

    pub fn caps(&self) -> Vec<Capability> {
        self.read().caps.clone()
    }

    pub fn set_caps(&self, caps: Vec<Capability>) {
        self.write().caps = caps;
    }

    pub fn is_invisible(&self) -> bool {
        self.read().invisible
    }

    pub fn set_invisible(&self, invisible: bool) {
        self.write().invisible = invisible;
    }

    pub fn is_signon_complete(&self) -> bool {
        self.read().signon_complete
    }

    /// Marks signon complete. Returns `true` on the first (and only)
    /// transition.
    pub fn mark_signon_complete(&self) -> bool {
        let mut st = self.write();
        !std::mem::replace(&mut st.signon_complete, true)
    }

    pub fn bart_icon(&self) -> Option<BartId> {
        self.read().bart_icon.clone()
    }

    pub fn set_bart_icon(&self, icon: Option<BartId>) {
        self.write().bart_icon = icon;
    }

    pub fn set_idle_since(&self, since: Option<DateTime<Utc>>) {
        self.write().idle_since = since;
    }

    /// Presence snapshot embedded into arrivals, locate replies and
    /// delivered messages. Taken under the state lock; never cached.
    pub fn user_info(&self) -> TlvUserInfo {
        let st = self.read();

        let mut flags = st.user_flags;
        flags.set(UserFlags::UNAVAILABLE, !st.away_message.is_empty());
        flags.set(UserFlags::INVISIBLE, st.invisible);

        let mut info = TlvUserInfo {
            screen_name: self.display_name.clone(),
            warning_level: st.warning_level,
            tlvs: Default::default(),
        };
        info.tlvs.push(Tlv::u16(tag::USER_FLAGS, flags.bits()));
        info.tlvs.push(Tlv::u32(tag::SIGNON_TIME, self.signon_time.timestamp() as u32));
        if let Some(since) = st.idle_since {
            let mins = (Utc::now() - since).num_minutes().max(0) as u16;
            info.tlvs.push(Tlv::u16(tag::IDLE_TIME, mins));
        }
        if !st.caps.is_empty() {
            let raw: Vec<u8> = st.caps.iter().flatten().copied().collect();
            info.tlvs.push(Tlv::new(tag::CAPABILITIES, raw));
        }
        if let Some(icon) = &st.bart_icon {
            info.tlvs.push(Tlv::new(tag::BART_INFO, icon.encode()));
        }
        info
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
