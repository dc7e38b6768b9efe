// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::session::{
    common::{KickReason, ServerMessage},
    session::Session,
};

/// Raised when a second session tries to claim a live identifier without
/// asking for replacement.
#[derive(Debug, Error)]
#[error("identifier already signed on: {0}")]
pub struct DuplicateSession(pub String);

/// The set of online sessions, keyed by identifier, and the relayer that
/// routes outbound messages to them.
///
/// Reads never block behind writes; insert and remove serialize
/// per-identifier on the underlying shard. Relays enqueue into each
/// session's bounded buffer and never wait, so one slow receiver cannot
/// stall an unrelated handler.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session. With `replace` the previous holder of the
    /// identifier is told it signed on elsewhere and closed; without it
    /// the insert fails and the new session is untouched.
    pub fn insert(
        &self,
        session: Arc<Session>,
        replace: bool,
    ) -> Result<(), DuplicateSession> {
        let key = session.identifier().to_owned();
        match self.sessions.entry(key) {
            dashmap::Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            },
            dashmap::Entry::Occupied(mut slot) => {
                if !replace {
                    return Err(DuplicateSession(session.identifier().to_owned()));
                }
                let old = slot.insert(session);
                old.relay(ServerMessage::Kick(KickReason::SignedOnElsewhere));
                old.close();
                Ok(())
            },
        }
    }

    pub fn retrieve(&self, identifier: &str) -> Option<Arc<Session>> {
        self.sessions.get(identifier).map(|s| s.clone())
    }

    /// Consistent-at-call-time snapshot of live sessions.
    pub fn retrieve_all(&self) -> Vec<Arc<Session>> {
        self.sessions.iter().map(|s| s.clone()).collect()
    }

    pub fn is_online(&self, identifier: &str) -> bool {
        self.sessions.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Tears a session down. Only removes the mapping when it still points
    /// at the same session, so a replacement insert is not clobbered by
    /// the replaced session's late disconnect.
    pub fn remove(&self, session: &Arc<Session>) {
        self.sessions
            .remove_if(session.identifier(), |_, live| Arc::ptr_eq(live, session));
        session.close();
    }

    /// Best-effort delivery to one identifier; silently dropped when the
    /// target is gone.
    pub fn relay_to_identifier(&self, identifier: &str, msg: ServerMessage) {
        if let Some(sess) = self.retrieve(identifier) {
            sess.relay(msg);
        }
    }

    pub fn relay_to_many<'a>(
        &self,
        identifiers: impl IntoIterator<Item = &'a str>,
        msg: &ServerMessage,
    ) {
        for id in identifiers {
            self.relay_to_identifier(id, msg.clone());
        }
    }

    pub fn relay_to_all(&self, msg: &ServerMessage) {
        for sess in self.sessions.iter() {
            sess.relay(msg.clone());
        }
    }
}
