// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Where the BOS listener binds and how sessions are admitted.
    pub server: ServerConfig,
    /// Per-session resource limits.
    pub limits: LimitsConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(rename = "BindAddress")]
    /// Address the transport listens on, `host:port`.
    pub bind_address: String,

    #[serde(rename = "AdvertisedHost", default)]
    /// Hostname handed to clients for service reconnection; defaults to
    /// the bind address when empty.
    pub advertised_host: String,

    #[serde(rename = "ReplaceExistingSessions", default)]
    /// Whether a fresh login displaces a live session with the same
    /// identifier ("signed on elsewhere") or is rejected.
    pub replace_existing_sessions: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LimitsConfig {
    #[serde(rename = "SessionQueueDepth")]
    /// Outbound messages buffered per session before the connection is
    /// dropped as unresponsive.
    pub session_queue_depth: usize,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {path:?}"))?;
        let cfg: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config {path:?}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.server.bind_address.is_empty(), "BindAddress must be set");
        ensure!(
            self.limits.session_queue_depth > 0,
            "SessionQueueDepth must be > 0"
        );
        Ok(())
    }
}
