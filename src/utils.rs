// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Result, bail};
use tokio_util::sync::CancellationToken;

/// Bails out when the caller's cancellation context has fired. Handlers
/// and stores call this between suspension points so cancelled work is
/// abandoned without mutating session state.
pub fn ensure_live(ctx: &CancellationToken) -> Result<()> {
    if ctx.is_cancelled() {
        bail!("operation cancelled");
    }
    Ok(())
}

/// Normalizes a screen name into its canonical identifier:
/// lowercased, spaces stripped.
///
/// `"John Doe"` and `"johndoe"` address the same user; ICQ UINs are
/// numeric strings and pass through unchanged.
pub fn normalize_identifier(screen_name: &str) -> String {
    screen_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
