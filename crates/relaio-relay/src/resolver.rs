// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread resolution for inbound external updates.
//!
//! Precedence, first match wins:
//! 1. reply reference → bridge link lookup
//! 2. `#thread:<id>` tag in the body → existing thread
//! 3. neither → the caller creates a new thread
//!
//! Both lookups are read-only; thread creation happens in the
//! orchestrator AFTER the dedup ledger accepted the update, so a
//! redelivered message can never create a thread.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use relaio_core::RelaioError;
use relaio_core::types::{ExternalUpdate, ThreadId};
use relaio_storage::Store;

/// Matches an embedded thread tag like `#thread:3f2a...-...`.
static THREAD_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#thread:([a-f0-9\-]+)").expect("thread tag pattern is valid")
});

/// Extract the id-looking token from an embedded thread tag, if any.
pub fn extract_thread_tag(text: &str) -> Option<String> {
    THREAD_TAG
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Render the tag embedded in outbound bridged text, so unsolicited
/// replies without a reply reference can still be routed manually.
pub fn format_thread_tag(thread_id: &ThreadId) -> String {
    format!("#thread:{thread_id}")
}

/// Resolve an external update to an existing thread, or `None` when a new
/// thread must be created.
pub async fn resolve_existing(
    store: &Store,
    update: &ExternalUpdate,
) -> Result<Option<ThreadId>, RelaioError> {
    if let Some(reply_id) = update.reply_to_message_id
        && let Some(thread_id) = store.thread_for_bridge_message(reply_id).await?
    {
        info!(%thread_id, reply_id, "reply resolved to thread");
        return Ok(Some(thread_id));
    }

    if let Some(tag) = extract_thread_tag(&update.text) {
        let candidate = ThreadId(tag);
        if store.thread_exists(&candidate).await? {
            info!(thread_id = %candidate, "thread tag resolved");
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}
