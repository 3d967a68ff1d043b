// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridge link operations.
//!
//! A bridge link maps a thread to one `(chat_id, message_id)` pair on the
//! external bot channel. Several links may point at the same thread (one
//! per forwarded message); reply resolution looks them up by message id.

use rusqlite::params;

use relaio_core::RelaioError;
use relaio_core::types::ThreadId;

use crate::database::Database;

/// Record a link from `thread_id` to an external message.
pub async fn insert_link(
    db: &Database,
    thread_id: &ThreadId,
    chat_id: &str,
    message_id: i64,
) -> Result<(), RelaioError> {
    let thread_id = thread_id.clone();
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bridge_links (thread_id, chat_id, message_id)
                 VALUES (?1, ?2, ?3)",
                params![thread_id.as_str(), chat_id, message_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Resolve the thread a previously bridged external message belongs to.
pub async fn thread_for_message(
    db: &Database,
    message_id: i64,
) -> Result<Option<ThreadId>, RelaioError> {
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT thread_id FROM bridge_links WHERE message_id = ?1 LIMIT 1")?;
            let mut rows = stmt.query_map(params![message_id], |row| {
                Ok(ThreadId(row.get(0)?))
            })?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count links for a thread (test helper).
pub async fn count_links_for_thread(
    db: &Database,
    thread_id: &ThreadId,
) -> Result<i64, RelaioError> {
    let thread_id = thread_id.clone();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM bridge_links WHERE thread_id = ?1",
                params![thread_id.as_str()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
