// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.

use rusqlite::params;

use relaio_core::RelaioError;
use relaio_core::types::{MessageId, MessageKind, Origin, ThreadId};

use crate::database::Database;
use crate::models::MessageRecord;

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    let origin: String = row.get(2)?;
    let kind: String = row.get(3)?;
    Ok(MessageRecord {
        id: MessageId(row.get(0)?),
        thread_id: ThreadId(row.get(1)?),
        origin: origin.parse::<Origin>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        kind: kind.parse::<MessageKind>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        content: row.get(4)?,
        file_locator: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Insert a new message row.
pub async fn insert_message(db: &Database, record: &MessageRecord) -> Result<(), RelaioError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, thread_id, origin, kind, content, file_locator, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.as_str(),
                    record.thread_id.as_str(),
                    record.origin.to_string(),
                    record.kind.to_string(),
                    record.content,
                    record.file_locator,
                    record.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get messages for a thread in chronological order.
///
/// `limit` restricts the page to the newest N rows while preserving
/// chronological output order.
pub async fn messages_for_thread(
    db: &Database,
    thread_id: &ThreadId,
    limit: Option<i64>,
) -> Result<Vec<MessageRecord>, RelaioError> {
    let thread_id = thread_id.clone();
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            match limit {
                Some(lim) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, thread_id, origin, kind, content, file_locator, created_at
                         FROM (SELECT * FROM messages WHERE thread_id = ?1
                               ORDER BY created_at DESC, rowid DESC LIMIT ?2)
                         ORDER BY created_at ASC, rowid ASC",
                    )?;
                    let rows = stmt.query_map(params![thread_id.as_str(), lim], |row| {
                        row_to_record(row)
                    })?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, thread_id, origin, kind, content, file_locator, created_at
                         FROM messages WHERE thread_id = ?1
                         ORDER BY created_at ASC, rowid ASC",
                    )?;
                    let rows =
                        stmt.query_map(params![thread_id.as_str()], |row| row_to_record(row))?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count all stored messages (test and diagnostics helper).
pub async fn count_messages(db: &Database) -> Result<i64, RelaioError> {
    db.connection()
        .call(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
