// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound dedup ledger.
//!
//! Check-then-record is a single atomic statement: `INSERT OR IGNORE`
//! against the `UNIQUE (chat_id, message_id)` constraint. A redelivered
//! update simply inserts zero rows, which the caller treats as "already
//! processed" -- never as a failure.

use rusqlite::params;

use relaio_core::RelaioError;

use crate::database::Database;

/// Record an external message as processed.
///
/// Returns `true` if this call inserted the record (first delivery) and
/// `false` if the pair was already present (redelivery).
pub async fn record(
    db: &Database,
    chat_id: &str,
    message_id: i64,
    processed_at: &str,
) -> Result<bool, RelaioError> {
    let chat_id = chat_id.to_string();
    let processed_at = processed_at.to_string();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO inbound_dedup (chat_id, message_id, processed_at)
                 VALUES (?1, ?2, ?3)",
                params![chat_id, message_id, processed_at],
            )?;
            Ok(inserted > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether a pair has been processed already, without recording it.
pub async fn already_processed(
    db: &Database,
    chat_id: &str,
    message_id: i64,
) -> Result<bool, RelaioError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM inbound_dedup WHERE chat_id = ?1 AND message_id = ?2",
                params![chat_id, message_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of dedup records for a pair (test helper; must never exceed 1).
pub async fn count_records(
    db: &Database,
    chat_id: &str,
    message_id: i64,
) -> Result<i64, RelaioError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM inbound_dedup WHERE chat_id = ?1 AND message_id = ?2",
                params![chat_id, message_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
