// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread CRUD operations.

use rusqlite::params;

use relaio_core::RelaioError;
use relaio_core::types::{MessageKind, Thread, ThreadId};

use crate::database::Database;
use crate::models::ThreadSummary;

/// Insert a new thread row.
pub async fn create_thread(db: &Database, thread: &Thread) -> Result<(), RelaioError> {
    let thread = thread.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO threads (id, display_name, created_at, last_activity_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    thread.id.as_str(),
                    thread.display_name,
                    thread.created_at,
                    thread.last_activity_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one thread by id.
pub async fn get_thread(db: &Database, id: &ThreadId) -> Result<Option<Thread>, RelaioError> {
    let id = id.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, display_name, created_at, last_activity_at
                 FROM threads WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id.as_str()], |row| {
                Ok(Thread {
                    id: ThreadId(row.get(0)?),
                    display_name: row.get(1)?,
                    created_at: row.get(2)?,
                    last_activity_at: row.get(3)?,
                })
            })?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether a thread id names an existing thread.
pub async fn thread_exists(db: &Database, id: &ThreadId) -> Result<bool, RelaioError> {
    Ok(get_thread(db, id).await?.is_some())
}

/// Update a thread's last-activity timestamp (visitor heartbeat).
pub async fn touch_thread(
    db: &Database,
    id: &ThreadId,
    timestamp: &str,
) -> Result<(), RelaioError> {
    let id = id.clone();
    let timestamp = timestamp.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE threads SET last_activity_at = ?1 WHERE id = ?2",
                params![timestamp, id.as_str()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all threads with their most recent message, newest activity first.
pub async fn list_threads(db: &Database) -> Result<Vec<ThreadSummary>, RelaioError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.display_name, t.created_at, t.last_activity_at,
                        (SELECT content FROM messages WHERE thread_id = t.id
                         ORDER BY created_at DESC, rowid DESC LIMIT 1),
                        (SELECT kind FROM messages WHERE thread_id = t.id
                         ORDER BY created_at DESC, rowid DESC LIMIT 1),
                        (SELECT created_at FROM messages WHERE thread_id = t.id
                         ORDER BY created_at DESC, rowid DESC LIMIT 1)
                 FROM threads t
                 ORDER BY COALESCE(
                     (SELECT created_at FROM messages WHERE thread_id = t.id
                      ORDER BY created_at DESC, rowid DESC LIMIT 1),
                     t.created_at
                 ) DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                let kind: Option<String> = row.get(5)?;
                let kind = match kind {
                    Some(k) => Some(k.parse::<MessageKind>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            5,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?),
                    None => None,
                };
                Ok(ThreadSummary {
                    id: ThreadId(row.get(0)?),
                    display_name: row.get(1)?,
                    created_at: row.get(2)?,
                    last_activity_at: row.get(3)?,
                    last_message: row.get(4)?,
                    last_message_kind: kind,
                    last_message_time: row.get(6)?,
                })
            })?;
            let mut threads = Vec::new();
            for row in rows {
                threads.push(row?);
            }
            Ok(threads)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Purge one thread's messages and bridge links. The thread row survives
/// so an open visitor session keeps its id.
pub async fn purge_thread(db: &Database, id: &ThreadId) -> Result<(), RelaioError> {
    let id = id.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM messages WHERE thread_id = ?1",
                params![id.as_str()],
            )?;
            tx.execute(
                "DELETE FROM bridge_links WHERE thread_id = ?1",
                params![id.as_str()],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Purge everything: messages, threads, bridge links, dedup records.
pub async fn purge_all(db: &Database) -> Result<(), RelaioError> {
    db.connection()
        .call(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM messages", [])?;
            tx.execute("DELETE FROM bridge_links", [])?;
            tx.execute("DELETE FROM inbound_dedup", [])?;
            tx.execute("DELETE FROM threads", [])?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("threads.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_thread(name: &str) -> Thread {
        Thread {
            id: ThreadId::generate(),
            display_name: name.to_string(),
            created_at: "2026-01-01 10:00:00".to_string(),
            last_activity_at: "2026-01-01 10:00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_get_thread() {
        let (db, _dir) = open_db().await;
        let thread = make_thread("Ziyaretçi");
        create_thread(&db, &thread).await.unwrap();

        let fetched = get_thread(&db, &thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.display_name, "Ziyaretçi");
        assert_eq!(fetched.id, thread.id);
    }

    #[tokio::test]
    async fn get_missing_thread_returns_none() {
        let (db, _dir) = open_db().await;
        let missing = ThreadId::generate();
        assert!(get_thread(&db, &missing).await.unwrap().is_none());
        assert!(!thread_exists(&db, &missing).await.unwrap());
    }

    #[tokio::test]
    async fn touch_updates_last_activity() {
        let (db, _dir) = open_db().await;
        let thread = make_thread("Visitor");
        create_thread(&db, &thread).await.unwrap();

        touch_thread(&db, &thread.id, "2026-01-02 09:30:00")
            .await
            .unwrap();
        let fetched = get_thread(&db, &thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.last_activity_at, "2026-01-02 09:30:00");
    }

    #[tokio::test]
    async fn list_threads_orders_by_latest_activity() {
        let (db, _dir) = open_db().await;
        let older = make_thread("older");
        let newer = Thread {
            created_at: "2026-01-02 10:00:00".to_string(),
            ..make_thread("newer")
        };
        create_thread(&db, &older).await.unwrap();
        create_thread(&db, &newer).await.unwrap();

        let listing = list_threads(&db).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].display_name, "newer");
        assert!(listing[0].last_message.is_none());
    }

    #[tokio::test]
    async fn purge_thread_keeps_the_thread_row() {
        let (db, _dir) = open_db().await;
        let thread = make_thread("keep me");
        create_thread(&db, &thread).await.unwrap();

        purge_thread(&db, &thread.id).await.unwrap();
        assert!(thread_exists(&db, &thread.id).await.unwrap());
    }

    #[tokio::test]
    async fn purge_all_deletes_threads() {
        let (db, _dir) = open_db().await;
        create_thread(&db, &make_thread("a")).await.unwrap();
        create_thread(&db, &make_thread("b")).await.unwrap();

        purge_all(&db).await.unwrap();
        assert!(list_threads(&db).await.unwrap().is_empty());
    }
}
