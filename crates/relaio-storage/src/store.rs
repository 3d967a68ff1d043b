// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! High-level persistence facade over the typed query modules.
//!
//! Also owns the deployment's timestamp convention: `%Y-%m-%d %H:%M:%S` in
//! a fixed configured UTC offset. Timestamps are assigned here, on the
//! single write path, which keeps `created_at` non-decreasing within a
//! thread.

use chrono::{FixedOffset, Utc};
use tracing::debug;

use relaio_config::model::StorageConfig;
use relaio_core::RelaioError;
use relaio_core::types::{Thread, ThreadId};

use crate::database::Database;
use crate::models::{MessageRecord, ThreadSummary};
use crate::queries;

/// Storage facade handed to the relay orchestrator.
#[derive(Clone)]
pub struct Store {
    db: Database,
    offset: FixedOffset,
}

impl Store {
    /// Open the database at the configured path and apply migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, RelaioError> {
        let offset = FixedOffset::east_opt(i32::from(config.utc_offset_hours) * 3600)
            .ok_or_else(|| {
                RelaioError::Config(format!(
                    "invalid utc_offset_hours: {}",
                    config.utc_offset_hours
                ))
            })?;
        let db = Database::open(&config.database_path).await?;
        debug!(path = %config.database_path, "store opened");
        Ok(Self { db, offset })
    }

    /// Current timestamp in the configured offset, second resolution.
    pub fn now_local(&self) -> String {
        Utc::now()
            .with_timezone(&self.offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// The underlying database handle (test and wiring use).
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn close(&self) -> Result<(), RelaioError> {
        self.db.close().await
    }

    // --- Threads ---

    /// Create a new thread with a generated id and current timestamps.
    pub async fn create_thread(&self, display_name: &str) -> Result<Thread, RelaioError> {
        let now = self.now_local();
        let thread = Thread {
            id: ThreadId::generate(),
            display_name: display_name.to_string(),
            created_at: now.clone(),
            last_activity_at: now,
        };
        queries::threads::create_thread(&self.db, &thread).await?;
        Ok(thread)
    }

    pub async fn get_thread(&self, id: &ThreadId) -> Result<Option<Thread>, RelaioError> {
        queries::threads::get_thread(&self.db, id).await
    }

    pub async fn thread_exists(&self, id: &ThreadId) -> Result<bool, RelaioError> {
        queries::threads::thread_exists(&self.db, id).await
    }

    pub async fn touch_thread(&self, id: &ThreadId) -> Result<(), RelaioError> {
        let now = self.now_local();
        queries::threads::touch_thread(&self.db, id, &now).await
    }

    pub async fn list_threads(&self) -> Result<Vec<ThreadSummary>, RelaioError> {
        queries::threads::list_threads(&self.db).await
    }

    pub async fn purge_thread(&self, id: &ThreadId) -> Result<(), RelaioError> {
        queries::threads::purge_thread(&self.db, id).await
    }

    pub async fn purge_all(&self) -> Result<(), RelaioError> {
        queries::threads::purge_all(&self.db).await
    }

    // --- Messages ---

    pub async fn insert_message(&self, record: &MessageRecord) -> Result<(), RelaioError> {
        queries::messages::insert_message(&self.db, record).await
    }

    pub async fn messages_for_thread(
        &self,
        thread_id: &ThreadId,
        limit: Option<i64>,
    ) -> Result<Vec<MessageRecord>, RelaioError> {
        queries::messages::messages_for_thread(&self.db, thread_id, limit).await
    }

    pub async fn count_messages(&self) -> Result<i64, RelaioError> {
        queries::messages::count_messages(&self.db).await
    }

    // --- Bridge links ---

    pub async fn insert_bridge_link(
        &self,
        thread_id: &ThreadId,
        chat_id: &str,
        message_id: i64,
    ) -> Result<(), RelaioError> {
        queries::bridge::insert_link(&self.db, thread_id, chat_id, message_id).await
    }

    pub async fn thread_for_bridge_message(
        &self,
        message_id: i64,
    ) -> Result<Option<ThreadId>, RelaioError> {
        queries::bridge::thread_for_message(&self.db, message_id).await
    }

    // --- Dedup ledger ---

    /// Atomically record an external message; `false` means redelivery.
    pub async fn record_inbound(&self, chat_id: &str, message_id: i64) -> Result<bool, RelaioError> {
        let now = self.now_local();
        queries::dedup::record(&self.db, chat_id, message_id, &now).await
    }

    pub async fn dedup_count(&self, chat_id: &str, message_id: i64) -> Result<i64, RelaioError> {
        queries::dedup::count_records(&self.db, chat_id, message_id).await
    }
}
